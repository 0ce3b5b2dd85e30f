use crate::eskip::ParseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the library.
///
/// A request that matches no route is not an error; see
/// [`MatchResult::route`](crate::MatchResult::route).
#[derive(Debug, Error)]
pub enum Error {
    /// No route source was supplied, or it could not be read, or it is empty
    #[error("Route source not found: {0}")]
    SourceNotFound(String),

    /// Malformed route definitions
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Malformed scenario document
    #[error("Invalid scenario {path}: {message}")]
    ScenarioFormat { path: String, message: String },
}

impl Error {
    pub(crate) fn scenario(path: impl Into<String>, message: impl ToString) -> Self {
        Error::ScenarioFormat {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
