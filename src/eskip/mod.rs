//! Route definition language.
//!
//! Routes are written as `id: predicates -> filters -> backend;`, for example:
//!
//! ```text
//! foo_get: Method("GET") && Path("/foo") -> setRequestHeader("X-Foo", "1") -> "https://foo.example.org";
//! catch_all: * -> <shunt>;
//! ```

mod filters;
mod lexer;
mod parser;

pub use filters::{substitute_mock, FilterRegistry, FilterSpec};
pub use parser::{ParseError, ParseErrorKind, Position, RouteParser};

use crate::error::{Error, Result};
use crate::route::Route;
use std::collections::HashSet;
use tracing::debug;

/// Compile a route source with the built-in filter registry.
///
/// Filters named in `mock_filters` are replaced by no-op markers so that
/// sources referencing unavailable filters still compile.
pub fn compile(source: &str, mock_filters: &[String]) -> Result<Vec<Route>> {
    compile_with(source, mock_filters, &FilterRegistry::default())
}

pub fn compile_with(
    source: &str,
    mock_filters: &[String],
    registry: &FilterRegistry,
) -> Result<Vec<Route>> {
    if source.trim().is_empty() {
        return Err(Error::SourceNotFound("route source is empty".into()));
    }

    let mocks: HashSet<String> = mock_filters.iter().cloned().collect();
    let routes = RouteParser::new(source, &mocks, registry)?.parse()?;

    if routes.is_empty() {
        return Err(Error::SourceNotFound(
            "route source does not define any routes".into(),
        ));
    }

    debug!(
        routes = routes.len(),
        mocked = mocks.len(),
        "Compiled route source"
    );

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        assert!(matches!(compile("", &[]), Err(Error::SourceNotFound(_))));
        assert!(matches!(compile("  \n\t", &[]), Err(Error::SourceNotFound(_))));
        assert!(matches!(
            compile("// only a comment\n", &[]),
            Err(Error::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        let err = compile("foo: Path(", &[]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_mock_filter_compiles() {
        let source = r#"customfilter: Method("GET") && Path("/customfilter") -> customfilter() -> <shunt>"#;
        assert!(compile(source, &[]).is_err());
        let routes = compile(source, &["customfilter".to_string()]).unwrap();
        assert_eq!(routes[0].id, "customfilter");
        assert!(routes[0].filters[0].mocked);
    }
}
