use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Filters replaced by no-op stand-ins when compiling routes
    #[serde(default)]
    pub mock_filters: Vec<String>,

    #[serde(default)]
    pub ignore_trailing_slash: bool,

    /// Log every tested request at info level
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
