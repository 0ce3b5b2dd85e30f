mod types;

pub use types::*;

use crate::tester::Options;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yml::from_str(&content)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for name in &self.mock_filters {
            if name.trim().is_empty() {
                anyhow::bail!("Mock filter names must not be empty");
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                anyhow::bail!("Invalid mock filter name '{}'", name);
            }
        }

        Ok(())
    }

    /// Tester options for a routes file, with `extra_mocks` added to the
    /// configured ones.
    pub fn tester_options(&self, routes_file: PathBuf, extra_mocks: &[String]) -> Options {
        let mut mock_filters = self.mock_filters.clone();
        for name in extra_mocks {
            if !mock_filters.contains(name) {
                mock_filters.push(name.clone());
            }
        }

        Options {
            routes_file,
            mock_filters,
            ignore_trailing_slash: self.ignore_trailing_slash,
            verbose: self.verbose,
        }
    }
}
