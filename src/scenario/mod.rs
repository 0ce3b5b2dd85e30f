mod runner;

pub use runner::{coverage_percent, run_scenario, run_scenarios, Failure, Report, ScenarioReport};

use crate::error::{Error, Result};
use crate::request::RequestAttributes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A batch of test cases against one route source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Route file, relative to the scenario file
    #[serde(default)]
    pub file: String,

    /// Inline route definitions, used instead of `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<String>,

    #[serde(default)]
    pub mock_filters: Vec<String>,

    /// Minimum coverage percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<u32>,

    #[serde(default)]
    pub ignore_trailing_slash: bool,

    #[serde(default)]
    pub tests: Vec<ScenarioTest>,

    /// Where the scenario came from; `file` resolves against its directory
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioTest {
    #[serde(default)]
    pub route_id: String,

    #[serde(default)]
    pub no_match: bool,

    #[serde(default)]
    pub attributes: Vec<RequestAttributes>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::scenario(path.display().to_string(), e))?;

        let mut scenario = Self::from_yaml(&content, &path.display().to_string())?;
        scenario.origin = Some(path.to_path_buf());
        Ok(scenario)
    }

    /// Parse a scenario document. `name` is only used in error messages.
    pub fn from_yaml(content: &str, name: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_yml::from_str(content).map_err(|e| Error::scenario(name, e))?;
        scenario.validate(name)?;
        Ok(scenario)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.file.trim().is_empty() && self.routes.is_none() {
            return Err(Error::scenario(name, "you should define a file property"));
        }
        if let Some(coverage) = self.coverage {
            if coverage > 100 {
                return Err(Error::scenario(
                    name,
                    format!("coverage must be between 0 and 100, got {}", coverage),
                ));
            }
        }
        for (i, test) in self.tests.iter().enumerate() {
            if !test.no_match && test.route_id.is_empty() {
                return Err(Error::scenario(
                    name,
                    format!("test {} needs a route_id or no_match: true", i + 1),
                ));
            }
        }
        Ok(())
    }

    /// Route file path resolved against the scenario's directory.
    pub fn routes_path(&self) -> PathBuf {
        let file = Path::new(&self.file);
        match self.origin.as_deref().and_then(Path::parent) {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }

    /// Human readable name used in reports.
    pub fn name(&self) -> String {
        match &self.origin {
            Some(origin) => origin.display().to_string(),
            None if !self.file.is_empty() => self.file.clone(),
            None => "<inline>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
file: routes.eskip
mock_filters: [customfilter]
coverage: 80
tests:
  - route_id: foo
    attributes:
      - method: POST
        path: /foo/1
  - no_match: true
    attributes:
      - path: /blobblob
"#;
        let scenario = Scenario::from_yaml(yaml, "test.yaml").unwrap();
        assert_eq!(scenario.file, "routes.eskip");
        assert_eq!(scenario.mock_filters, vec!["customfilter"]);
        assert_eq!(scenario.coverage, Some(80));
        assert_eq!(scenario.tests.len(), 2);
        assert_eq!(scenario.tests[0].attributes[0].method, "POST");
        assert!(scenario.tests[1].no_match);
    }

    #[test]
    fn test_missing_file_is_format_error() {
        let err = Scenario::from_yaml("tests: []\n", "x.yaml").unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { .. }));
        assert!(err.to_string().contains("file property"));
    }

    #[test]
    fn test_malformed_yaml_is_format_error() {
        let err = Scenario::from_yaml("file: [unclosed\n", "x.yaml").unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { .. }));
    }

    #[test]
    fn test_coverage_out_of_range() {
        let err = Scenario::from_yaml("file: r.eskip\ncoverage: 150\n", "x.yaml").unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { .. }));
    }

    #[test]
    fn test_routes_path_relative_to_scenario() {
        let mut scenario = Scenario::from_yaml("file: routes.eskip\n", "x.yaml").unwrap();
        scenario.origin = Some(PathBuf::from("/tmp/cases/scenario.yaml"));
        assert_eq!(scenario.routes_path(), PathBuf::from("/tmp/cases/routes.eskip"));

        scenario.file = "/etc/routes.eskip".into();
        assert_eq!(scenario.routes_path(), PathBuf::from("/etc/routes.eskip"));
    }

    #[test]
    fn test_load_missing_scenario_file() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.yaml")).unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { .. }));
    }
}
