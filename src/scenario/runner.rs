use super::Scenario;
use crate::tester::{Options, Tester};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{error, info};

/// A reported problem. Failures never stop a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The route source could not be compiled; the scenario was skipped
    #[error("failed to compile routes: {message}")]
    Compile { message: String },

    #[error("request: {method} {path} shouldn't match but matches route id: {route_id}")]
    UnexpectedMatch {
        method: String,
        path: String,
        route_id: String,
    },

    #[error("expected route id to be '{expected}' but no match, request: {method} {path}")]
    NoMatch {
        expected: String,
        method: String,
        path: String,
    },

    #[error("expected route id to be '{expected}' but got '{actual}', request: {method} {path}")]
    WrongRoute {
        expected: String,
        actual: String,
        method: String,
        path: String,
    },

    #[error(
        "expected coverage to be {threshold}% but got {actual}%, missing hits for route ids: {}",
        .uncovered.join(", ")
    )]
    CoverageBelowThreshold {
        threshold: u32,
        actual: u32,
        uncovered: Vec<String>,
    },
}

impl Failure {
    /// Whether the failure is an expected-versus-actual route mismatch.
    pub fn is_assertion_mismatch(&self) -> bool {
        matches!(
            self,
            Failure::UnexpectedMatch { .. } | Failure::NoMatch { .. } | Failure::WrongRoute { .. }
        )
    }
}

/// Results for one scenario.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    /// Requests tested
    pub requests: usize,
    pub total_routes: usize,
    /// Matches per route id
    pub hits: BTreeMap<String, usize>,
    /// `None` when the routes did not compile
    pub coverage: Option<u32>,
    pub uncovered: Vec<String>,
    pub failures: Vec<Failure>,
}

impl ScenarioReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated results of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub scenarios: Vec<ScenarioReport>,
}

impl Report {
    pub fn push(&mut self, scenario: ScenarioReport) {
        self.scenarios.push(scenario);
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Failure)> {
        self.scenarios
            .iter()
            .flat_map(|s| s.failures.iter().map(move |f| (s.name.as_str(), f)))
    }

    pub fn failure_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.failures.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::is_success)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scenario in &self.scenarios {
            let status = if scenario.is_success() { "ok" } else { "FAILED" };
            write!(f, "{} ... {}", scenario.name, status)?;
            if let Some(coverage) = scenario.coverage {
                write!(
                    f,
                    " ({} requests, coverage {}% of {} routes)",
                    scenario.requests, coverage, scenario.total_routes
                )?;
            }
            writeln!(f)?;
            for failure in &scenario.failures {
                writeln!(f, "  - {}", failure)?;
            }
        }
        let failed = self.scenarios.iter().filter(|s| !s.is_success()).count();
        write!(
            f,
            "{} scenarios, {} failed, {} failures",
            self.scenarios.len(),
            failed,
            self.failure_count()
        )
    }
}

/// Round-half-up percentage of routes hit at least once.
pub fn coverage_percent(hit: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((hit * 200 + total) / (2 * total)) as u32
}

/// Compile the scenario's routes once and run every test case against them.
pub fn run_scenario(scenario: &Scenario) -> ScenarioReport {
    let mut report = ScenarioReport {
        name: scenario.name(),
        ..Default::default()
    };

    let options = Options {
        routes_file: scenario.routes_path(),
        mock_filters: scenario.mock_filters.clone(),
        ignore_trailing_slash: scenario.ignore_trailing_slash,
        verbose: false,
    };

    let tester = match &scenario.routes {
        Some(source) => Tester::from_source(source, &options),
        None => Tester::new(&options),
    };

    let tester = match tester {
        Ok(tester) => tester,
        Err(e) => {
            error!(scenario = %report.name, "Failed to compile routes: {}", e);
            report.failures.push(Failure::Compile {
                message: e.to_string(),
            });
            return report;
        }
    };

    for test in &scenario.tests {
        for attrs in &test.attributes {
            report.requests += 1;
            let result = tester.test(attrs);
            let method = result.request().method.to_string();

            match result.route() {
                None => {
                    if !test.no_match {
                        report.failures.push(Failure::NoMatch {
                            expected: test.route_id.clone(),
                            method,
                            path: attrs.path.clone(),
                        });
                    }
                }
                Some(route) => {
                    *report.hits.entry(route.id.clone()).or_default() += 1;
                    if test.no_match {
                        report.failures.push(Failure::UnexpectedMatch {
                            method,
                            path: attrs.path.clone(),
                            route_id: route.id.clone(),
                        });
                    } else if route.id != test.route_id {
                        report.failures.push(Failure::WrongRoute {
                            expected: test.route_id.clone(),
                            actual: route.id.clone(),
                            method,
                            path: attrs.path.clone(),
                        });
                    }
                }
            }
        }
    }

    let routes = tester.routes();
    let mut seen = HashSet::new();
    report.uncovered = routes
        .iter()
        .map(|r| r.id.as_str())
        .filter(|id| !report.hits.contains_key(*id) && seen.insert(*id))
        .map(str::to_string)
        .collect();
    report.total_routes = routes.len();

    let coverage = coverage_percent(report.hits.len(), report.total_routes);
    report.coverage = Some(coverage);
    info!(scenario = %report.name, requests = report.requests, "Coverage: {}%", coverage);

    if let Some(threshold) = scenario.coverage {
        if coverage < threshold {
            report.failures.push(Failure::CoverageBelowThreshold {
                threshold,
                actual: coverage,
                uncovered: report.uncovered.clone(),
            });
        }
    }

    report
}

/// Run scenarios one after another and aggregate their results.
pub fn run_scenarios(scenarios: &[Scenario]) -> Report {
    let mut report = Report::default();
    for scenario in scenarios {
        report.push(run_scenario(scenario));
    }
    report
}
