//! Offline route-matching tester.
//!
//! Route definitions are compiled once with [`Tester`], then synthetic
//! requests built from [`RequestAttributes`] are matched against them.
//! Scenario files batch many requests and report route coverage.

pub mod config;
pub mod error;
pub mod eskip;
pub mod report;
pub mod request;
pub mod route;
pub mod router;
pub mod scenario;
pub mod tester;

pub use config::Config;
pub use error::{Error, Result};
pub use request::{RequestAttributes, SynthesizedRequest};
pub use route::Route;
pub use router::{MatchOptions, RouteMatch, Router};
pub use scenario::{Report, Scenario};
pub use tester::{MatchResult, Options, Tester};
