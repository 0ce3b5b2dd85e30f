use crate::error::{Error, Result};
use crate::eskip;
use crate::report;
use crate::request::{RequestAttributes, SynthesizedRequest};
use crate::route::Route;
use crate::router::{MatchOptions, RouteMatch, Router};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Route definition file
    pub routes_file: PathBuf,
    /// Filters replaced by no-op stand-ins at compile time
    pub mock_filters: Vec<String>,
    pub ignore_trailing_slash: bool,
    /// Log every tested request at info level
    pub verbose: bool,
}

/// Compiles a route source once and tests requests against it.
#[derive(Debug)]
pub struct Tester {
    router: Router,
    options: MatchOptions,
    verbose: bool,
}

impl Tester {
    pub fn new(options: &Options) -> Result<Self> {
        if options.routes_file.as_os_str().is_empty() {
            return Err(Error::SourceNotFound("no routes file given".into()));
        }

        let source = std::fs::read_to_string(&options.routes_file).map_err(|e| {
            Error::SourceNotFound(format!("{}: {}", options.routes_file.display(), e))
        })?;

        debug!(file = %options.routes_file.display(), "Loaded route source");
        Self::from_source(&source, options)
    }

    /// Build a tester from route definitions held in memory.
    /// `options.routes_file` is ignored.
    pub fn from_source(source: &str, options: &Options) -> Result<Self> {
        let routes = eskip::compile(source, &options.mock_filters)?;
        Ok(Self {
            router: Router::new(routes),
            options: MatchOptions {
                ignore_trailing_slash: options.ignore_trailing_slash,
            },
            verbose: options.verbose,
        })
    }

    pub fn test(&self, attrs: &RequestAttributes) -> MatchResult {
        let request = SynthesizedRequest::synthesize(attrs);
        let outcome = self.router.match_request(&request, &self.options);

        let route_id = outcome.as_ref().map(|m| m.route.id.as_str());
        if self.verbose {
            info!(method = %request.method, path = %attrs.path, route = ?route_id, "Tested request");
        } else {
            debug!(method = %request.method, path = %attrs.path, route = ?route_id, "Tested request");
        }

        MatchResult {
            outcome,
            request,
            attributes: attrs.clone(),
            rendered: OnceLock::new(),
        }
    }

    /// Every compiled route in definition order.
    pub fn routes(&self) -> &[Arc<Route>] {
        self.router.routes()
    }
}

/// Outcome of testing one request.
#[derive(Debug)]
pub struct MatchResult {
    outcome: Option<RouteMatch>,
    request: SynthesizedRequest,
    attributes: RequestAttributes,
    rendered: OnceLock<String>,
}

impl MatchResult {
    /// The matched route, or `None` when no route accepts the request.
    pub fn route(&self) -> Option<&Route> {
        self.outcome.as_ref().map(|m| m.route.as_ref())
    }

    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.outcome.as_ref()
    }

    pub fn request(&self) -> &SynthesizedRequest {
        &self.request
    }

    pub fn attributes(&self) -> &RequestAttributes {
        &self.attributes
    }

    pub fn captures(&self) -> &[(String, String)] {
        self.outcome
            .as_ref()
            .map(|m| m.captures.as_slice())
            .unwrap_or_default()
    }

    /// Human readable explanation, rendered on first use.
    pub fn pretty_print(&self) -> &str {
        self.rendered.get_or_init(|| report::render(self))
    }
}
