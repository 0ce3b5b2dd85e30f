mod matcher;
mod specificity;

pub use matcher::RouteMatcher;
pub use specificity::Specificity;

use crate::request::SynthesizedRequest;
use crate::route::Route;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Treat `/foo` and `/foo/` as the same path
    pub ignore_trailing_slash: bool,
}

/// The route selected for a request.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Path parameters and named wildcards
    pub captures: Vec<(String, String)>,
    pub specificity: Specificity,
    /// Later routes that matched exactly as specifically and lost on
    /// definition order
    pub shadowed: Vec<Arc<Route>>,
}

/// Immutable index over compiled routes.
///
/// Routes whose path starts with a literal segment are bucketed by that
/// segment; the rest are candidates for every request.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Arc<Route>>,
    by_segment: HashMap<String, Vec<usize>>,
    dynamic: Vec<usize>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        let mut by_segment: HashMap<String, Vec<usize>> = HashMap::new();
        let mut dynamic = Vec::new();

        for (i, route) in routes.iter().enumerate() {
            match route.paths().next().and_then(|t| t.first_literal()) {
                Some(segment) => by_segment.entry(segment.to_string()).or_default().push(i),
                None => dynamic.push(i),
            }
        }

        debug!(
            routes = routes.len(),
            buckets = by_segment.len(),
            dynamic = dynamic.len(),
            "Built route index"
        );

        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
            by_segment,
            dynamic,
        }
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Candidate route positions for a request, in definition order.
    fn candidates(&self, request: &SynthesizedRequest) -> Vec<usize> {
        let bucket = request
            .segments()
            .first()
            .and_then(|s| self.by_segment.get(s))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut candidates = Vec::with_capacity(bucket.len() + self.dynamic.len());
        let (mut a, mut b) = (bucket.iter().peekable(), self.dynamic.iter().peekable());
        loop {
            let next = match (a.peek(), b.peek()) {
                (Some(&&x), Some(&&y)) if x < y => a.next(),
                (Some(_), Some(_)) => b.next(),
                (Some(_), None) => a.next(),
                (None, Some(_)) => b.next(),
                (None, None) => break,
            };
            candidates.extend(next.copied());
        }
        candidates
    }

    /// Find the most specific route that accepts the request.
    ///
    /// Returns `None` when no route matches. The result only depends on the
    /// index and the request.
    pub fn match_request(
        &self,
        request: &SynthesizedRequest,
        options: &MatchOptions,
    ) -> Option<RouteMatch> {
        let mut best: Option<RouteMatch> = None;

        for i in self.candidates(request) {
            let route = &self.routes[i];
            let matcher = RouteMatcher::new(route);

            let Some(path) = matcher.match_path(request, options.ignore_trailing_slash) else {
                debug!(route = %route.id, "Path does not match");
                continue;
            };

            if let Some(predicate) = matcher.first_rejection(request) {
                debug!(route = %route.id, predicate = %predicate, "Predicate rejected request");
                continue;
            }

            let specificity = Specificity::new(&path, route.constraint_count());
            debug!(route = %route.id, ?specificity, "Candidate matched");

            match &mut best {
                Some(current) if specificity < current.specificity => {}
                Some(current) if specificity == current.specificity => {
                    current.shadowed.push(Arc::clone(route));
                }
                _ => {
                    best = Some(RouteMatch {
                        route: Arc::clone(route),
                        captures: path.captures,
                        specificity,
                        shadowed: Vec::new(),
                    });
                }
            }
        }

        if let Some(m) = &best {
            if !m.shadowed.is_empty() {
                warn!(
                    route = %m.route.id,
                    shadowed = ?m.shadowed.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
                    "Routes tie on specificity, first definition wins"
                );
            }
        }

        best
    }
}
