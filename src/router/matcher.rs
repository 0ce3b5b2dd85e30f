use crate::request::SynthesizedRequest;
use crate::route::{PathMatch, Predicate, Route, ValueMatch, RANK_UNCONSTRAINED};

/// Evaluates a route's predicates against a request.
pub struct RouteMatcher<'r> {
    route: &'r Route,
}

impl<'r> RouteMatcher<'r> {
    pub fn new(route: &'r Route) -> Self {
        Self { route }
    }

    /// Match every path predicate. A route without one is unconstrained on
    /// the path and ranks each segment as such.
    pub fn match_path(
        &self,
        request: &SynthesizedRequest,
        ignore_trailing_slash: bool,
    ) -> Option<PathMatch> {
        let segments = request.segments();
        let trailing = request.has_trailing_slash();
        let mut best: Option<PathMatch> = None;

        for template in self.route.paths() {
            let m = template.matches(segments, trailing, ignore_trailing_slash)?;
            best = Some(match best {
                None => m,
                Some(mut current) => {
                    current.captures.extend(m.captures);
                    if (&m.ranks, !m.wildcard) > (&current.ranks, !current.wildcard) {
                        current.ranks = m.ranks;
                        current.wildcard = m.wildcard;
                    }
                    current
                }
            });
        }

        Some(best.unwrap_or_else(|| PathMatch {
            ranks: vec![RANK_UNCONSTRAINED; segments.len()],
            wildcard: true,
            captures: Vec::new(),
        }))
    }

    /// Check method, header, query and host predicates. Returns the first
    /// predicate that rejects the request.
    pub fn first_rejection(&self, request: &SynthesizedRequest) -> Option<&'r Predicate> {
        self.route
            .predicates
            .iter()
            .find(|p| !p.is_path() && !p.matches(request))
    }
}

impl Predicate {
    /// Evaluate a non-path predicate. Path predicates are evaluated by
    /// [`RouteMatcher::match_path`] and always pass here.
    pub fn matches(&self, request: &SynthesizedRequest) -> bool {
        match self {
            Predicate::Method(m) => request.method == *m,
            Predicate::Methods(methods) => methods.contains(&request.method),
            Predicate::Path(_) => true,
            Predicate::Header { key, value, .. } => match value {
                None => request.headers.contains_key(key),
                Some(expected) => request
                    .headers
                    .get_all(key)
                    .iter()
                    .any(|v| v.as_bytes() == expected.as_bytes()),
            },
            Predicate::HeaderRegexp { key, pattern, .. } => request
                .headers
                .get_all(key)
                .iter()
                .any(|v| pattern.is_match(&String::from_utf8_lossy(v.as_bytes()))),
            Predicate::QueryParam { name, value } => {
                let mut values = request.query_values(name);
                match value {
                    None => values.next().is_some(),
                    Some(expected) => values.any(|v| expected.matches(v)),
                }
            }
            Predicate::Host(expected) => request
                .host
                .as_deref()
                .map(|h| match expected {
                    ValueMatch::Exact(e) => {
                        h.eq_ignore_ascii_case(e) || strip_port(h).eq_ignore_ascii_case(e)
                    }
                    regexp => regexp.matches(h),
                })
                .unwrap_or(false),
        }
    }
}

/// `example.org:8080` -> `example.org`, `[::1]:80` -> `[::1]`.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eskip::compile;
    use crate::request::RequestAttributes;

    fn route(source: &str) -> Route {
        compile(source, &[]).unwrap().remove(0)
    }

    fn request(attrs: RequestAttributes) -> SynthesizedRequest {
        SynthesizedRequest::synthesize(&attrs)
    }

    fn accepts(route: &Route, attrs: RequestAttributes) -> bool {
        let req = request(attrs);
        let matcher = RouteMatcher::new(route);
        matcher.match_path(&req, false).is_some() && matcher.first_rejection(&req).is_none()
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let r = route(r#"r: Method("get") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").method("GET")));
        assert!(accepts(&r, RequestAttributes::new("/").method("get")));
        assert!(!accepts(&r, RequestAttributes::new("/").method("POST")));
    }

    #[test]
    fn test_no_method_predicate_matches_any_method() {
        let r = route(r#"r: Path("/x") -> <shunt>"#);
        for method in ["GET", "POST", "DELETE", "PURGE"] {
            assert!(accepts(&r, RequestAttributes::new("/x").method(method)));
        }
    }

    #[test]
    fn test_methods_any_of() {
        let r = route(r#"r: Methods("GET", "HEAD") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").method("HEAD")));
        assert!(!accepts(&r, RequestAttributes::new("/").method("PUT")));
    }

    #[test]
    fn test_header_exact_and_presence() {
        let r = route(r#"r: Header("Accept", "application/json") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("accept", "application/json")));
        assert!(!accepts(&r, RequestAttributes::new("/").header("Accept", "text/html")));
        assert!(!accepts(&r, RequestAttributes::new("/")));

        let r = route(r#"r: Header("X-Debug") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("x-debug", "")));
        assert!(!accepts(&r, RequestAttributes::new("/")));
    }

    #[test]
    fn test_header_regexp() {
        let r = route(r#"r: HeaderRegexp("User-Agent", "^curl/") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("User-Agent", "curl/8.0")));
        assert!(!accepts(&r, RequestAttributes::new("/").header("User-Agent", "wget")));
        assert!(!accepts(&r, RequestAttributes::new("/")));
    }

    #[test]
    fn test_query_param() {
        let r = route(r#"r: QueryParam("q") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/abdc?q=bar")));
        assert!(accepts(&r, RequestAttributes::new("/abdc?q")));
        assert!(!accepts(&r, RequestAttributes::new("/abdc?x=bar")));

        let r = route(r#"r: QueryParam("tag", "b") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/?tag=a&tag=b")));
        assert!(!accepts(&r, RequestAttributes::new("/?tag=a")));

        let r = route(r#"r: QueryParam("page", /^[0-9]+$/) -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/?page=12")));
        assert!(!accepts(&r, RequestAttributes::new("/?page=last")));
    }

    #[test]
    fn test_host_exact_and_regexp() {
        let r = route(r#"r: Host("example.org") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("Host", "EXAMPLE.org")));
        assert!(!accepts(&r, RequestAttributes::new("/").header("Host", "other.org")));
        assert!(!accepts(&r, RequestAttributes::new("/")));

        let r = route(r#"r: Host(/^api\./) -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("Host", "api.example.org")));
        assert!(!accepts(&r, RequestAttributes::new("/").header("Host", "www.example.org")));
    }

    #[test]
    fn test_host_exact_ignores_port() {
        let r = route(r#"r: Host("example.org") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("Host", "example.org:8080")));
        assert!(!accepts(&r, RequestAttributes::new("/").header("Host", "example.org:http")));

        let r = route(r#"r: Host("[::1]") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("Host", "[::1]:8080")));

        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("example.org"), "example.org");
    }

    #[test]
    fn test_non_ascii_header_values() {
        let r = route(r#"r: Header("X-Name", "José") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("X-Name", "José")));
        assert!(!accepts(&r, RequestAttributes::new("/").header("X-Name", "Jose")));

        let r = route(r#"r: HeaderRegexp("X-Name", "^Jos.$") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/").header("X-Name", "José")));
    }

    #[test]
    fn test_first_rejection_names_predicate() {
        let r = route(r#"r: Method("GET") && Header("Accept", "application/json") -> <shunt>"#);
        let req = request(RequestAttributes::new("/"));
        let rejected = RouteMatcher::new(&r).first_rejection(&req).unwrap();
        assert_eq!(rejected.to_string(), r#"Header("Accept", "application/json")"#);
    }

    #[test]
    fn test_unconstrained_path_ranks() {
        let r = route(r#"r: * -> <shunt>"#);
        let req = request(RequestAttributes::new("/a/b"));
        let m = RouteMatcher::new(&r).match_path(&req, false).unwrap();
        assert_eq!(m.ranks, vec![RANK_UNCONSTRAINED; 2]);
        assert!(m.wildcard);
    }

    #[test]
    fn test_all_path_predicates_must_match() {
        let r = route(r#"r: PathSubtree("/api") && Path("/api/:id") -> <shunt>"#);
        assert!(accepts(&r, RequestAttributes::new("/api/1")));
        assert!(!accepts(&r, RequestAttributes::new("/api/1/2")));
    }
}
