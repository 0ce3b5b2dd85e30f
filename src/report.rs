//! Human readable explanation of a [`MatchResult`].

use crate::tester::MatchResult;
use std::borrow::Cow;
use std::fmt;

/// Word that marks a rendered match. Never emitted for a missed request.
const MATCH_MARKER: &str = "matching";

/// Render the outcome of a test. Deterministic for a given result.
///
/// Matched results contain the word `matching`; results without a match
/// never do, even when the request itself mentions it.
pub fn render(result: &MatchResult) -> String {
    Explanation(result).to_string()
}

/// Display adapter over a [`MatchResult`].
pub struct Explanation<'a>(pub &'a MatchResult);

impl fmt::Display for Explanation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let request = result.request();
        let matched = result.route_match().is_some();

        write!(
            f,
            "request: {} {}",
            echo(request.method.as_str(), matched),
            echo(&request.path, matched)
        )?;
        if let Some(query) = &request.raw_query {
            write!(f, "?{}", echo(query, matched))?;
        }
        writeln!(f)?;

        let headers = &result.attributes().headers;
        if !headers.is_empty() {
            writeln!(f, "headers:")?;
            for (name, value) in headers {
                writeln!(f, "  {}: {}", echo(name, matched), echo(value, matched))?;
            }
        }

        let Some(m) = result.route_match() else {
            return writeln!(f, "no route matched the request");
        };

        let route = &m.route;
        writeln!(f, "{} route: {}", MATCH_MARKER, route.id)?;
        writeln!(f, "  {}", route)?;

        if route.predicates.is_empty() {
            writeln!(f, "satisfied predicates: none (catch-all)")?;
        } else {
            writeln!(f, "satisfied predicates:")?;
            for predicate in &route.predicates {
                writeln!(f, "  {}", predicate)?;
            }
        }

        if !m.captures.is_empty() {
            writeln!(f, "path parameters:")?;
            for (name, value) in &m.captures {
                writeln!(f, "  {}: {}", name, value)?;
            }
        }

        if !m.shadowed.is_empty() {
            writeln!(f, "shadowed by definition order:")?;
            for shadowed in &m.shadowed {
                writeln!(f, "  {}", shadowed.id)?;
            }
        }

        Ok(())
    }
}

/// Request text as given, escaped when the request matched nothing.
fn echo(text: &str, matched: bool) -> Cow<'_, str> {
    if matched {
        Cow::Borrowed(text)
    } else {
        escape_marker(text)
    }
}

/// Percent-encode the first letter of every case-insensitive occurrence of
/// the match marker, so `/pattern-matching` reads `/pattern-%6Datching`.
fn escape_marker(text: &str) -> Cow<'_, str> {
    let lower = text.to_ascii_lowercase();
    if !lower.contains(MATCH_MARKER) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 4);
    let mut last = 0;
    for (i, _) in lower.match_indices(MATCH_MARKER) {
        out.push_str(&text[last..i]);
        out.push_str(&format!("%{:02X}", text.as_bytes()[i]));
        last = i + 1;
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use crate::request::RequestAttributes;
    use crate::tester::{Options, Tester};

    const ROUTES: &str = r#"
        users: Method("GET") && Path("/users/:id") -> setResponseHeader("X-Users", "1") -> <shunt>;
        users_copy: Method("GET") && Path("/users/:id") -> <shunt>;
        all: * -> <shunt>;
    "#;

    fn tester(source: &str) -> Tester {
        Tester::from_source(source, &Options::default()).unwrap()
    }

    #[test]
    fn test_render_match() {
        let t = tester(ROUTES);
        let result = t.test(&RequestAttributes::new("/users/7?full=1").header("Accept", "text/plain"));
        let text = result.pretty_print();

        assert!(text.contains("request: GET /users/7?full=1"));
        assert!(text.contains("  Accept: text/plain"));
        assert!(text.contains("matching route: users"));
        assert!(text.contains(r#"  Method("GET")"#));
        assert!(text.contains(r#"  Path("/users/:id")"#));
        assert!(text.contains("  id: 7"));
        assert!(text.contains("shadowed by definition order:\n  users_copy"));
        assert!(text.contains(r#"setResponseHeader("X-Users", "1")"#));
    }

    #[test]
    fn test_render_catch_all() {
        let t = tester(ROUTES);
        let text = t.test(&RequestAttributes::new("/other").method("DELETE")).pretty_print().to_string();
        assert!(text.contains("matching route: all"));
        assert!(text.contains("none (catch-all)"));
    }

    #[test]
    fn test_render_no_match() {
        let t = tester(r#"bar: Path("/bar") -> <shunt>"#);
        let result = t.test(&RequestAttributes::new("/blobblob").method("post"));
        let text = result.pretty_print();
        assert_eq!(text, "request: POST /blobblob\nno route matched the request\n");
        assert!(!text.contains("matching"));
    }

    #[test]
    fn test_render_no_match_escapes_echoed_input() {
        let t = tester(r#"bar: Path("/bar") -> <shunt>"#);
        let attrs = RequestAttributes::new("/pattern-matching?q=MATCHING")
            .header("X-Matching", "pattern matching");
        let result = t.test(&attrs);
        assert!(result.route().is_none());

        let text = result.pretty_print();
        assert!(!text.to_ascii_lowercase().contains("matching"), "{}", text);
        assert!(text.contains("request: GET /pattern-%6Datching?q=%4DATCHING"));
        assert!(text.contains("  X-%4Datching: pattern %6Datching"));
    }

    #[test]
    fn test_render_match_echoes_input_verbatim() {
        let t = tester(r#"m: PathSubtree("/pattern-matching") -> <shunt>"#);
        let text = t.test(&RequestAttributes::new("/pattern-matching/x")).pretty_print().to_string();
        assert!(text.contains("request: GET /pattern-matching/x"));
        assert!(text.contains("matching route: m"));
    }

    #[test]
    fn test_escape_marker() {
        assert_eq!(super::escape_marker("/plain"), "/plain");
        assert_eq!(super::escape_marker("matchingmatching"), "%6Datching%6Datching");
        assert_eq!(super::escape_marker("/é-Matching"), "/é-%4Datching");
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = tester(ROUTES);
        let attrs = RequestAttributes::new("/users/1")
            .header("B", "2")
            .header("A", "1");
        let a = super::render(&t.test(&attrs));
        let b = super::render(&t.test(&attrs));
        assert_eq!(a, b);
        assert!(a.find("  A: 1").unwrap() < a.find("  B: 2").unwrap());
    }
}
