use crate::route::split_path;
use hyper::header::{HeaderName, HeaderValue, HOST};
use hyper::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Minimal description of a request to test against the routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAttributes {
    /// Defaults to `GET` when empty
    #[serde(default)]
    pub method: String,

    /// Path with an optional `?query`
    pub path: String,

    /// Header names keep the casing they were given with
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Canonical request built from [`RequestAttributes`].
#[derive(Debug, Clone)]
pub struct SynthesizedRequest {
    pub method: Method,
    pub path: String,
    pub raw_query: Option<String>,
    /// Decoded query pairs in order; a name may repeat
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub host: Option<String>,
    segments: Vec<String>,
    trailing_slash: bool,
}

impl SynthesizedRequest {
    /// Build the canonical request. Never fails: input that cannot be
    /// represented is dropped with a warning, and an unusable path becomes `/`.
    pub fn synthesize(attrs: &RequestAttributes) -> Self {
        let method = normalize_method(&attrs.method);
        let (path, raw_query) = split_target(&attrs.path);

        let query = raw_query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        let mut headers = HeaderMap::with_capacity(attrs.headers.len());
        for (name, value) in &attrs.headers {
            let parsed = HeaderName::from_bytes(name.as_bytes())
                .ok()
                .zip(HeaderValue::from_bytes(value.as_bytes()).ok());
            match parsed {
                Some((name, value)) => {
                    headers.append(name, value);
                }
                None => warn!(header = %name, "Dropping header that is not valid HTTP"),
            }
        }

        let host = headers
            .get(HOST)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
            .map(str::to_string);

        let (segments, trailing_slash) = split_path(&path);

        Self {
            method,
            path,
            raw_query,
            query,
            headers,
            host,
            segments,
            trailing_slash,
        }
    }

    /// Case-insensitive header lookup. Values are UTF-8 as given.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
    }

    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }
}

fn normalize_method(raw: &str) -> Method {
    let raw = raw.trim();
    if raw.is_empty() {
        return Method::GET;
    }
    match Method::from_bytes(raw.to_ascii_uppercase().as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            warn!(method = %raw, "Invalid method, using GET");
            Method::GET
        }
    }
}

/// Split a request target into an absolute path and the raw query.
fn split_target(target: &str) -> (String, Option<String>) {
    let target = target.trim();
    let target = if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{}", target)
    };

    if target.parse::<Uri>().is_err() {
        warn!(path = %target, "Unusable request path, using /");
        return ("/".to_string(), None);
    }

    match target.split_once('?') {
        Some((path, query)) => {
            let path = if path.is_empty() { "/" } else { path };
            (path.to_string(), Some(query.to_string()))
        }
        None => (target, None),
    }
}
