use std::fmt;

/// Rank of a request path segment consumed by a literal template segment.
pub const RANK_LITERAL: u8 = 3;
/// Rank of a request path segment consumed by a `:name` parameter.
pub const RANK_PARAM: u8 = 2;
/// Rank of a request path segment consumed by a trailing wildcard.
pub const RANK_WILDCARD: u8 = 1;
/// Rank of a request path segment when the route has no path predicate.
pub const RANK_UNCONSTRAINED: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    /// Trailing wildcard, optionally named (`*rest`). Anonymous for `*`, `**`
    /// and the implicit tail of a subtree.
    Wildcard(Option<String>),
}

/// A compiled `Path` or `PathSubtree` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
    subtree: bool,
}

/// Outcome of matching a template against a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// One rank per request path segment
    pub ranks: Vec<u8>,
    pub wildcard: bool,
    pub captures: Vec<(String, String)>,
}

impl PathTemplate {
    /// Parse a `Path` template.
    pub fn parse(source: &str) -> Result<Self, String> {
        let rest = source
            .strip_prefix('/')
            .ok_or_else(|| format!("path template must start with '/': {:?}", source))?;

        let (body, trailing_slash) = match rest.strip_suffix('/') {
            Some(body) => (body, true),
            None => (rest, false),
        };

        let parts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('/').collect()
        };

        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let last = i + 1 == parts.len();
            let segment = if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(format!("empty parameter name in {:?}", source));
                }
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if !last {
                    return Err(format!(
                        "wildcard can only appear as the last segment in {:?}",
                        source
                    ));
                }
                let name = name.trim_start_matches('*');
                Segment::Wildcard((!name.is_empty()).then(|| name.to_string()))
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        let wildcard = matches!(segments.last(), Some(Segment::Wildcard(_)));

        Ok(Self {
            source: source.to_string(),
            segments,
            trailing_slash: trailing_slash && !wildcard,
            subtree: false,
        })
    }

    /// Parse a `PathSubtree` prefix. The prefix matches itself and everything
    /// below it; a trailing slash on the prefix is not significant.
    pub fn subtree(source: &str) -> Result<Self, String> {
        let mut template = Self::parse(source)?;
        template.source = source.to_string();
        template.trailing_slash = false;
        template.subtree = true;
        if !template.has_wildcard() {
            template.segments.push(Segment::Wildcard(None));
        }
        Ok(template)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_subtree(&self) -> bool {
        self.subtree
    }

    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// First segment if it is a literal; used to bucket routes in the index.
    pub fn first_literal(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Literal(s)) => Some(s),
            _ => None,
        }
    }

    /// Match against a request path already split by [`split_path`].
    ///
    /// With `ignore_trailing_slash` a single trailing slash difference between
    /// the template and the request is tolerated.
    pub fn matches(
        &self,
        segments: &[String],
        trailing_slash: bool,
        ignore_trailing_slash: bool,
    ) -> Option<PathMatch> {
        let mut ranks = Vec::with_capacity(segments.len());
        let mut captures = Vec::new();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(expected) => {
                    if segments.get(i) != Some(expected) {
                        return None;
                    }
                    ranks.push(RANK_LITERAL);
                    i += 1;
                }
                Segment::Param(name) => {
                    let value = segments.get(i).filter(|v| !v.is_empty())?;
                    captures.push((name.clone(), value.clone()));
                    ranks.push(RANK_PARAM);
                    i += 1;
                }
                Segment::Wildcard(name) => {
                    let rest = &segments[i..];
                    ranks.extend(std::iter::repeat_n(RANK_WILDCARD, rest.len()));
                    if let Some(name) = name {
                        captures.push((name.clone(), rest.join("/")));
                    }
                    return Some(PathMatch {
                        ranks,
                        wildcard: true,
                        captures,
                    });
                }
            }
        }

        if i != segments.len() {
            return None;
        }

        if !ignore_trailing_slash && self.trailing_slash != trailing_slash {
            return None;
        }

        Some(PathMatch {
            ranks,
            wildcard: false,
            captures,
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split an absolute request path into segments and a trailing-slash flag.
///
/// `/` yields no segments; `/foo/` yields `["foo"]` with the flag set.
pub fn split_path(path: &str) -> (Vec<String>, bool) {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let (body, trailing) = match rest.strip_suffix('/') {
        Some(body) => (body, true),
        None => (rest, false),
    };
    if body.is_empty() {
        return (Vec::new(), trailing);
    }
    (body.split('/').map(str::to_string).collect(), trailing)
}
