mod path;

pub use path::{
    split_path, PathMatch, PathTemplate, Segment, RANK_LITERAL, RANK_PARAM, RANK_UNCONSTRAINED,
    RANK_WILDCARD,
};

use hyper::header::HeaderName;
use hyper::Method;
use regex::Regex;
use std::fmt;

/// An argument of a predicate or filter call, kept as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Regexp(String),
    Number(f64),
}

/// Exact or regexp value constraint used by `Host` and `QueryParam`.
#[derive(Debug, Clone)]
pub enum ValueMatch {
    Exact(String),
    Regexp(Regex),
}

impl ValueMatch {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueMatch::Exact(expected) => value == expected,
            ValueMatch::Regexp(re) => re.is_match(value),
        }
    }
}

/// A single matching constraint. One variant per predicate kind.
#[derive(Debug, Clone)]
pub enum Predicate {
    Method(Method),
    Methods(Vec<Method>),
    Path(PathTemplate),
    Header {
        name: String,
        key: HeaderName,
        value: Option<String>,
    },
    HeaderRegexp {
        name: String,
        key: HeaderName,
        pattern: Regex,
    },
    QueryParam {
        name: String,
        value: Option<ValueMatch>,
    },
    Host(ValueMatch),
}

impl Predicate {
    pub fn is_path(&self) -> bool {
        matches!(self, Predicate::Path(_))
    }
}

/// A filter step. Opaque to matching; `mocked` marks a no-op stand-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub args: Vec<Arg>,
    pub mocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Network(String),
    Shunt,
    Loopback,
    Dynamic,
}

/// A compiled route. Immutable once built.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub predicates: Vec<Predicate>,
    pub filters: Vec<Filter>,
    pub backend: Backend,
    /// Position in the source, zero based
    pub index: usize,
}

impl Route {
    pub fn paths(&self) -> impl Iterator<Item = &PathTemplate> {
        self.predicates.iter().filter_map(|p| match p {
            Predicate::Path(t) => Some(t),
            _ => None,
        })
    }

    /// Count of method, header, query and host predicates.
    pub fn constraint_count(&self) -> usize {
        self.predicates.iter().filter(|p| !p.is_path()).count()
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

fn write_regexp(f: &mut fmt::Formatter<'_>, pattern: &str) -> fmt::Result {
    write!(f, "/{}/", pattern.replace('/', "\\/"))
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => write_quoted(f, s),
            Arg::Regexp(re) => write_regexp(f, re),
            Arg::Number(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for ValueMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMatch::Exact(s) => write_quoted(f, s),
            ValueMatch::Regexp(re) => write_regexp(f, re.as_str()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Method(m) => {
                f.write_str("Method(")?;
                write_quoted(f, m.as_str())?;
                f.write_str(")")
            }
            Predicate::Methods(methods) => {
                f.write_str("Methods(")?;
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, m.as_str())?;
                }
                f.write_str(")")
            }
            Predicate::Path(t) => {
                f.write_str(if t.is_subtree() { "PathSubtree(" } else { "Path(" })?;
                write_quoted(f, t.source())?;
                f.write_str(")")
            }
            Predicate::Header { name, value, .. } => {
                f.write_str("Header(")?;
                write_quoted(f, name)?;
                if let Some(value) = value {
                    f.write_str(", ")?;
                    write_quoted(f, value)?;
                }
                f.write_str(")")
            }
            Predicate::HeaderRegexp { name, pattern, .. } => {
                f.write_str("HeaderRegexp(")?;
                write_quoted(f, name)?;
                f.write_str(", ")?;
                write_regexp(f, pattern.as_str())?;
                f.write_str(")")
            }
            Predicate::QueryParam { name, value } => {
                f.write_str("QueryParam(")?;
                write_quoted(f, name)?;
                if let Some(value) = value {
                    write!(f, ", {}", value)?;
                }
                f.write_str(")")
            }
            Predicate::Host(value) => write!(f, "Host({})", value),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Network(url) => write_quoted(f, url),
            Backend::Shunt => f.write_str("<shunt>"),
            Backend::Loopback => f.write_str("<loopback>"),
            Backend::Dynamic => f.write_str("<dynamic>"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.id)?;
        if self.predicates.is_empty() {
            f.write_str("*")?;
        }
        for (i, p) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            write!(f, "{}", p)?;
        }
        for filter in &self.filters {
            write!(f, " -> {}", filter)?;
        }
        write!(f, " -> {}", self.backend)
    }
}
