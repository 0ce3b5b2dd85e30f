use super::parser::ParseErrorKind;
use crate::route::{Arg, Filter};
use std::collections::{HashMap, HashSet};

/// Name and accepted argument count of a known filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` means unbounded
    pub max_args: Option<usize>,
}

const fn spec(name: &'static str, min_args: usize, max_args: Option<usize>) -> FilterSpec {
    FilterSpec {
        name,
        min_args,
        max_args,
    }
}

const BUILTIN_FILTERS: &[FilterSpec] = &[
    spec("setRequestHeader", 2, Some(2)),
    spec("appendRequestHeader", 2, Some(2)),
    spec("dropRequestHeader", 1, Some(1)),
    spec("setResponseHeader", 2, Some(2)),
    spec("appendResponseHeader", 2, Some(2)),
    spec("dropResponseHeader", 1, Some(1)),
    spec("setPath", 1, Some(1)),
    spec("modPath", 2, Some(2)),
    spec("setQuery", 1, Some(2)),
    spec("dropQuery", 1, Some(1)),
    spec("stripQuery", 0, Some(1)),
    spec("preserveHost", 0, Some(1)),
    spec("redirectTo", 1, Some(2)),
    spec("redirectToLower", 1, Some(2)),
    spec("status", 1, Some(1)),
    spec("inlineContent", 1, Some(2)),
    spec("flowId", 0, Some(2)),
    spec("compress", 0, None),
    spec("corsOrigin", 0, None),
    spec("latency", 1, Some(1)),
    spec("bandwidth", 1, Some(1)),
    spec("tee", 1, Some(3)),
    spec("ratelimit", 2, Some(2)),
    spec("basicAuth", 1, Some(2)),
    spec("healthcheck", 0, Some(0)),
];

/// Filters the compiler accepts without mocking.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    specs: HashMap<&'static str, FilterSpec>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self {
            specs: BUILTIN_FILTERS.iter().map(|s| (s.name, *s)).collect(),
        }
    }
}

impl FilterRegistry {
    /// An empty registry; every filter must be mocked.
    pub fn empty() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    pub fn register(&mut self, spec: FilterSpec) {
        self.specs.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&FilterSpec> {
        self.specs.get(name)
    }

    /// Validate a filter invocation. Mocked filters accept any arguments.
    pub(crate) fn resolve(&self, filter: Filter) -> Result<Filter, ParseErrorKind> {
        if filter.mocked {
            return Ok(filter);
        }

        let spec = self
            .get(&filter.name)
            .ok_or_else(|| ParseErrorKind::UnknownFilter(filter.name.clone()))?;

        let count = filter.args.len();
        let too_few = count < spec.min_args;
        let too_many = spec.max_args.is_some_and(|max| count > max);
        if too_few || too_many {
            let expected = match spec.max_args {
                Some(max) if max == spec.min_args => format!("{}", max),
                Some(max) => format!("{} to {}", spec.min_args, max),
                None => format!("at least {}", spec.min_args),
            };
            return Err(ParseErrorKind::InvalidArguments {
                name: filter.name,
                message: format!("expected {} arguments, got {}", expected, count),
            });
        }

        Ok(filter)
    }
}

/// Rewrite a parsed filter invocation into its compiled form, replacing it
/// with a no-op marker when its name is in the mock set.
pub fn substitute_mock(name: &str, args: Vec<Arg>, mocks: &HashSet<String>) -> Filter {
    Filter {
        name: name.to_string(),
        args,
        mocked: mocks.contains(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mocks(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substitute_mock() {
        let f = substitute_mock("customfilter", vec![Arg::Number(1.0)], &mocks(&["customfilter"]));
        assert!(f.mocked);
        assert_eq!(f.args, vec![Arg::Number(1.0)]);

        let f = substitute_mock("setPath", vec![], &mocks(&["customfilter"]));
        assert!(!f.mocked);
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let registry = FilterRegistry::default();
        let f = substitute_mock("customfilter", vec![], &HashSet::new());
        assert_eq!(
            registry.resolve(f),
            Err(ParseErrorKind::UnknownFilter("customfilter".into()))
        );
    }

    #[test]
    fn test_mocked_filter_accepts_any_arguments() {
        let registry = FilterRegistry::default();
        let args = vec![Arg::Str("a".into()), Arg::Regexp("b".into()), Arg::Number(3.0)];
        let f = substitute_mock("status", args, &mocks(&["status"]));
        assert!(registry.resolve(f).is_ok());
    }

    #[test]
    fn test_arity_checked_for_builtin() {
        let registry = FilterRegistry::default();
        let f = substitute_mock("setRequestHeader", vec![Arg::Str("X".into())], &HashSet::new());
        assert!(matches!(
            registry.resolve(f),
            Err(ParseErrorKind::InvalidArguments { .. })
        ));

        let f = substitute_mock("compress", vec![Arg::Str("gzip".into()); 4], &HashSet::new());
        assert!(registry.resolve(f).is_ok());
    }

    #[test]
    fn test_register_custom_filter() {
        let mut registry = FilterRegistry::empty();
        assert!(registry.get("auth").is_none());
        registry.register(FilterSpec {
            name: "auth",
            min_args: 0,
            max_args: Some(1),
        });
        let f = substitute_mock("auth", vec![], &HashSet::new());
        assert!(registry.resolve(f).is_ok());
    }
}
