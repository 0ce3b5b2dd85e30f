use crate::route::PathMatch;
use std::cmp::Ordering;

/// How precisely a route matched a request. Greater is more specific.
///
/// Ordered by the per-segment path ranks (literal > parameter > wildcard >
/// unconstrained, compared from the start of the path), then by the absence
/// of a wildcard, then by the number of non-path predicates. Source order is
/// the final tie-break and is applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specificity {
    pub ranks: Vec<u8>,
    pub exact: bool,
    pub constraints: usize,
}

impl Specificity {
    pub fn new(path: &PathMatch, constraints: usize) -> Self {
        Self {
            ranks: path.ranks.clone(),
            exact: !path.wildcard,
            constraints,
        }
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ranks
            .cmp(&other.ranks)
            .then(self.exact.cmp(&other.exact))
            .then(self.constraints.cmp(&other.constraints))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RANK_LITERAL, RANK_PARAM, RANK_UNCONSTRAINED, RANK_WILDCARD};

    fn spec(ranks: &[u8], wildcard: bool, constraints: usize) -> Specificity {
        let path = PathMatch {
            ranks: ranks.to_vec(),
            wildcard,
            captures: Vec::new(),
        };
        Specificity::new(&path, constraints)
    }

    #[test]
    fn test_literal_beats_param_beats_wildcard() {
        let literal = spec(&[RANK_LITERAL, RANK_LITERAL], false, 0);
        let param = spec(&[RANK_LITERAL, RANK_PARAM], false, 0);
        let wildcard = spec(&[RANK_LITERAL, RANK_WILDCARD], true, 0);
        let none = spec(&[RANK_UNCONSTRAINED, RANK_UNCONSTRAINED], true, 5);
        assert!(literal > param);
        assert!(param > wildcard);
        assert!(wildcard > none);
    }

    #[test]
    fn test_earlier_segment_decides() {
        let a = spec(&[RANK_LITERAL, RANK_WILDCARD], true, 0);
        let b = spec(&[RANK_PARAM, RANK_LITERAL], false, 3);
        assert!(a > b);
    }

    #[test]
    fn test_empty_wildcard_loses_to_exact() {
        let exact = spec(&[RANK_LITERAL], false, 0);
        let tail = spec(&[RANK_LITERAL], true, 0);
        assert!(exact > tail);
    }

    #[test]
    fn test_more_predicates_win_on_equal_path() {
        let plain = spec(&[RANK_LITERAL], false, 1);
        let with_header = spec(&[RANK_LITERAL], false, 2);
        assert!(with_header > plain);
        assert_eq!(plain.cmp(&spec(&[RANK_LITERAL], false, 1)), Ordering::Equal);
    }
}
