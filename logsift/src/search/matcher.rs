use regex::{Regex, RegexBuilder};

use super::expression::Expression;
use crate::errors::{SearchError, SearchResult};

/// Compiles one literal term into a case-insensitive pattern. Terms are
/// escaped first, so `.` or `(` in a query match themselves.
pub(crate) fn compile_term(term: &str) -> SearchResult<Regex> {
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .map_err(|e| SearchError::invalid_pattern(format!("{}: {}", term, e)))
}

/// Evaluates a compiled [`Expression`] against single lines
#[derive(Debug, Clone)]
pub struct LineMatcher {
    groups: Vec<Vec<Regex>>,
}

impl LineMatcher {
    pub fn new(expression: &Expression) -> SearchResult<Self> {
        let groups = expression
            .conjunctions()
            .iter()
            .map(|c| {
                c.terms()
                    .iter()
                    .map(|t| compile_term(t.as_str()))
                    .collect::<SearchResult<Vec<_>>>()
            })
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self { groups })
    }

    /// True when every term of at least one group occurs in the line.
    ///
    /// Stops at the first failing term of a group and at the first group
    /// that is fully satisfied.
    pub fn matches(&self, line: &str) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|term| term.is_match(line)))
    }
}
