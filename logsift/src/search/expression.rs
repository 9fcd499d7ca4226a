use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::errors::{SearchError, SearchResult};

/// A double-quoted phrase (kept verbatim) or a run of non-whitespace
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(.*?)"|(\S+)"#).expect("token pattern is valid"));

/// A literal search term: one word, or a quoted phrase with its spaces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Term(String);

impl Term {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.chars().any(char::is_whitespace) {
            write!(f, "\"{}\"", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Terms that must all occur in a line. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conjunction {
    terms: Vec<Term>,
}

impl Conjunction {
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}

/// A parsed query: an OR of AND-groups of literal terms.
///
/// Built once per search. `and` between words is implicit, so `error timeout`
/// and `error and timeout` are the same expression; `or` starts a new group.
/// The operator words are recognised case-insensitively and are never terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expression {
    conjunctions: Vec<Conjunction>,
}

fn is_operator(token: &str, operator: &str) -> bool {
    token.eq_ignore_ascii_case(operator)
}

/// Whether a token is one of the `and` / `or` operator words
pub fn is_operator_word(token: &str) -> bool {
    is_operator(token, "and") || is_operator(token, "or")
}

/// Splits raw query text into tokens.
///
/// A token is the content of a `"..."` pair, taken verbatim, or a maximal run
/// of non-whitespace characters. A quote with no closing partner is just part
/// of the word it sits in. Empty phrases (`""`) produce no token.
pub fn tokenize(raw: &str) -> Vec<String> {
    TOKEN_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

impl Expression {
    /// Parses raw query text, honouring quoted phrases
    pub fn parse(raw: &str) -> SearchResult<Self> {
        if raw.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Self::from_tokens(tokenize(raw))
    }

    /// Reduces an already tokenised query, e.g. shell arguments where each
    /// argument is one term.
    pub fn from_tokens<I, S>(tokens: I) -> SearchResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut conjunctions = Vec::new();
        let mut current: Vec<Term> = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            if token.trim().is_empty() || is_operator(token, "and") {
                continue;
            }
            if is_operator(token, "or") {
                if !current.is_empty() {
                    conjunctions.push(Conjunction {
                        terms: std::mem::take(&mut current),
                    });
                }
                continue;
            }
            current.push(Term(token.to_string()));
        }
        if !current.is_empty() {
            conjunctions.push(Conjunction { terms: current });
        }

        if conjunctions.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(Self { conjunctions })
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.conjunctions
    }

    /// Every distinct term in query order, for highlighting
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = Vec::new();
        for term in self.conjunctions.iter().flat_map(|c| &c.terms) {
            if !terms.contains(&term.as_str()) {
                terms.push(term.as_str());
            }
        }
        terms
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conjunction) in self.conjunctions.iter().enumerate() {
            if i > 0 {
                write!(f, " or ")?;
            }
            for (j, term) in conjunction.terms.iter().enumerate() {
                if j > 0 {
                    write!(f, " and ")?;
                }
                write!(f, "{}", term)?;
            }
        }
        Ok(())
    }
}
