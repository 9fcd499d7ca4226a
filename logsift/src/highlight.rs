//! Locates the spans of matched terms in rendered output.
//!
//! The result is a list of byte ranges; painting them is left to the
//! presentation layer.

use tracing::warn;

use crate::search::expression::is_operator_word;
use crate::search::matcher::compile_term;

/// Returns every case-insensitive occurrence of every term as a
/// `(start, end)` byte range into `text`, ordered by position.
///
/// Occurrences of one term never overlap each other (the search resumes after
/// each match), but spans of different terms may; see [`merge_spans`].
/// The operator words `and` / `or` and empty terms are skipped.
pub fn highlight<S: AsRef<str>>(text: &str, terms: &[S]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    for term in terms {
        let term = term.as_ref();
        if term.is_empty() || is_operator_word(term) {
            continue;
        }
        match compile_term(term) {
            Ok(pattern) => spans.extend(pattern.find_iter(text).map(|m| (m.start(), m.end()))),
            Err(e) => warn!("Not highlighting {}", e),
        }
    }
    spans.sort_unstable();
    spans
}

/// Collapses overlapping or touching spans into disjoint ones
pub fn merge_spans(spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut sorted = spans.to_vec();
    sorted.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
