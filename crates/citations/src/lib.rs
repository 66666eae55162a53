//! Inline citation markers in answer text.
//!
//! A marker is a bracketed token referencing one or more source document
//! identifiers: `[3]`, `[12, 14]`, `[doc_id 7]`. Parsing is a pure function
//! of the text, so callers can rescan on every render pass while an answer
//! is still streaming in.

use once_cell::sync::Lazy;
use regex::Regex;

/// One recognized marker, with exact byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// The marker exactly as it appears, brackets included.
    pub original_text: String,
    /// Identifiers in the order they appear inside the marker.
    pub ids: Vec<String>,
    pub start: usize,
    pub end: usize,
}

// Optional `doc_id` tag, then anything up to the closing bracket. Comma
// splitting and token validation happen after the match so `[ , ]` and the
// like fall through as plain text.
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:doc_id\s+)?([^\]]+)\]").expect("valid marker regex"));

fn split_ids(inner: &str) -> Option<Vec<String>> {
    let mut ids = Vec::new();
    for token in inner.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        ids.push(token.to_string());
    }
    Some(ids)
}

/// Every marker in `text`, left to right, non-overlapping.
pub fn parse(text: &str) -> Vec<Citation> {
    MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0).expect("group 0 always present");
            let ids = split_ids(caps.get(1).expect("inner group").as_str())?;
            Some(Citation {
                original_text: whole.as_str().to_string(),
                ids,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Identifiers from every marker in `text`, de-duplicated, in order of first
/// appearance.
pub fn all_ids(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for citation in parse(text) {
        for id in citation.ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
    }
    seen
}

/// Substitute every marker with `render(ids, all_ids)`.
///
/// `all_ids` is the first-appearance order of every identifier in the text,
/// computed once and handed to each invocation, which is what sequential
/// re-numbering schemes need. Non-marker text passes through unchanged.
pub fn replace<F>(text: &str, mut render: F) -> String
where
    F: FnMut(&[String], &[String]) -> String,
{
    let order = all_ids(text);
    let mut output = String::with_capacity(text.len());
    let mut last_end = 0;
    for citation in parse(text) {
        output.push_str(&text[last_end..citation.start]);
        output.push_str(&render(&citation.ids, &order));
        last_end = citation.end;
    }
    output.push_str(&text[last_end..]);
    output
}
