//! Pulls the report object out of free-form generator output.
//!
//! Strategies run in a fixed order and the first candidate that
//! deserializes wins. Each strategy yields at most one candidate, and the
//! brace scan stops after [`MAX_SCAN_CHARS`], so a hostile or runaway
//! response costs bounded work.

use std::sync::LazyLock;

use regex::Regex;
use siteaudit_core::NarrativeReport;

const MAX_SCAN_CHARS: usize = 200_000;

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(\{.*?\})\s*```").expect("valid regex")
});

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)here(?:'|’)?s\s+(?:is\s+)?(?:the|your)\s+(?:\w+\s+){0,3}?report\s*:?")
        .expect("valid regex")
});

type Strategy = fn(&str) -> Option<&str>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("direct", direct_object),
    ("fenced", fenced_block),
    ("prefixed", prefixed_object),
];

/// Returns the first parseable report found in `text`.
pub(crate) fn extract_report(text: &str) -> Option<NarrativeReport> {
    for (name, strategy) in STRATEGIES {
        let Some(candidate) = strategy(text) else {
            continue;
        };
        match serde_json::from_str::<NarrativeReport>(candidate) {
            Ok(report) => {
                tracing::debug!(strategy = name, "extracted report JSON");
                return Some(report);
            }
            Err(e) => tracing::debug!(strategy = name, error = %e, "candidate rejected"),
        }
    }
    None
}

/// Everything from the first `{` to the last `}`.
fn direct_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The first fenced code block holding an object.
fn fenced_block(text: &str) -> Option<&str> {
    FENCED_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A balanced object after a "Here's the report:" lead-in, or after the
/// start of the text when there is no lead-in.
fn prefixed_object(text: &str) -> Option<&str> {
    let from = PREFIX_RE.find(text).map_or(0, |m| m.end());
    balanced_object(&text[from..])
}

/// String-aware scan for the first complete `{...}`.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices().take(MAX_SCAN_CHARS) {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset;
                    return Some(&text[start..=end]);
                }
            }
            _ => {}
        }
    }
    None
}
