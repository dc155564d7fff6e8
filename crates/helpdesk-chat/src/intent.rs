//! Intent classification over raw message text.
//!
//! Keyword and regex checks only: escalation intent, an explicit "yes",
//! and references to existing ticket ids.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that signal the user wants human or ticket-based help.
const ESCALATION_KEYWORDS: &[&str] = &[
    "refund",
    "complaint",
    "not working",
    "issue",
    "bug",
    "cancel",
    "support ticket",
    "ticket",
];

static AFFIRMATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byes\b").expect("Invalid affirmative regex"));

// Ticket ids are issued in lowercase hex. Word boundaries reject hex runs
// embedded in longer alphanumeric tokens.
static TICKET_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-f]{8}\b").expect("Invalid ticket reference regex"));

/// True if the text contains any escalation keyword (case-insensitive substring).
pub fn has_escalation_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    ESCALATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// True if the text contains the standalone word "yes".
pub fn is_affirmative(text: &str) -> bool {
    AFFIRMATIVE_RE.is_match(text)
}

/// The first standalone 8-character lowercase hex token.
///
/// Uppercase or mixed-case tokens are not ticket references.
pub fn extract_ticket_reference(text: &str) -> Option<String> {
    TICKET_REF_RE.find(text).map(|m| m.as_str().to_string())
}
