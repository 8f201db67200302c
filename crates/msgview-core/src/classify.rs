//! Payload classification and JSON re-serialization

use crate::types::{Classification, DerivedText};

/// Trim a raw payload the way a browser's `String.prototype.trim` would.
///
/// Unicode whitespace plus the byte-order mark, which `str::trim` keeps.
pub fn trim_payload(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Does the text have matching outer JSON brackets?
pub fn looks_like_json(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}'))
        || (text.starts_with('[') && text.ends_with(']'))
}

/// Classify an already-trimmed payload and derive its two renderings.
///
/// Only text with matching outer brackets is handed to the JSON parser. A
/// failed parse never alters the text: both renderings keep it verbatim.
///
/// Whitespace and indentation are normalized but numbers are not. Each number
/// keeps its written form (`2.50`, `1e2`, 20-digit integers), so nothing a
/// producer wrote is rounded or reformatted on its way to the clipboard.
pub fn classify(text: &str) -> (Classification, DerivedText) {
    if !looks_like_json(text) {
        return (Classification::Text, DerivedText::verbatim(text));
    }

    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "payload looked like JSON but did not parse");
            return (Classification::TextInvalidJson, DerivedText::verbatim(text));
        }
    };

    match (serde_json::to_string(&value), serde_json::to_string_pretty(&value)) {
        (Ok(compact), Ok(expanded)) => (Classification::Json, DerivedText { compact, expanded }),
        _ => (Classification::TextInvalidJson, DerivedText::verbatim(text)),
    }
}

/// Trim then classify a raw payload
pub fn classify_raw(raw: &str) -> (Classification, DerivedText) {
    classify(trim_payload(raw))
}
