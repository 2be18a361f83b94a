//! Feedback sanitizer: a pure transformation from raw AI output to a typed
//! `FeedbackRecord`.
//!
//! The model is told to return bare JSON but routinely wraps it in markdown
//! fences or multi-part content; this module is the single place that mess
//! is dealt with.

use thiserror::Error;

use crate::models::analysis::FeedbackRecord;
use crate::services::ai::MessageContent;

const MAX_SCORE: u8 = 100;

/// A failed parse. The original raw text is retained for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ParseError {
    pub reason: String,
    pub raw: String,
}

/// Extracts the text payload from the AI reply, strips markdown fencing,
/// parses it as JSON, and validates score ranges. Out-of-range scores are
/// rejected, not clamped.
pub fn sanitize(content: &MessageContent) -> Result<FeedbackRecord, ParseError> {
    let raw = extract_text(content);
    let text = strip_json_fences(&raw);

    let feedback: FeedbackRecord = serde_json::from_str(text).map_err(|e| ParseError {
        reason: format!("invalid JSON: {e}"),
        raw: raw.clone(),
    })?;

    if let Some((field, value)) = feedback
        .scores()
        .into_iter()
        .find(|(_, value)| *value > MAX_SCORE)
    {
        return Err(ParseError {
            reason: format!("{field} out of range: {value}"),
            raw,
        });
    }

    Ok(feedback)
}

/// The first text-bearing part wins; content with no text part at all falls
/// back to a JSON rendering of the whole structure.
fn extract_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .find_map(|part| part.text.clone())
            .unwrap_or_else(|| serde_json::to_string(parts).unwrap_or_default()),
    }
}

/// Strips ```json ... ``` or ``` ... ``` markdown fences, case-insensitively,
/// plus surrounding whitespace.
fn strip_json_fences(text: &str) -> &str {
    let mut text = text.trim();
    if text.len() >= 7 && text.as_bytes()[..7].eq_ignore_ascii_case(b"```json") {
        text = &text[7..];
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    let text = text.trim_start();
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
