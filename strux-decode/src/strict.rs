//! Strict JSON decoding.

use serde_json::Value as JsonValue;

use crate::error::DecodeError;

/// Decode candidate text as complete JSON.
///
/// No repair is attempted. Every terminal extraction result passes through
/// this function regardless of how the text was produced.
pub fn decode_strict(text: &str) -> Result<JsonValue, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    serde_json::from_str(text)
        .map_err(|e| DecodeError::syntax(classify(&e), e.line(), e.column()))
}

fn classify(e: &serde_json::Error) -> String {
    if e.is_eof() {
        "unexpected end of input".to_string()
    } else {
        e.to_string()
    }
}
