//! Normalized provider completions.
//!
//! A [`RawCompletion`] is what a mode adapter hands back after translating a
//! provider-specific wire response: the assistant text, any tool calls, and
//! the untouched provider JSON for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of output.
    Stop,
    /// Token limit reached.
    Length,
    /// The model invoked a tool.
    ToolCall,
    /// Content was filtered by the provider.
    ContentFilter,
}

/// A tool invocation reported by the provider.
///
/// `arguments` is kept as the raw string the provider sent. During streaming
/// it may be an incomplete JSON prefix, which is exactly what the partial
/// decoder consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The tool name the model invoked.
    pub name: String,
    /// The argument payload as raw (possibly partial) JSON text.
    pub arguments: String,
    /// Provider-assigned call id, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolCall {
    /// Create a tool call.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
            id: None,
        }
    }

    /// Set the call id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A normalized provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCompletion {
    /// Assistant text content, concatenated across parts.
    pub text: String,
    /// Tool calls, in the order the provider reported them.
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// The provider's wire response, untouched.
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub raw: JsonValue,
}

impl RawCompletion {
    /// Create a text-only completion.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            finish_reason: Some(FinishReason::Stop),
            raw: JsonValue::Null,
        }
    }

    /// Create a completion carrying a single tool call.
    #[must_use]
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            tool_calls: vec![ToolCall::new(name, arguments)],
            finish_reason: Some(FinishReason::ToolCall),
            raw: JsonValue::Null,
        }
    }

    /// Attach the provider wire response.
    #[must_use]
    pub fn with_raw(mut self, raw: JsonValue) -> Self {
        self.raw = raw;
        self
    }

    /// Set the finish reason.
    #[must_use]
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// Whether the completion carries any tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// What the model produced, for echoing back in a reask: the assistant
    /// text, or the first tool call's argument blob when there is no text.
    #[must_use]
    pub fn echo_text(&self) -> &str {
        if !self.text.is_empty() {
            &self.text
        } else if let Some(tc) = self.tool_calls.first() {
            &tc.arguments
        } else {
            ""
        }
    }
}

/// The substring of a provider response identified as carrying the JSON
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateText(String);

impl CandidateText {
    /// Wrap extracted candidate text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The candidate as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CandidateText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
