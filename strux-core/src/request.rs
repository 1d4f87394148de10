//! Provider requests and stream events.
//!
//! A [`ProviderRequest`] is the mode-shaped payload handed to a provider:
//! the conversation plus whatever structured-output machinery the active
//! mode decided on (a tool definition, a JSON response format, or nothing).
//! [`StreamEvent`] is the normalized unit a provider emits while streaming.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::completion::FinishReason;
use crate::messages::Message;

/// A tool definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// What the tool does, shown to the model.
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub parameters: JsonValue,
}

impl ToolSpec {
    /// Create a tool definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A fully shaped request, ready for a provider to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The conversation, in order.
    pub messages: Vec<Message>,
    /// Tool offered to the model, when the mode uses one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolSpec>,
    /// Whether the provider must force the tool to be called.
    pub require_tool: bool,
    /// Whether the provider should enable its native JSON output format.
    pub json_response_format: bool,
}

impl ProviderRequest {
    /// A plain request with no structured-output machinery.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tool: None,
            require_tool: false,
            json_response_format: false,
        }
    }

    /// Attach a tool definition and force its invocation.
    #[must_use]
    pub fn with_required_tool(mut self, tool: ToolSpec) -> Self {
        self.tool = Some(tool);
        self.require_tool = true;
        self
    }

    /// Enable the provider's native JSON response format.
    #[must_use]
    pub fn with_json_format(mut self) -> Self {
        self.json_response_format = true;
        self
    }
}

/// One normalized unit of a streamed provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A fragment of assistant text.
    TextDelta(String),
    /// A fragment of a tool call's argument text.
    ToolCallDelta {
        /// Tool name, present on the first fragment of a call.
        name: Option<String>,
        /// Argument text appended by this fragment.
        arguments: String,
    },
    /// The stream finished.
    Done(Option<FinishReason>),
}
