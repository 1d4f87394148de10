//! Native JSON mode.
//!
//! The request enables the provider's JSON response format and prepends a
//! system instruction carrying the rendered schema. The candidate is
//! scanned out of the assistant text; tool calls are never consulted.

use tracing::debug;

use strux_core::{CandidateText, Conversation, Message, ProviderRequest, RawCompletion};
use strux_schema::{to_json_schema, SchemaDescriptor};

use crate::adapter::{AdapterError, Mode, ModeAdapter, StreamAccum};
use crate::scan::find_json_span;

/// The JSON-mode adapter.
#[derive(Debug, Clone, Default)]
pub struct JsonModeAdapter;

impl JsonModeAdapter {
    /// Create the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn schema_instruction(schema: &SchemaDescriptor, fenced: bool) -> String {
    let shape = if schema.is_collection() { "array" } else { "object" };
    let rendered = serde_json::to_string_pretty(&to_json_schema(schema))
        .unwrap_or_else(|_| "{}".to_string());
    if fenced {
        format!(
            "Answer with a JSON {shape} inside a ```json code block. \
             The JSON must conform to this schema:\n\n{rendered}\n\n\
             Output the code block and nothing else."
        )
    } else {
        format!(
            "Answer with a single JSON {shape} conforming to this schema:\n\n\
             {rendered}\n\nOutput only the JSON, with no surrounding prose."
        )
    }
}

impl ModeAdapter for JsonModeAdapter {
    fn mode(&self) -> Mode {
        Mode::Json
    }

    fn shape_request(
        &self,
        conversation: &Conversation,
        schema: &SchemaDescriptor,
    ) -> ProviderRequest {
        let mut messages = vec![Message::system(schema_instruction(schema, false))];
        messages.extend(conversation.messages().iter().cloned());
        debug!(schema = %schema.name, "shaped json-mode request");
        ProviderRequest::new(messages).with_json_format()
    }

    fn extract_candidate(
        &self,
        completion: &RawCompletion,
    ) -> Result<CandidateText, AdapterError> {
        find_json_span(&completion.text)
            .map(CandidateText::from)
            .ok_or(AdapterError::NoJsonFound)
    }

    fn candidate_in(&self, accum: &StreamAccum) -> Option<String> {
        find_json_span(&accum.text).map(str::to_string)
    }
}
