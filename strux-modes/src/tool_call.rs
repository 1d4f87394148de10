//! Tool-call mode.
//!
//! The schema is offered as a single required tool; the model "calls" it
//! and the arguments are the candidate. Assistant prose is ignored
//! entirely in this mode.

use tracing::debug;

use strux_core::{CandidateText, Conversation, ProviderRequest, RawCompletion, ToolSpec};
use strux_schema::{to_json_schema, SchemaDescriptor};

use crate::adapter::{tool_name_for, AdapterError, Mode, ModeAdapter, StreamAccum};

/// The tool-call mode adapter.
#[derive(Debug, Clone, Default)]
pub struct ToolCallAdapter;

impl ToolCallAdapter {
    /// Create the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ModeAdapter for ToolCallAdapter {
    fn mode(&self) -> Mode {
        Mode::ToolCall
    }

    fn shape_request(
        &self,
        conversation: &Conversation,
        schema: &SchemaDescriptor,
    ) -> ProviderRequest {
        let name = tool_name_for(schema);
        let description = schema
            .description
            .clone()
            .unwrap_or_else(|| format!("Record the extracted {}.", schema.name));
        let tool = ToolSpec::new(name, description, to_json_schema(schema));
        debug!(tool = %tool.name, "shaped tool-call request");
        ProviderRequest::new(conversation.messages().to_vec()).with_required_tool(tool)
    }

    fn extract_candidate(
        &self,
        completion: &RawCompletion,
    ) -> Result<CandidateText, AdapterError> {
        completion
            .tool_calls
            .first()
            .map(|call| CandidateText::new(call.arguments.clone()))
            .ok_or(AdapterError::MissingToolCall)
    }

    fn candidate_in(&self, accum: &StreamAccum) -> Option<String> {
        if accum.tool_arguments.is_empty() {
            None
        } else {
            Some(accum.tool_arguments.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strux_core::{Message, StreamEvent};
    use strux_schema::FieldSpec;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::object("Person")
            .field("name", FieldSpec::string())
            .field("age", FieldSpec::integer())
            .build()
    }

    #[test]
    fn test_request_carries_required_tool() {
        let conversation = Conversation::new().with(Message::user("Jason is 25"));
        let request = ToolCallAdapter::new().shape_request(&conversation, &schema());

        assert!(request.require_tool);
        assert!(!request.json_response_format);
        let tool = request.tool.unwrap();
        assert_eq!(tool.name, "person");
        assert_eq!(tool.parameters["properties"]["age"]["type"], "integer");
    }

    #[test]
    fn test_candidate_is_tool_arguments() {
        let completion = RawCompletion::tool_call("person", r#"{"name":"Jason","age":25}"#);
        let candidate = ToolCallAdapter::new().extract_candidate(&completion).unwrap();
        assert_eq!(candidate.as_str(), r#"{"name":"Jason","age":25}"#);
    }

    #[test]
    fn test_prose_only_completion_is_missing_tool_call() {
        let completion = RawCompletion::text(r#"{"name":"Jason","age":25}"#);
        let err = ToolCallAdapter::new().extract_candidate(&completion).unwrap_err();
        assert_eq!(err, AdapterError::MissingToolCall);
    }

    #[test]
    fn test_streaming_candidate_ignores_text_channel() {
        let adapter = ToolCallAdapter::new();
        let mut accum = StreamAccum::new();

        accum.absorb(&StreamEvent::TextDelta("thinking out loud".into()));
        assert_eq!(adapter.candidate_in(&accum), None);

        accum.absorb(&StreamEvent::ToolCallDelta {
            name: Some("person".into()),
            arguments: r#"{"name": "Ja"#.into(),
        });
        assert_eq!(adapter.candidate_in(&accum).unwrap(), r#"{"name": "Ja"#);
    }
}
