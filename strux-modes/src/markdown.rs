//! Markdown-fence mode.
//!
//! For providers with neither tool calling nor a native JSON format: the
//! model is asked to answer inside a ```json code block and the candidate
//! is the fence body.

use tracing::debug;

use strux_core::{CandidateText, Conversation, Message, ProviderRequest, RawCompletion};
use strux_schema::SchemaDescriptor;

use crate::adapter::{AdapterError, Mode, ModeAdapter, StreamAccum};
use crate::json_mode::schema_instruction;
use crate::scan::fenced_block;

/// The markdown-fence mode adapter.
#[derive(Debug, Clone, Default)]
pub struct MarkdownJsonAdapter;

impl MarkdownJsonAdapter {
    /// Create the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ModeAdapter for MarkdownJsonAdapter {
    fn mode(&self) -> Mode {
        Mode::MarkdownJson
    }

    fn shape_request(
        &self,
        conversation: &Conversation,
        schema: &SchemaDescriptor,
    ) -> ProviderRequest {
        let mut messages = vec![Message::system(schema_instruction(schema, true))];
        messages.extend(conversation.messages().iter().cloned());
        debug!(schema = %schema.name, "shaped markdown-json request");
        ProviderRequest::new(messages)
    }

    fn extract_candidate(
        &self,
        completion: &RawCompletion,
    ) -> Result<CandidateText, AdapterError> {
        fenced_block(&completion.text)
            .map(CandidateText::from)
            .ok_or(AdapterError::NoFencedBlock)
    }

    fn candidate_in(&self, accum: &StreamAccum) -> Option<String> {
        fenced_block(&accum.text).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strux_core::StreamEvent;
    use strux_schema::FieldSpec;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::object("Person")
            .field("name", FieldSpec::string())
            .build()
    }

    #[test]
    fn test_request_is_plain_with_fence_instruction() {
        let conversation = Conversation::from_user("Jason is 25");
        let request = MarkdownJsonAdapter::new().shape_request(&conversation, &schema());

        assert!(request.tool.is_none());
        assert!(!request.json_response_format);
        assert!(request.messages[0].text_content().contains("```json"));
    }

    #[test]
    fn test_candidate_from_fence() {
        let completion =
            RawCompletion::text("Here you go:\n```json\n{\"name\": \"Jason\"}\n```\n");
        let candidate = MarkdownJsonAdapter::new().extract_candidate(&completion).unwrap();
        assert_eq!(candidate.as_str(), "{\"name\": \"Jason\"}");
    }

    #[test]
    fn test_missing_fence_is_an_error() {
        let completion = RawCompletion::text(r#"{"name": "Jason"}"#);
        let err = MarkdownJsonAdapter::new().extract_candidate(&completion).unwrap_err();
        assert_eq!(err, AdapterError::NoFencedBlock);
    }

    #[test]
    fn test_streaming_candidate_appears_after_fence_opens() {
        let adapter = MarkdownJsonAdapter::new();
        let mut accum = StreamAccum::new();

        accum.absorb(&StreamEvent::TextDelta("Let me write that up:\n```js".into()));
        assert_eq!(adapter.candidate_in(&accum), None);

        accum.absorb(&StreamEvent::TextDelta("on\n{\"name\"".into()));
        assert_eq!(adapter.candidate_in(&accum).unwrap(), "{\"name\"");
    }
}
