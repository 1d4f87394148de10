//! The mode adapter trait and shared stream accumulation.

use thiserror::Error;

use strux_core::{CandidateText, Conversation, ProviderRequest, RawCompletion, StreamEvent};
use strux_schema::SchemaDescriptor;

/// The structured-output strategies strux knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Schema as a required tool definition.
    #[default]
    ToolCall,
    /// Provider-native JSON response format.
    Json,
    /// JSON inside a markdown fence, for providers with neither tools nor a
    /// JSON format.
    MarkdownJson,
}

impl Mode {
    /// Build the adapter for this mode.
    #[must_use]
    pub fn adapter(self) -> Box<dyn ModeAdapter> {
        match self {
            Self::ToolCall => Box::new(crate::tool_call::ToolCallAdapter::new()),
            Self::Json => Box::new(crate::json_mode::JsonModeAdapter::new()),
            Self::MarkdownJson => Box::new(crate::markdown::MarkdownJsonAdapter::new()),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ToolCall => "tool_call",
            Self::Json => "json",
            Self::MarkdownJson => "markdown_json",
        };
        f.write_str(name)
    }
}

/// Why an adapter could not locate a candidate in a completion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// Tool-call mode, but the model never invoked the tool.
    #[error("model did not call the extraction tool")]
    MissingToolCall,

    /// Text modes, but the completion carries no JSON value.
    #[error("no JSON value found in the completion text")]
    NoJsonFound,

    /// Markdown mode, but no fenced JSON block is present.
    #[error("no fenced JSON block found in the completion text")]
    NoFencedBlock,
}

/// A mode adapter: shapes requests on the way out, locates candidates on
/// the way back.
///
/// Adapters are stateless. Streaming state lives in the [`StreamAccum`] the
/// caller owns, so a single adapter can serve many concurrent extractions.
pub trait ModeAdapter: Send + Sync {
    /// Which mode this adapter implements.
    fn mode(&self) -> Mode;

    /// Shape a provider request from the conversation and target schema.
    fn shape_request(
        &self,
        conversation: &Conversation,
        schema: &SchemaDescriptor,
    ) -> ProviderRequest;

    /// Locate the JSON candidate in a finished completion.
    ///
    /// Reads only the channel this mode uses.
    fn extract_candidate(&self, completion: &RawCompletion)
        -> Result<CandidateText, AdapterError>;

    /// The candidate text accumulated so far during streaming, if any has
    /// started to appear.
    fn candidate_in(&self, accum: &StreamAccum) -> Option<String>;
}

/// Accumulated stream state: the growing text and tool-argument buffers.
#[derive(Debug, Clone, Default)]
pub struct StreamAccum {
    /// Concatenated assistant text deltas.
    pub text: String,
    /// Concatenated tool-call argument deltas.
    pub tool_arguments: String,
    /// The tool name, once a tool-call delta announced it.
    pub tool_name: Option<String>,
    /// The finish reason, once the stream ended.
    pub finish: Option<Option<strux_core::FinishReason>>,
}

impl StreamAccum {
    /// An empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one stream event.
    pub fn absorb(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::TextDelta(delta) => self.text.push_str(delta),
            StreamEvent::ToolCallDelta { name, arguments } => {
                if let Some(name) = name {
                    self.tool_name.get_or_insert_with(|| name.clone());
                }
                self.tool_arguments.push_str(arguments);
            }
            StreamEvent::Done(reason) => self.finish = Some(*reason),
        }
    }

    /// Whether the stream has ended.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.finish.is_some()
    }

    /// Collapse the accumulated stream into a normalized completion.
    #[must_use]
    pub fn into_completion(self) -> RawCompletion {
        let mut completion = RawCompletion::text(self.text);
        if !self.tool_arguments.is_empty() || self.tool_name.is_some() {
            completion.tool_calls.push(strux_core::ToolCall::new(
                self.tool_name.unwrap_or_default(),
                self.tool_arguments,
            ));
        }
        completion.finish_reason = self.finish.flatten();
        completion
    }
}

/// The tool name derived from a schema: lowercased, with non-alphanumeric
/// runs collapsed to underscores.
#[must_use]
pub fn tool_name_for(schema: &SchemaDescriptor) -> String {
    let mut out = String::new();
    let mut last_was_sep = true;
    for c in schema.name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "extract".to_string()
    } else {
        trimmed.to_string()
    }
}
