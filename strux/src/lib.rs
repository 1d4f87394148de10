//! # strux
//!
//! Strongly-typed structured data extraction from LLM completions.
//!
//! strux turns "please answer in JSON" into a contract: a schema describes
//! the target shape, a mode adapter pushes it into the provider request, a
//! decoder and validator check what comes back, and a reask loop feeds
//! validation errors to the model until it answers correctly or the retry
//! budget runs out. Streaming extraction emits typed progress while the
//! model is still writing.
//!
//! ## Example
//!
//! ```rust
//! use strux::prelude::*;
//! use strux::providers::ScriptedProvider;
//!
//! # tokio_test::block_on(async {
//! let schema = SchemaDescriptor::object("Person")
//!     .field("name", FieldSpec::string().describe("Full name"))
//!     .field("age", FieldSpec::integer())
//!     .build();
//!
//! // stands in for a real provider such as OpenAiCompatProvider
//! let provider = ScriptedProvider::new()
//!     .then_tool_call("person", r#"{"name": "Ada", "age": 36}"#);
//!
//! let extractor = Extractor::new(provider, schema).with_max_retries(2);
//! let extraction = extractor
//!     .extract(&Conversation::from_user("Ada Lovelace is 36 years old."))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(extraction.instance["name"], "Ada");
//! assert_eq!(extraction.instance["age"], 36);
//! # });
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod extractor;

pub use extractor::{Extraction, Extractor};

pub use strux_core::{
    CandidateText, Conversation, FinishReason, Message, ProviderRequest, RawCompletion, Role,
    Segment, StreamEvent, ToolCall, ToolSpec,
};
pub use strux_modes::{AdapterError, Mode, ModeAdapter};
pub use strux_reask::{
    AttemptRecord, Backoff, ExtractError, ExtractionMetrics, MetricsSnapshot, ReaskConfig,
};
pub use strux_schema::{
    rules, validate, FieldError, FieldKind, FieldSpec, Rule, ScalarType, SchemaDescriptor,
    ValidationContext, ValidationOutcome,
};
pub use strux_stream::{MaterializedStream, StreamUpdate};

/// Provider clients and test providers.
pub mod providers {
    pub use strux_providers::{
        EventStream, FunctionProvider, OpenAiCompatProvider, Provider, ProviderError,
        ScriptedProvider,
    };
}

/// Decoding primitives, exposed for callers building their own tooling.
pub mod decode {
    pub use strux_decode::{decode_partial, decode_strict, DecodeError, PartialValue, PathSeg};
}

/// Prelude for common imports.
pub mod prelude {
    pub use crate::providers::Provider;
    pub use crate::{
        Backoff, Conversation, ExtractError, Extraction, Extractor, FieldSpec, Message, Mode,
        SchemaDescriptor, StreamUpdate, ValidationContext, ValidationOutcome,
    };
    pub use strux_schema::rules;
}
