//! # strux-core
//!
//! Core message and completion types for the strux extraction pipeline.
//!
//! This crate provides the foundational types shared by every other strux
//! crate:
//!
//! - **[`Message`] / [`Conversation`]**: chat-style messages sent to a
//!   provider, with text and multi-part (image/audio) content
//! - **[`RawCompletion`]**: a normalized provider response, carrying both
//!   the assistant text and any tool-call argument blobs
//! - **[`CandidateText`]**: the substring of a response identified as
//!   carrying the JSON payload
//! - **[`ProviderRequest`] / [`StreamEvent`]**: the shaped request a
//!   provider sends and the normalized units it streams back
//!
//! ## Example
//!
//! ```rust
//! use strux_core::{Conversation, Message};
//!
//! let mut conversation = Conversation::new();
//! conversation.push(Message::system("Extract the user details."));
//! conversation.push(Message::user("Jason is 25 years old."));
//!
//! assert_eq!(conversation.len(), 2);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod completion;
pub mod messages;
pub mod request;

pub use completion::{CandidateText, FinishReason, RawCompletion, ToolCall};
pub use messages::{Conversation, Message, Role, Segment};
pub use request::{ProviderRequest, StreamEvent, ToolSpec};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::completion::{CandidateText, FinishReason, RawCompletion, ToolCall};
    pub use crate::messages::{Conversation, Message, Role, Segment};
    pub use crate::request::{ProviderRequest, StreamEvent, ToolSpec};
}
