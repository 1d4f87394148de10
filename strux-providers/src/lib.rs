//! # strux-providers
//!
//! Provider clients: the transport layer that turns a shaped
//! [`strux_core::ProviderRequest`] into a completion or a stream of events.
//!
//! [`OpenAiCompatProvider`] speaks the OpenAI chat-completions dialect used
//! by many hosted and local servers. [`ScriptedProvider`] and
//! [`FunctionProvider`] are deterministic in-process providers for tests.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock;
pub mod openai;
pub mod provider;
pub mod sse;

pub use mock::{FunctionProvider, ScriptedProvider};
pub use openai::OpenAiCompatProvider;
pub use provider::{EventStream, Provider, ProviderError};
