//! The provider trait and transport errors.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use strux_core::{ProviderRequest, RawCompletion, StreamEvent};

/// A pinned stream of normalized provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ProviderError>> + Send>>;

/// Transport-level failures.
///
/// These are infrastructure faults, not model mistakes: the reask loop
/// never spends a corrective attempt on them.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Http {
        /// The status code.
        status: u16,
        /// The response body, truncated for logging.
        body: String,
    },

    /// The request never completed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered 2xx but the payload was not understandable.
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    /// The event stream ended mid-response.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// A completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// Execute a request and wait for the full completion.
    async fn complete(&self, request: &ProviderRequest) -> Result<RawCompletion, ProviderError>;

    /// Execute a request and stream back events as they arrive.
    async fn stream(&self, request: &ProviderRequest) -> Result<EventStream, ProviderError>;
}
