//! Deterministic in-process providers for tests.
//!
//! [`ScriptedProvider`] replays queued completions, errors, or event
//! scripts in order and records every request it receives.
//! [`FunctionProvider`] computes its completion from the request, for tests
//! that need to react to conversation content.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;

use strux_core::{ProviderRequest, RawCompletion, StreamEvent};

use crate::provider::{EventStream, Provider, ProviderError};

enum Scripted {
    Completion(RawCompletion),
    Error(ProviderError),
    Events(Vec<StreamEvent>),
}

#[derive(Default)]
struct ScriptState {
    script: VecDeque<Scripted>,
    requests: Vec<ProviderRequest>,
}

/// A provider that replays a fixed script.
///
/// Clones share the same script and request log.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedProvider {
    /// Create a provider with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completion.
    #[must_use]
    pub fn then_completion(self, completion: RawCompletion) -> Self {
        self.state
            .lock()
            .expect("script lock")
            .script
            .push_back(Scripted::Completion(completion));
        self
    }

    /// Queue a text completion.
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then_completion(RawCompletion::text(text))
    }

    /// Queue a tool-call completion.
    #[must_use]
    pub fn then_tool_call(self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        self.then_completion(RawCompletion::tool_call(name, arguments))
    }

    /// Queue a transport error.
    #[must_use]
    pub fn then_error(self, error: ProviderError) -> Self {
        self.state
            .lock()
            .expect("script lock")
            .script
            .push_back(Scripted::Error(error));
        self
    }

    /// Queue an explicit event script for one streamed attempt.
    #[must_use]
    pub fn then_events(self, events: Vec<StreamEvent>) -> Self {
        self.state
            .lock()
            .expect("script lock")
            .script
            .push_back(Scripted::Events(events));
        self
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<ProviderRequest> {
        self.state.lock().expect("script lock").requests.clone()
    }

    /// How many requests have been received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.lock().expect("script lock").requests.len()
    }

    fn next_step(&self, request: &ProviderRequest) -> Option<Scripted> {
        let mut state = self.state.lock().expect("script lock");
        state.requests.push(request.clone());
        state.script.pop_front()
    }
}

/// Expand a finished completion into the events a stream would have carried.
fn events_of(completion: &RawCompletion) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    if !completion.text.is_empty() {
        events.push(StreamEvent::TextDelta(completion.text.clone()));
    }
    for call in &completion.tool_calls {
        events.push(StreamEvent::ToolCallDelta {
            name: Some(call.name.clone()),
            arguments: call.arguments.clone(),
        });
    }
    events.push(StreamEvent::Done(completion.finish_reason));
    events
}

fn stream_of(events: Vec<StreamEvent>) -> EventStream {
    let (tx, rx) = tokio::sync::mpsc::channel(events.len().max(1));
    tokio::spawn(async move {
        for event in events {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }
    });
    Box::pin(ReceiverStream::new(rx))
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<RawCompletion, ProviderError> {
        match self.next_step(request) {
            Some(Scripted::Completion(completion)) => Ok(completion),
            Some(Scripted::Error(error)) => Err(error),
            Some(Scripted::Events(events)) => {
                // collapse an event script for non-streaming callers
                let mut accum_text = String::new();
                let mut tool_name = None;
                let mut tool_args = String::new();
                let mut finish = None;
                for event in events {
                    match event {
                        StreamEvent::TextDelta(t) => accum_text.push_str(&t),
                        StreamEvent::ToolCallDelta { name, arguments } => {
                            if tool_name.is_none() {
                                tool_name = name;
                            }
                            tool_args.push_str(&arguments);
                        }
                        StreamEvent::Done(reason) => finish = reason,
                    }
                }
                let mut completion = RawCompletion::text(accum_text);
                if tool_name.is_some() || !tool_args.is_empty() {
                    completion.tool_calls.push(strux_core::ToolCall::new(
                        tool_name.unwrap_or_default(),
                        tool_args,
                    ));
                }
                completion.finish_reason = finish;
                Ok(completion)
            }
            None => Err(ProviderError::Transport(
                "scripted provider has no responses left".to_string(),
            )),
        }
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<EventStream, ProviderError> {
        match self.next_step(request) {
            Some(Scripted::Events(events)) => Ok(stream_of(events)),
            Some(Scripted::Completion(completion)) => Ok(stream_of(events_of(&completion))),
            Some(Scripted::Error(error)) => Err(error),
            None => Err(ProviderError::Transport(
                "scripted provider has no responses left".to_string(),
            )),
        }
    }
}

type CompleteFn =
    dyn Fn(&ProviderRequest) -> Result<RawCompletion, ProviderError> + Send + Sync;

/// A provider whose completion is computed from the request.
#[derive(Clone)]
pub struct FunctionProvider {
    f: Arc<CompleteFn>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl FunctionProvider {
    /// Create a provider from a completion function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ProviderRequest) -> Result<RawCompletion, ProviderError> + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().expect("request lock").clone()
    }
}

#[async_trait]
impl Provider for FunctionProvider {
    fn name(&self) -> &str {
        "function"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<RawCompletion, ProviderError> {
        self.requests
            .lock()
            .expect("request lock")
            .push(request.clone());
        (self.f)(request)
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<EventStream, ProviderError> {
        let completion = self.complete(request).await?;
        Ok(stream_of(events_of(&completion)))
    }
}
