//! OpenAI-compatible chat-completions client.
//!
//! Speaks the `/chat/completions` dialect shared by OpenAI, many hosted
//! gateways, and local servers. One client instance is cheap to clone and
//! shares its connection pool.

use futures::StreamExt;
use serde_json::{json, Value as JsonValue};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use async_trait::async_trait;

use strux_core::{
    FinishReason, Message, ProviderRequest, RawCompletion, Role, Segment, StreamEvent, ToolCall,
};

use crate::provider::{EventStream, Provider, ProviderError};
use crate::sse::SseParser;

const STREAM_CHANNEL_CAPACITY: usize = 32;

/// A client for OpenAI-compatible chat-completions endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    name: String,
}

impl OpenAiCompatProvider {
    /// Create a client for the given endpoint and model.
    ///
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            name: "openai-compatible".to_string(),
        }
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the logging name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn body(&self, request: &ProviderRequest, stream: bool) -> JsonValue {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages.iter().map(wire_message).collect::<Vec<_>>(),
        });
        if let Some(tool) = &request.tool {
            body["tools"] = json!([{
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                },
            }]);
            if request.require_tool {
                body["tool_choice"] = json!({
                    "type": "function",
                    "function": {"name": tool.name},
                });
            }
        }
        if request.json_response_format {
            body["response_format"] = json!({"type": "json_object"});
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    async fn send(
        &self,
        request: &ProviderRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let mut req = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&self.body(request, stream));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(512).collect();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<RawCompletion, ProviderError> {
        debug!(provider = %self.name, model = %self.model, "sending completion request");
        let response = self.send(request, false).await?;
        let payload: JsonValue = response.json().await?;
        parse_completion(payload)
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<EventStream, ProviderError> {
        debug!(provider = %self.name, model = %self.model, "opening completion stream");
        let response = self.send(request, true).await?;
        let mut bytes = response.bytes_stream();
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut parser = SseParser::new();
            let mut finish: Option<FinishReason> = None;
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };
                for sse in parser.feed(&chunk) {
                    if sse.data.trim() == "[DONE]" {
                        let _ = tx.send(Ok(StreamEvent::Done(finish))).await;
                        return;
                    }
                    match serde_json::from_str::<JsonValue>(&sse.data) {
                        Ok(payload) => {
                            if let Some(reason) = payload["choices"][0]["finish_reason"].as_str()
                            {
                                finish = parse_finish_reason(reason);
                            }
                            for event in parse_delta(&payload) {
                                if tx.send(Ok(event)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "skipping malformed stream chunk");
                        }
                    }
                }
            }
            // the server closed without [DONE]; surface what we know
            let _ = tx.send(Ok(StreamEvent::Done(finish))).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

fn wire_message(message: &Message) -> JsonValue {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    if !message.is_multipart() {
        return json!({"role": role, "content": message.text_content()});
    }
    let parts: Vec<JsonValue> = message
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { text } => json!({"type": "text", "text": text}),
            Segment::Image { source, .. } => json!({
                "type": "image_url",
                "image_url": {"url": source},
            }),
            Segment::Audio { data, media_type } => json!({
                "type": "input_audio",
                "input_audio": {"data": data, "format": media_type},
            }),
        })
        .collect();
    json!({"role": role, "content": parts})
}

fn parse_completion(payload: JsonValue) -> Result<RawCompletion, ProviderError> {
    let message = payload["choices"][0]
        .get("message")
        .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".to_string()))?;

    let text = message["content"].as_str().unwrap_or_default().to_string();
    let mut tool_calls = Vec::new();
    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            let name = call["function"]["name"].as_str().unwrap_or_default();
            let arguments = call["function"]["arguments"].as_str().unwrap_or_default();
            let mut parsed = ToolCall::new(name, arguments);
            if let Some(id) = call["id"].as_str() {
                parsed = parsed.with_id(id);
            }
            tool_calls.push(parsed);
        }
    }

    let finish_reason = payload["choices"][0]["finish_reason"]
        .as_str()
        .and_then(parse_finish_reason);

    Ok(RawCompletion {
        text,
        tool_calls,
        finish_reason,
        raw: payload,
    })
}

fn parse_delta(payload: &JsonValue) -> Vec<StreamEvent> {
    let delta = &payload["choices"][0]["delta"];
    let mut events = Vec::new();
    if let Some(text) = delta["content"].as_str() {
        if !text.is_empty() {
            events.push(StreamEvent::TextDelta(text.to_string()));
        }
    }
    if let Some(calls) = delta["tool_calls"].as_array() {
        for call in calls {
            let name = call["function"]["name"].as_str().map(str::to_string);
            let arguments = call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            if name.is_some() || !arguments.is_empty() {
                events.push(StreamEvent::ToolCallDelta { name, arguments });
            }
        }
    }
    events
}

fn parse_finish_reason(reason: &str) -> Option<FinishReason> {
    match reason {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" => Some(FinishReason::ToolCall),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}
