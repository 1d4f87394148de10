//! The extraction session facade.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use strux_core::Conversation;
use strux_modes::{Mode, ModeAdapter};
use strux_providers::Provider;
use strux_reask::{
    AttemptRecord, Backoff, ExtractError, ExtractionMetrics, ReaskConfig, ReaskController,
};
use strux_schema::{FieldError, SchemaDescriptor, ValidationContext};
use strux_stream::{MaterializedStream, StreamMaterializer};

/// A successful extraction: the validated instance plus the failed attempts
/// that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The coerced, schema-exact instance.
    pub instance: JsonValue,
    /// Failed attempts before the one that succeeded.
    pub attempts: Vec<AttemptRecord>,
}

impl Extraction {
    /// Deserialize the instance into a concrete type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.instance.clone())
    }
}

/// An extraction session: one provider, one schema, one mode.
///
/// Sessions are cheap to clone and safe to use from many tasks; the
/// conversation travels with each call, not with the session.
#[derive(Clone)]
pub struct Extractor {
    adapter: Arc<dyn ModeAdapter>,
    provider: Arc<dyn Provider>,
    schema: Arc<SchemaDescriptor>,
    context: Arc<ValidationContext>,
    reask: ReaskConfig,
    queue_capacity: Option<usize>,
    cancel: CancellationToken,
    metrics: ExtractionMetrics,
}

impl Extractor {
    /// Create a session in the default tool-call mode.
    #[must_use]
    pub fn new(provider: impl Provider + 'static, schema: SchemaDescriptor) -> Self {
        Self {
            adapter: Mode::default().adapter().into(),
            provider: Arc::new(provider),
            schema: Arc::new(schema),
            context: Arc::new(ValidationContext::empty()),
            reask: ReaskConfig::default(),
            queue_capacity: None,
            cancel: CancellationToken::new(),
            metrics: ExtractionMetrics::new(),
        }
    }

    /// Select the structured-output mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.adapter = mode.adapter().into();
        self
    }

    /// Supply read-only context data for validation rules.
    #[must_use]
    pub fn with_context(mut self, context: ValidationContext) -> Self {
        self.context = Arc::new(context);
        self
    }

    /// Bound the corrective resubmissions. Zero disables the reask loop.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.reask.max_retries = max_retries;
        self
    }

    /// Set the delay policy applied before each resubmission.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.reask.backoff = backoff;
        self
    }

    /// Bound the streaming update queue.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Attach a cancellation token observed by every call on this session.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Attach a shared metrics registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: ExtractionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The session's metrics registry.
    #[must_use]
    pub fn metrics(&self) -> &ExtractionMetrics {
        &self.metrics
    }

    /// Extract a validated instance from one conversation.
    pub async fn extract(&self, conversation: &Conversation) -> Result<Extraction, ExtractError> {
        debug!(schema = %self.schema.name, mode = %self.adapter.mode(), "extract");
        let controller = ReaskController::new(
            self.adapter.as_ref(),
            self.provider.as_ref(),
            &self.schema,
            &self.context,
            &self.reask,
        )
        .with_cancellation(self.cancel.clone())
        .with_metrics(self.metrics.clone());

        let success = controller.run(conversation).await?;
        Ok(Extraction {
            instance: success.instance,
            attempts: success.attempts,
        })
    }

    /// Extract and deserialize into a concrete type.
    ///
    /// A validated instance that still fails to fit `T` reports where the
    /// schema and the type disagree.
    pub async fn extract_as<T: DeserializeOwned>(
        &self,
        conversation: &Conversation,
    ) -> Result<T, ExtractError> {
        let extraction = self.extract(conversation).await?;
        extraction.deserialize().map_err(|e| {
            ExtractError::FieldValidation(vec![FieldError::new(
                "",
                format!("validated instance does not fit the target type: {e}"),
            )])
        })
    }

    /// Extract with live progress updates.
    ///
    /// The returned stream ends with exactly one terminal update or error.
    #[must_use]
    pub fn extract_stream(&self, conversation: &Conversation) -> MaterializedStream {
        debug!(schema = %self.schema.name, mode = %self.adapter.mode(), "extract_stream");
        let mut materializer = StreamMaterializer::new(
            self.adapter.clone(),
            self.provider.clone(),
            self.schema.clone(),
            self.context.clone(),
        )
        .with_reask(self.reask.clone())
        .with_cancellation(self.cancel.clone())
        .with_metrics(self.metrics.clone());
        if let Some(capacity) = self.queue_capacity {
            materializer = materializer.with_queue_capacity(capacity);
        }
        materializer.run(conversation.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use strux_providers::ScriptedProvider;
    use strux_schema::FieldSpec;

    fn person() -> SchemaDescriptor {
        SchemaDescriptor::object("Person")
            .field("name", FieldSpec::string())
            .field("age", FieldSpec::integer())
            .build()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: i64,
    }

    #[tokio::test]
    async fn test_extract_as_concrete_type() {
        let provider =
            ScriptedProvider::new().then_tool_call("person", r#"{"name": "Ada", "age": "36"}"#);
        let extractor = Extractor::new(provider, person());

        let person: Person = extractor
            .extract_as(&Conversation::from_user("Ada is 36"))
            .await
            .unwrap();
        assert_eq!(
            person,
            Person {
                name: "Ada".to_string(),
                age: 36
            }
        );
    }

    #[tokio::test]
    async fn test_session_is_reusable() {
        let provider = ScriptedProvider::new()
            .then_tool_call("person", r#"{"name": "Ada", "age": 36}"#)
            .then_tool_call("person", r#"{"name": "Grace", "age": 45}"#);
        let extractor = Extractor::new(provider, person());

        let first = extractor
            .extract(&Conversation::from_user("Ada is 36"))
            .await
            .unwrap();
        let second = extractor
            .extract(&Conversation::from_user("Grace is 45"))
            .await
            .unwrap();
        assert_eq!(first.instance["name"], "Ada");
        assert_eq!(second.instance["name"], "Grace");
        assert_eq!(extractor.metrics().snapshot().succeeded, 2);
    }
}
