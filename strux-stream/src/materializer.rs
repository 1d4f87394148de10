//! The stream materializer.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use strux_core::{Conversation, StreamEvent};
use strux_decode::{decode_partial, PartialValue, PathSeg};
use strux_modes::{ModeAdapter, StreamAccum};
use strux_providers::Provider;
use strux_reask::{
    corrective_followup, AttemptRecord, ExtractError, ExtractionMetrics, ReaskConfig,
    ReaskController,
};
use strux_schema::{validate_spec, SchemaDescriptor, ValidationContext, ValidationOutcome};

const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// One progress update from a streamed extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// A new state of the in-progress object. Emitted only when the state
    /// actually changed.
    Snapshot(JsonValue),
    /// A validated element of a top-level collection, emitted once when it
    /// closes.
    Item {
        /// Position in the collection.
        index: usize,
        /// The coerced, validated element.
        value: JsonValue,
    },
    /// The terminal, strictly validated instance. Emitted exactly once.
    Final(JsonValue),
}

/// The update stream handed to the consumer.
pub type MaterializedStream = ReceiverStream<Result<StreamUpdate, ExtractError>>;

/// Drives one streamed extraction.
pub struct StreamMaterializer {
    adapter: Arc<dyn ModeAdapter>,
    provider: Arc<dyn Provider>,
    schema: Arc<SchemaDescriptor>,
    context: Arc<ValidationContext>,
    reask: ReaskConfig,
    queue_capacity: usize,
    cancel: CancellationToken,
    metrics: ExtractionMetrics,
}

impl StreamMaterializer {
    /// Create a materializer.
    #[must_use]
    pub fn new(
        adapter: Arc<dyn ModeAdapter>,
        provider: Arc<dyn Provider>,
        schema: Arc<SchemaDescriptor>,
        context: Arc<ValidationContext>,
    ) -> Self {
        Self {
            adapter,
            provider,
            schema,
            context,
            reask: ReaskConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cancel: CancellationToken::new(),
            metrics: ExtractionMetrics::new(),
        }
    }

    /// Set the retry budget and pacing for the terminal reask pathway.
    #[must_use]
    pub fn with_reask(mut self, config: ReaskConfig) -> Self {
        self.reask = config;
        self
    }

    /// Bound the update queue. A slow consumer then backpressures the
    /// provider read loop.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Attach a cancellation token.
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

    /// Start the extraction. Updates arrive on the returned stream; it ends
    /// after the terminal update or error.
    #[must_use]
    pub fn run(self, conversation: Conversation) -> MaterializedStream {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        tokio::spawn(async move {
            self.drive(conversation, tx).await;
        });
        ReceiverStream::new(rx)
    }

    async fn drive(self, conversation: Conversation, tx: mpsc::Sender<Result<StreamUpdate, ExtractError>>) {
        if self.cancel.is_cancelled() {
            self.metrics.cancelled();
            let _ = tx
                .send(Err(ExtractError::Cancelled {
                    attempts: Vec::new(),
                }))
                .await;
            return;
        }

        let request = self.adapter.shape_request(&conversation, &self.schema);
        self.metrics.attempt_started();

        let events = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.metrics.cancelled();
                let _ = tx
                    .send(Err(ExtractError::Cancelled {
                        attempts: Vec::new(),
                    }))
                    .await;
                return;
            }
            result = self.provider.stream(&request) => result,
        };
        let mut events = match events {
            Ok(events) => events,
            Err(e) => {
                self.metrics.transport_error();
                let _ = tx
                    .send(Err(ExtractError::Transport {
                        source: e,
                        attempts: Vec::new(),
                    }))
                    .await;
                return;
            }
        };

        let mut accum = StreamAccum::new();
        let mut progress = Progress::default();

        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.metrics.cancelled();
                    let _ = tx
                        .send(Err(ExtractError::Cancelled {
                            attempts: Vec::new(),
                        }))
                        .await;
                    return;
                }
                event = events.next() => event,
            };
            match event {
                // a provider that closes without Done has still finished
                None => break,
                Some(Err(e)) => {
                    self.metrics.transport_error();
                    let _ = tx
                        .send(Err(ExtractError::Transport {
                            source: e,
                            attempts: Vec::new(),
                        }))
                        .await;
                    return;
                }
                Some(Ok(event)) => {
                    let done = matches!(event, StreamEvent::Done(_));
                    accum.absorb(&event);
                    if self.emit_progress(&accum, &mut progress, &tx).await.is_err() {
                        return;
                    }
                    if done {
                        break;
                    }
                }
            }
        }

        // terminal: strict decode and full validation, reask on failure
        let completion = accum.into_completion();
        let controller = ReaskController::new(
            self.adapter.as_ref(),
            self.provider.as_ref(),
            &self.schema,
            &self.context,
            &self.reask,
        )
        .with_cancellation(self.cancel.clone())
        .with_metrics(self.metrics.clone());

        match controller.evaluate(&completion) {
            Ok(instance) => {
                self.metrics.succeeded();
                debug!("streamed extraction valid on first attempt");
                let _ = tx.send(Ok(StreamUpdate::Final(instance))).await;
            }
            Err(errors) => {
                self.metrics.attempt_failed();
                warn!(
                    error_count = errors.len(),
                    "streamed attempt failed terminal validation, entering reask"
                );
                let next = corrective_followup(&conversation, &completion, &errors);
                let attempts = vec![AttemptRecord::new(0, conversation, completion, errors)];
                match controller.run_from(next, attempts).await {
                    Ok(success) => {
                        let _ = tx.send(Ok(StreamUpdate::Final(success.instance))).await;
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                    }
                }
            }
        }
    }

    /// Emit whatever the accumulated buffer newly supports. Errors mean the
    /// consumer dropped the stream.
    async fn emit_progress(
        &self,
        accum: &StreamAccum,
        progress: &mut Progress,
        tx: &mpsc::Sender<Result<StreamUpdate, ExtractError>>,
    ) -> Result<(), ()> {
        let Some(candidate) = self.adapter.candidate_in(accum) else {
            return Ok(());
        };
        // repair failures mid-stream are expected while tokens arrive
        let Ok(partial) = decode_partial(&candidate) else {
            return Ok(());
        };

        if let Some(item_spec) = self.schema.item_spec() {
            let Some(closed) = partial.closed_elements() else {
                return Ok(());
            };
            let Some(items) = partial.value.as_array() else {
                return Ok(());
            };
            for index in progress.emitted_items..closed.min(items.len()) {
                match validate_spec(&items[index], item_spec, &self.context) {
                    ValidationOutcome::Valid(value) => {
                        tx.send(Ok(StreamUpdate::Item { index, value }))
                            .await
                            .map_err(|_| ())?;
                    }
                    ValidationOutcome::Invalid(errors) => {
                        // surfaces through terminal validation and reask
                        warn!(index, error_count = errors.len(), "skipping invalid element");
                    }
                }
            }
            progress.emitted_items = closed.min(items.len()).max(progress.emitted_items);
        } else {
            let snapshot = self.lenient_snapshot(&partial);
            if progress.last_snapshot.as_ref() != Some(&snapshot) {
                tx.send(Ok(StreamUpdate::Snapshot(snapshot.clone())))
                    .await
                    .map_err(|_| ())?;
                progress.last_snapshot = Some(snapshot);
            }
        }
        Ok(())
    }

    /// Best-effort view of a partial object: declared fields only, closed
    /// values coerced the way terminal validation will coerce them, still
    /// growing values passed through as they stand. Missing fields are not
    /// an error here.
    fn lenient_snapshot(&self, partial: &PartialValue) -> JsonValue {
        let Some(fields) = self.schema.fields() else {
            return partial.value.clone();
        };
        let Some(map) = partial.value.as_object() else {
            return partial.value.clone();
        };

        let mut out = JsonMap::new();
        for (name, spec) in fields {
            let Some(raw) = map.get(name) else {
                continue;
            };
            if partial.is_open(&[PathSeg::Key(name.clone())]) {
                out.insert(name.clone(), raw.clone());
                continue;
            }
            match validate_spec(raw, spec, &self.context) {
                ValidationOutcome::Valid(value) => out.insert(name.clone(), value),
                // invalid closed fields surface through terminal validation
                ValidationOutcome::Invalid(_) => out.insert(name.clone(), raw.clone()),
            };
        }
        JsonValue::Object(out)
    }
}

#[derive(Default)]
struct Progress {
    last_snapshot: Option<JsonValue>,
    emitted_items: usize,
}
