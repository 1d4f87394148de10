//! The reask controller.
//!
//! Drives the attempt loop: shape a request, call the provider, evaluate
//! the completion, and on failure resubmit with a corrective follow-up
//! until a valid instance emerges or the retry budget runs out.

use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use strux_core::{Conversation, Message, RawCompletion};
use strux_modes::ModeAdapter;
use strux_providers::Provider;
use strux_schema::{validate, FieldError, SchemaDescriptor, ValidationContext, ValidationOutcome};

use crate::attempt::AttemptRecord;
use crate::backoff::Backoff;
use crate::error::ExtractError;
use crate::metrics::ExtractionMetrics;

/// Retry budget and pacing for one extraction.
#[derive(Debug, Clone)]
pub struct ReaskConfig {
    /// Corrective resubmissions allowed after the first attempt. Zero
    /// disables the loop entirely.
    pub max_retries: u32,
    /// Delay policy applied before each resubmission.
    pub backoff: Backoff,
}

impl Default for ReaskConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::none(),
        }
    }
}

/// A successful extraction, with the failures that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaskSuccess {
    /// The validated, coerced instance.
    pub instance: JsonValue,
    /// Failed attempts before the one that succeeded.
    pub attempts: Vec<AttemptRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Sent,
    Evaluated,
    AwaitingRetry,
}

/// Build the corrective follow-up: the model's previous output echoed as an
/// assistant message, then a user message enumerating the errors verbatim.
#[must_use]
pub fn corrective_followup(
    conversation: &Conversation,
    completion: &RawCompletion,
    errors: &[FieldError],
) -> Conversation {
    let mut next = conversation.snapshot();
    next.push(Message::assistant(completion.echo_text()));

    let mut body = format!(
        "The response did not satisfy the required format. {} error(s):\n",
        errors.len()
    );
    for error in errors {
        body.push_str("- ");
        body.push_str(&error.to_string());
        body.push('\n');
    }
    body.push_str("Correct these errors and answer again in the same format.");
    next.push(Message::user(body));
    next
}

/// The attempt loop for one extraction.
pub struct ReaskController<'a> {
    adapter: &'a dyn ModeAdapter,
    provider: &'a dyn Provider,
    schema: &'a SchemaDescriptor,
    context: &'a ValidationContext,
    config: &'a ReaskConfig,
    cancel: CancellationToken,
    metrics: ExtractionMetrics,
}

impl<'a> ReaskController<'a> {
    /// Create a controller.
    #[must_use]
    pub fn new(
        adapter: &'a dyn ModeAdapter,
        provider: &'a dyn Provider,
        schema: &'a SchemaDescriptor,
        context: &'a ValidationContext,
        config: &'a ReaskConfig,
    ) -> Self {
        Self {
            adapter,
            provider,
            schema,
            context,
            config,
            cancel: CancellationToken::new(),
            metrics: ExtractionMetrics::new(),
        }
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

    /// Evaluate one completion: locate the candidate, decode it strictly,
    /// validate. Adapter and decode failures collapse to a single
    /// root-level error so every failure has the same shape.
    pub fn evaluate(&self, completion: &RawCompletion) -> Result<JsonValue, Vec<FieldError>> {
        let candidate = match self.adapter.extract_candidate(completion) {
            Ok(candidate) => candidate,
            Err(e) => return Err(vec![FieldError::new("", e.to_string())]),
        };
        let decoded = match strux_decode::decode_strict(candidate.as_str()) {
            Ok(decoded) => decoded,
            Err(e) => return Err(vec![FieldError::new("", e.to_string())]),
        };
        match validate(&decoded, self.schema, self.context) {
            ValidationOutcome::Valid(instance) => Ok(instance),
            ValidationOutcome::Invalid(errors) => Err(errors),
        }
    }

    /// Run the full loop from a fresh conversation.
    pub async fn run(&self, conversation: &Conversation) -> Result<ReaskSuccess, ExtractError> {
        self.run_from(conversation.snapshot(), Vec::new()).await
    }

    /// Continue the loop after earlier failures.
    ///
    /// `conversation` must already carry the corrective follow-up for the
    /// last recorded attempt. Used by the streaming path to fold its failed
    /// first attempt into the same budget.
    pub async fn run_from(
        &self,
        mut conversation: Conversation,
        mut attempts: Vec<AttemptRecord>,
    ) -> Result<ReaskSuccess, ExtractError> {
        let mut phase = Phase::Init;
        let mut index = attempts.len() as u32;
        debug!(?phase, max_retries = self.config.max_retries, "reask loop starting");

        while index <= self.config.max_retries {
            if self.cancel.is_cancelled() {
                self.metrics.cancelled();
                return Err(ExtractError::Cancelled { attempts });
            }

            // pacing applies to resubmissions, never to the first attempt
            if index > 0 {
                phase = Phase::AwaitingRetry;
                let delay = self.config.backoff.delay_for(index - 1);
                debug!(?phase, attempt = index, delay_ms = delay.as_millis() as u64, "pausing before resubmission");
                if !delay.is_zero() {
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            self.metrics.cancelled();
                            return Err(ExtractError::Cancelled { attempts });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }

            let request = self.adapter.shape_request(&conversation, self.schema);
            self.metrics.attempt_started();
            phase = Phase::Sent;
            debug!(?phase, attempt = index, provider = %self.provider.name(), "attempt sent");

            let completion = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.metrics.cancelled();
                    return Err(ExtractError::Cancelled { attempts });
                }
                result = self.provider.complete(&request) => match result {
                    Ok(completion) => completion,
                    Err(e) => {
                        self.metrics.transport_error();
                        return Err(ExtractError::Transport {
                            source: e,
                            attempts,
                        });
                    }
                },
            };

            phase = Phase::Evaluated;
            match self.evaluate(&completion) {
                Ok(instance) => {
                    self.metrics.succeeded();
                    info!(?phase, attempt = index, "extraction succeeded");
                    return Ok(ReaskSuccess { instance, attempts });
                }
                Err(errors) => {
                    self.metrics.attempt_failed();
                    warn!(
                        ?phase,
                        attempt = index,
                        error_count = errors.len(),
                        "attempt failed validation"
                    );
                    let next = corrective_followup(&conversation, &completion, &errors);
                    attempts.push(AttemptRecord::new(index, conversation, completion, errors));
                    conversation = next;
                }
            }
            index += 1;
        }

        self.metrics.exhausted();
        warn!(attempts = attempts.len(), "retries exhausted");
        Err(ExtractError::Exhausted(attempts))
    }
}
