//! The extraction error type.

use thiserror::Error;

use strux_providers::ProviderError;
use strux_schema::FieldError;

use crate::attempt::AttemptRecord;

/// Why an extraction failed.
///
/// Failures that end the attempt loop carry the ordered attempt history
/// recorded up to that point, so the audit trail survives however the loop
/// ends.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The decoded value violated the schema.
    #[error("validation failed with {count} error(s)", count = .0.len())]
    FieldValidation(Vec<FieldError>),

    /// Every attempt failed; the full audit trail is attached.
    #[error("retries exhausted after {count} attempt(s)", count = .0.len())]
    Exhausted(Vec<AttemptRecord>),

    /// The caller cancelled the extraction.
    #[error("extraction cancelled")]
    Cancelled {
        /// Failed attempts recorded before the cancellation.
        attempts: Vec<AttemptRecord>,
    },

    /// The provider could not be reached or answered unintelligibly.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport fault.
        source: ProviderError,
        /// Failed attempts recorded before the fault.
        attempts: Vec<AttemptRecord>,
    },
}

impl ExtractError {
    /// The ordered attempt history recorded before the failure.
    #[must_use]
    pub fn attempts(&self) -> Option<&[AttemptRecord]> {
        match self {
            Self::Exhausted(attempts)
            | Self::Cancelled { attempts }
            | Self::Transport { attempts, .. } => Some(attempts),
            Self::FieldValidation(_) => None,
        }
    }
}
