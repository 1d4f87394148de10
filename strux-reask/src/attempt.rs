//! The attempt audit trail.

use strux_core::{Conversation, RawCompletion};
use strux_schema::FieldError;

/// A record of one failed extraction attempt.
///
/// Adapter and decode failures are recorded as a single root-level error so
/// a caller reading the trail sees every attempt in the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// 0-based attempt number.
    pub index: u32,
    /// The conversation exactly as submitted for this attempt.
    pub conversation: Conversation,
    /// What the provider returned.
    pub completion: RawCompletion,
    /// Why the attempt failed, in traversal order.
    pub errors: Vec<FieldError>,
}

impl AttemptRecord {
    /// Create a record.
    #[must_use]
    pub fn new(
        index: u32,
        conversation: Conversation,
        completion: RawCompletion,
        errors: Vec<FieldError>,
    ) -> Self {
        Self {
            index,
            conversation,
            completion,
            errors,
        }
    }
}
