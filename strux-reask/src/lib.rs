//! # strux-reask
//!
//! The validation-driven retry loop.
//!
//! When a completion fails extraction, the [`ReaskController`] sends the
//! model a corrective follow-up: its own previous output plus the
//! validation errors, verbatim. `max_retries` bounds the corrective
//! resubmissions, so an extraction makes at most `max_retries + 1` provider
//! calls. Every failed attempt is recorded in an [`AttemptRecord`], and the
//! full history rides along on every failure, exhaustion or otherwise.
//!
//! Transport errors and cancellation are not model mistakes: they propagate
//! immediately and never consume a retry, carrying the attempts recorded
//! before the interruption.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod attempt;
pub mod backoff;
pub mod controller;
pub mod error;
pub mod metrics;

pub use attempt::AttemptRecord;
pub use backoff::Backoff;
pub use controller::{corrective_followup, ReaskConfig, ReaskController, ReaskSuccess};
pub use error::ExtractError;
pub use metrics::{ExtractionMetrics, MetricsSnapshot};
