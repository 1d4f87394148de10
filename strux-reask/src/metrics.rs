//! Extraction counters.
//!
//! Counters are atomic and shared by clone, so one registry can observe
//! many concurrent extractions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared extraction counters.
#[derive(Debug, Clone, Default)]
pub struct ExtractionMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    attempts_started: AtomicU64,
    attempts_failed: AtomicU64,
    succeeded: AtomicU64,
    exhausted: AtomicU64,
    transport_errors: AtomicU64,
    cancelled: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Provider calls started.
    pub attempts_started: u64,
    /// Attempts that ended in an extraction failure.
    pub attempts_failed: u64,
    /// Extractions that produced a valid instance.
    pub succeeded: u64,
    /// Extractions that ran out of retries.
    pub exhausted: u64,
    /// Extractions aborted by a transport fault.
    pub transport_errors: u64,
    /// Extractions aborted by cancellation.
    pub cancelled: u64,
}

impl ExtractionMetrics {
    /// Create a zeroed registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a provider call starting.
    pub fn attempt_started(&self) {
        self.inner.attempts_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an attempt failing extraction.
    pub fn attempt_failed(&self) {
        self.inner.attempts_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an extraction succeeding.
    pub fn succeeded(&self) {
        self.inner.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an extraction running out of retries.
    pub fn exhausted(&self) {
        self.inner.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transport fault aborting an extraction.
    pub fn transport_error(&self) {
        self.inner.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cancellation.
    pub fn cancelled(&self) {
        self.inner.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts_started: self.inner.attempts_started.load(Ordering::Relaxed),
            attempts_failed: self.inner.attempts_failed.load(Ordering::Relaxed),
            succeeded: self.inner.succeeded.load(Ordering::Relaxed),
            exhausted: self.inner.exhausted.load(Ordering::Relaxed),
            transport_errors: self.inner.transport_errors.load(Ordering::Relaxed),
            cancelled: self.inner.cancelled.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_shared_between_clones() {
        let metrics = ExtractionMetrics::new();
        let other = metrics.clone();

        metrics.attempt_started();
        other.attempt_started();
        metrics.succeeded();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempts_started, 2);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.exhausted, 0);
    }
}
