// Path: crates/submitter/src/stats.rs
//! Lock-free accounting for submissions, so an operator or the orchestrator
//! can observe submitter health without touching the hot path (`spec.md`
//! §4.11: "background consumer ... atomic stats counters").

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// A snapshot of [`SubmitterStats`] at a point in time.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub errors: u64,
    pub last_error: Option<String>,
}

/// Atomic counters tracking submitter outcomes across its lifetime.
#[derive(Debug, Default)]
pub struct SubmitterStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    errors: AtomicU64,
    last_error: RwLock<Option<String>>,
}

impl SubmitterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut slot) = self.last_error.write() {
            *slot = Some(message.into());
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_error: self.last_error.read().ok().and_then(|g| g.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let stats = SubmitterStats::new();
        stats.record_accepted();
        stats.record_accepted();
        stats.record_rejected();
        stats.record_error("boom");

        let snap = stats.snapshot();
        assert_eq!(snap.accepted, 2);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.last_error.as_deref(), Some("boom"));
    }
}
