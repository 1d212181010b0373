// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured mining (scanner) metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn mining_metrics() -> &'static dyn MiningMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured Stratum server metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn stratum_metrics() -> &'static dyn StratumMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured share submitter metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn submitter_metrics() -> &'static dyn SubmitterMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured P2P admission metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn p2p_metrics() -> &'static dyn P2pMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics related to the device-abstracted mining scanner
/// (`spec.md` §4.7–§4.9).
pub trait MiningMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the total number of hashes scanned, labeled by device kind (`cpu`/`cuda`).
    fn inc_hashes_scanned(&self, device: &str, count: u64);
    /// Increments the total number of shares found locally, before submission.
    fn inc_shares_found(&self);
    /// Sets the gauge for the current scan rate in hashes/sec, labeled by device kind.
    fn set_scan_rate_hashes_per_sec(&self, device: &str, rate: f64);
    /// Sets the gauge for the best (lowest) `d_ratio` observed in the current job.
    fn set_best_d_ratio(&self, d_ratio: f64);
}
impl MiningMetricsSink for NopSink {
    fn inc_hashes_scanned(&self, _device: &str, _count: u64) {}
    fn inc_shares_found(&self) {}
    fn set_scan_rate_hashes_per_sec(&self, _device: &str, _rate: f64) {}
    fn set_best_d_ratio(&self, _d_ratio: f64) {}
}

/// A sink for metrics related to the dual-dialect Stratum server (`spec.md` §4.10).
pub trait StratumMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the gauge for connected sessions, labeled by dialect (`animica`/`classic`).
    fn inc_connected_sessions(&self, dialect: &str);
    /// Decrements the gauge for connected sessions, labeled by dialect.
    fn dec_connected_sessions(&self, dialect: &str);
    /// Increments a counter for job templates published to sessions.
    fn inc_jobs_published(&self);
    /// Increments a counter for shares accepted at the Stratum layer (pre-submission).
    fn inc_shares_accepted(&self);
    /// Increments a counter for shares rejected at the Stratum layer, labeled by reason.
    fn inc_shares_rejected(&self, reason: &str);
    /// Increments a counter for shares rejected as stale (referencing an expired job id).
    fn inc_shares_stale(&self);
}
impl StratumMetricsSink for NopSink {
    fn inc_connected_sessions(&self, _dialect: &str) {}
    fn dec_connected_sessions(&self, _dialect: &str) {}
    fn inc_jobs_published(&self) {}
    fn inc_shares_accepted(&self) {}
    fn inc_shares_rejected(&self, _reason: &str) {}
    fn inc_shares_stale(&self) {}
}

/// A sink for metrics related to the share submitter's batching and retry
/// behavior (`spec.md` §4.11).
pub trait SubmitterMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for shares handed to the submitter.
    fn inc_shares_submitted(&self);
    /// Increments a counter for shares the remote endpoint accepted.
    fn inc_shares_accepted(&self);
    /// Increments a counter for shares the remote endpoint rejected, labeled by reason.
    fn inc_shares_rejected(&self, reason: &str);
    /// Observes the latency of a submit round-trip, labeled by transport (`rpc`/`batch`).
    fn observe_submit_latency(&self, transport: &str, duration_secs: f64);
    /// Increments a counter each time batch submission is permanently disabled
    /// after a `METHOD_NOT_FOUND` response, falling back to single-share submission.
    fn inc_batch_fallback_triggered(&self);
}
impl SubmitterMetricsSink for NopSink {
    fn inc_shares_submitted(&self) {}
    fn inc_shares_accepted(&self) {}
    fn inc_shares_rejected(&self, _reason: &str) {}
    fn observe_submit_latency(&self, _transport: &str, _duration_secs: f64) {}
    fn inc_batch_fallback_triggered(&self) {}
}

/// A sink for metrics related to P2P gossip admission (`spec.md` §4.12–§4.13).
pub trait P2pMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for envelopes rejected at admission, labeled by
    /// the stable rejection reason (`oversize`, `decode-failed`, ...).
    fn inc_envelopes_rejected(&self, reason: &str);
    /// Increments a counter for envelopes that passed admission pre-checks.
    fn inc_envelopes_accepted(&self);
    /// Sets the gauge for the current number of connected peers.
    fn set_connected_peers(&self, count: f64);
}
impl P2pMetricsSink for NopSink {
    fn inc_envelopes_rejected(&self, _reason: &str) {}
    fn inc_envelopes_accepted(&self) {}
    fn set_connected_peers(&self, _count: f64) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink:
    MiningMetricsSink + StratumMetricsSink + SubmitterMetricsSink + P2pMetricsSink + ErrorMetricsSink
{
}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where
    T: MiningMetricsSink
        + StratumMetricsSink
        + SubmitterMetricsSink
        + P2pMetricsSink
        + ErrorMetricsSink
{
}
