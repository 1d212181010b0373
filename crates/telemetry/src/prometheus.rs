// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_counter_vec, Gauge, GaugeVec, HistogramVec, IntCounterVec,
};

// --- Metric Statics ---
// We use OnceCell to hold the metric collectors. They will be initialized
// exactly once by the `install` function.

static MINING_HASHES_SCANNED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static MINING_SHARES_FOUND_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static MINING_SCAN_RATE_HASHES_PER_SEC: OnceCell<GaugeVec> = OnceCell::new();
static MINING_BEST_D_RATIO: OnceCell<Gauge> = OnceCell::new();

static STRATUM_CONNECTED_SESSIONS: OnceCell<GaugeVec> = OnceCell::new();
static STRATUM_JOBS_PUBLISHED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static STRATUM_SHARES_ACCEPTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static STRATUM_SHARES_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static STRATUM_SHARES_STALE_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

static SUBMITTER_SHARES_SUBMITTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SUBMITTER_SHARES_ACCEPTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SUBMITTER_SHARES_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SUBMITTER_SUBMIT_LATENCY_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static SUBMITTER_BATCH_FALLBACK_TRIGGERED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

static P2P_ENVELOPES_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static P2P_ENVELOPES_ACCEPTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static P2P_CONNECTED_PEERS: OnceCell<Gauge> = OnceCell::new();

static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Helper macro to reduce boilerplate for getting a metric from OnceCell.
/// This will panic if `install()` has not been called, which is intentional
/// as it indicates a critical application setup error.
macro_rules! get_metric {
    ($metric:ident) => {
        $metric
            .get()
            .expect("Prometheus sink not initialized. Call telemetry::prometheus::install() first.")
    };
}

impl MiningMetricsSink for PrometheusSink {
    fn inc_hashes_scanned(&self, device: &str, count: u64) {
        get_metric!(MINING_HASHES_SCANNED_TOTAL)
            .with_label_values(&[device])
            .inc_by(count);
    }
    fn inc_shares_found(&self) {
        get_metric!(MINING_SHARES_FOUND_TOTAL)
            .with_label_values(&[])
            .inc();
    }
    fn set_scan_rate_hashes_per_sec(&self, device: &str, rate: f64) {
        get_metric!(MINING_SCAN_RATE_HASHES_PER_SEC)
            .with_label_values(&[device])
            .set(rate);
    }
    fn set_best_d_ratio(&self, d_ratio: f64) {
        get_metric!(MINING_BEST_D_RATIO).set(d_ratio);
    }
}

impl StratumMetricsSink for PrometheusSink {
    fn inc_connected_sessions(&self, dialect: &str) {
        get_metric!(STRATUM_CONNECTED_SESSIONS)
            .with_label_values(&[dialect])
            .inc();
    }
    fn dec_connected_sessions(&self, dialect: &str) {
        get_metric!(STRATUM_CONNECTED_SESSIONS)
            .with_label_values(&[dialect])
            .dec();
    }
    fn inc_jobs_published(&self) {
        get_metric!(STRATUM_JOBS_PUBLISHED_TOTAL)
            .with_label_values(&[])
            .inc();
    }
    fn inc_shares_accepted(&self) {
        get_metric!(STRATUM_SHARES_ACCEPTED_TOTAL)
            .with_label_values(&[])
            .inc();
    }
    fn inc_shares_rejected(&self, reason: &str) {
        get_metric!(STRATUM_SHARES_REJECTED_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
    fn inc_shares_stale(&self) {
        get_metric!(STRATUM_SHARES_STALE_TOTAL)
            .with_label_values(&[])
            .inc();
    }
}

impl SubmitterMetricsSink for PrometheusSink {
    fn inc_shares_submitted(&self) {
        get_metric!(SUBMITTER_SHARES_SUBMITTED_TOTAL)
            .with_label_values(&[])
            .inc();
    }
    fn inc_shares_accepted(&self) {
        get_metric!(SUBMITTER_SHARES_ACCEPTED_TOTAL)
            .with_label_values(&[])
            .inc();
    }
    fn inc_shares_rejected(&self, reason: &str) {
        get_metric!(SUBMITTER_SHARES_REJECTED_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
    fn observe_submit_latency(&self, transport: &str, duration_secs: f64) {
        get_metric!(SUBMITTER_SUBMIT_LATENCY_SECONDS)
            .with_label_values(&[transport])
            .observe(duration_secs);
    }
    fn inc_batch_fallback_triggered(&self) {
        get_metric!(SUBMITTER_BATCH_FALLBACK_TRIGGERED_TOTAL)
            .with_label_values(&[])
            .inc();
    }
}

impl P2pMetricsSink for PrometheusSink {
    fn inc_envelopes_rejected(&self, reason: &str) {
        get_metric!(P2P_ENVELOPES_REJECTED_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
    fn inc_envelopes_accepted(&self) {
        get_metric!(P2P_ENVELOPES_ACCEPTED_TOTAL)
            .with_label_values(&[])
            .inc();
    }
    fn set_connected_peers(&self, count: f64) {
        get_metric!(P2P_CONNECTED_PEERS).set(count);
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        get_metric!(ERRORS_TOTAL)
            .with_label_values(&[kind, variant])
            .inc();
    }
}

/// Initializes all Prometheus metrics collectors and returns a static reference to the sink.
/// This function must be called only once at application startup.
#[allow(clippy::expect_used)]
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    MINING_HASHES_SCANNED_TOTAL
        .set(register_int_counter_vec!(
            "animica_mining_hashes_scanned_total",
            "Total hashes scanned by the device-abstracted scanner.",
            &["device"]
        )?)
        .expect("static already initialized");
    MINING_SHARES_FOUND_TOTAL
        .set(register_int_counter_vec!(
            "animica_mining_shares_found_total",
            "Total shares found locally by the scanner, before submission.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    MINING_SCAN_RATE_HASHES_PER_SEC
        .set(register_gauge_vec!(
            "animica_mining_scan_rate_hashes_per_second",
            "Current scan rate in hashes/sec.",
            &["device"]
        )?)
        .expect("static already initialized");
    MINING_BEST_D_RATIO
        .set(register_gauge!(
            "animica_mining_best_d_ratio",
            "Best (lowest) d_ratio observed in the current job."
        )?)
        .expect("static already initialized");
    STRATUM_CONNECTED_SESSIONS
        .set(register_gauge_vec!(
            "animica_stratum_connected_sessions",
            "Current number of connected Stratum sessions.",
            &["dialect"]
        )?)
        .expect("static already initialized");
    STRATUM_JOBS_PUBLISHED_TOTAL
        .set(register_int_counter_vec!(
            "animica_stratum_jobs_published_total",
            "Total job templates published to Stratum sessions.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    STRATUM_SHARES_ACCEPTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_stratum_shares_accepted_total",
            "Total shares accepted at the Stratum layer.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    STRATUM_SHARES_REJECTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_stratum_shares_rejected_total",
            "Total shares rejected at the Stratum layer, by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");
    STRATUM_SHARES_STALE_TOTAL
        .set(register_int_counter_vec!(
            "animica_stratum_shares_stale_total",
            "Total shares rejected as stale (expired job id).",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    SUBMITTER_SHARES_SUBMITTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_submitter_shares_submitted_total",
            "Total shares handed to the submitter.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    SUBMITTER_SHARES_ACCEPTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_submitter_shares_accepted_total",
            "Total shares the remote endpoint accepted.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    SUBMITTER_SHARES_REJECTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_submitter_shares_rejected_total",
            "Total shares the remote endpoint rejected, by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");
    SUBMITTER_SUBMIT_LATENCY_SECONDS
        .set(register_histogram_vec!(
            "animica_submitter_submit_latency_seconds",
            "Latency of a submit round-trip.",
            &["transport"],
            exponential_buckets(0.001, 2.0, 15)?
        )?)
        .expect("static already initialized");
    SUBMITTER_BATCH_FALLBACK_TRIGGERED_TOTAL
        .set(register_int_counter_vec!(
            "animica_submitter_batch_fallback_triggered_total",
            "Total times batch submission was permanently disabled after METHOD_NOT_FOUND.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    P2P_ENVELOPES_REJECTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_p2p_envelopes_rejected_total",
            "Total gossip envelopes rejected at admission, by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");
    P2P_ENVELOPES_ACCEPTED_TOTAL
        .set(register_int_counter_vec!(
            "animica_p2p_envelopes_accepted_total",
            "Total gossip envelopes that passed admission pre-checks.",
            &[] as &[&str]
        )?)
        .expect("static already initialized");
    P2P_CONNECTED_PEERS
        .set(register_gauge!(
            "animica_p2p_connected_peers",
            "Current number of connected peers."
        )?)
        .expect("static already initialized");
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "animica_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?)
        .expect("static already initialized");

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
