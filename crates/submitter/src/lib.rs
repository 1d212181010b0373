// Path: crates/submitter/src/lib.rs
//! Share and block submitter: a `reqwest`-based JSON-RPC client with
//! batching, retry/backoff, and a background queue consumer (`spec.md`
//! §4.11, component J).
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

/// Backoff schedule for retrying transient submission errors.
pub mod backoff;
/// JSON-RPC client implementing [`animica_api::Submitter`].
pub mod client;
/// Background queue consumer feeding shares into the client.
pub mod consumer;
/// Atomic accepted/rejected/error counters.
pub mod stats;

pub use backoff::BackoffPolicy;
pub use client::{SubmitterClient, SubmitterConfig};
pub use consumer::{run_consumer, ConsumerConfig};
pub use stats::{StatsSnapshot, SubmitterStats};
