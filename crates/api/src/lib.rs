// Path: crates/api/src/lib.rs
//! Narrow trait interfaces shared across the mining, Stratum, submitter, and
//! p2p crates (`spec.md` §9 "duck-typed orchestrator collaborators" →
//! narrow traits/interfaces with 1–3 methods each). Nothing here has an
//! opinion about transport, storage, or concurrency strategy; each
//! implementing crate owns those.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

/// Mining pipeline data types and the `TemplateProvider`/`ShareValidator`/
/// `Submitter` traits (components G–J).
pub mod mining;
/// The proof-verifier-kind dispatch function type (component L).
pub mod verifier;

pub use mining::{
    BlockCandidate, FoundShare, MiningJob, ShareSubmission, ShareValidator, SubmitOutcome,
    Submitter, TemplateProvider, TemplateRequest,
};
pub use verifier::VerifyFn;
