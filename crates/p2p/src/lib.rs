// Path: crates/p2p/src/lib.rs
//! P2P gossip admission pre-checks, the consensus view, and the
//! verifier-kind registry for Animica (`spec.md` §4.12–§4.14, components K
//! and L). Nothing here owns a transport: callers decode bytes off their
//! own gossip channel and hand them to `adapters`/`consensus_view` for a
//! cheap accept/reject verdict before paying for full validation.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

/// Fast-path decode/sanity checks and the liberal proof-envelope pre-parse
/// (component K).
pub mod adapters;
/// Cheap sync-time consensus checks: chain id, policy roots, Θ step bound,
/// timestamp monotonicity (component K, `spec.md` §4.13).
pub mod consensus_view;
/// The verifier-kind registry dispatching proof kind names to full
/// verification callables (component L).
pub mod registry;

pub use adapters::{
    decode_envelope_liberal, decode_header, decode_tx, sanity_block, sanity_header, sanity_tx,
    summarize_and_dedupe, EnvelopeSummary, RejectReason, SeenSet,
};
pub use consensus_view::ConsensusView;
pub use registry::{RegistryError, VerifierRegistry};
