// Path: crates/types/src/lib.rs
//! Core data structures and the crate-wide error taxonomy for Animica:
//! header/block assembly, opaque transactions and receipts, PoIES proof
//! envelopes, share receipts and their per-block aggregator, genesis chain
//! parameters, and canonical state root computation.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod block;
pub mod chain_params;
pub mod error;
pub mod header;
pub mod proof;
pub mod receipt;
pub mod share_receipt;
pub mod tx;

/// Canonical key/value state root (component D), re-exported from
/// `animica-codec` where the tree's domain-separated hashing lives alongside
/// the rest of this workspace's consensus-observable primitives.
pub use animica_codec::state_root;

pub use block::Block;
pub use chain_params::ChainParams;
pub use error::{AnimicaError, ConsensusError, CryptoError, ErrorCode, MiningError, Result, TransportError, ValidationError};
pub use header::Header;
pub use proof::{AIProofRef, HashShare, ProofEnvelope, ProofType, QuantumProofRef, StorageHeartbeat, VDFProofRef};
pub use receipt::Receipt;
pub use share_receipt::{AggregationStats, ShareAggregator, ShareReceipt};
pub use tx::Tx;
