// Path: crates/codec/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! Canonical encoding, domain-separated hashing, and Merkle primitives.
//!
//! Everything the rest of the workspace treats as consensus-observable
//! bottoms out in this crate: canonical CBOR/JSON, SHA3-256/512, the list
//! and key/value Merkle trees, the state-root tree, bech32m addresses, hex,
//! and the LEB128 length-prefix framing used by the PQ sign-bytes preimage.

/// Bech32m (BIP-350) address encoding.
pub mod bech32m;
/// Canonical CBOR encoding over a restricted value model.
pub mod cbor;
/// Fixed-size digest containers.
pub mod digest;
/// Error taxonomy for this crate.
pub mod error;
/// Domain-separated SHA3 hashing and the list/KV Merkle tree.
pub mod hash;
/// Canonical JSON encoding.
pub mod json;
/// Canonical key/value state root (distinct empty-root/domain convention from `hash`).
pub mod state_root;
/// LEB128 unsigned varints and length-prefix framing.
pub mod varint;

pub use digest::{Digest32, Digest64};
pub use error::{CodecError, ErrorCode, Result};
