// Path: crates/types/src/receipt.rs
//! Opaque execution receipt, the `receiptsRoot` leaf payload. Like `Tx`,
//! execution semantics are out of scope — this crate only needs the receipt's
//! canonical bytes.

use animica_codec::digest::Digest32;
use animica_codec::hash::sha3_256;
use serde::{Deserialize, Serialize};

/// An opaque, already-encoded receipt payload corresponding 1:1 with a `Tx`
/// at the same index when `Block::receipts` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Fully encoded receipt bytes, opaque to this crate.
    pub bytes: Vec<u8>,
}

impl Receipt {
    /// Wrap opaque receipt bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Receipt { bytes }
    }

    /// Hash used as this receipt's Merkle leaf.
    pub fn id(&self) -> Digest32 {
        sha3_256(&self.bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
