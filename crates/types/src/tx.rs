// Path: crates/types/src/tx.rs
//! Opaque transaction envelope. Execution semantics (a VM, account model,
//! fee market) are out of scope (spec.md §1 Non-goals) — what consensus
//! needs from a transaction is its canonical bytes and their hash, nothing
//! about what it does.

use animica_codec::digest::Digest32;
use animica_codec::hash::sha3_256;
use serde::{Deserialize, Serialize};

/// An opaque, already-encoded transaction payload. `Block::txs_root` hashes
/// these bytes directly as list-Merkle leaves; nothing here interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// Fully encoded transaction bytes, opaque to this crate.
    pub bytes: Vec<u8>,
}

impl Tx {
    /// Wrap opaque transaction bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Tx { bytes }
    }

    /// Hash used as this transaction's identity and Merkle leaf.
    pub fn id(&self) -> Digest32 {
        sha3_256(&self.bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_and_content_addressed() {
        let a = Tx::new(vec![1, 2, 3]);
        let b = Tx::new(vec![1, 2, 3]);
        let c = Tx::new(vec![1, 2, 4]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }
}
