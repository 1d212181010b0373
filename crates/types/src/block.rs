// Path: crates/types/src/block.rs
//! Block assembly and verification (component B), grounded on
//! `original_source/core/types/block.py`.

use crate::error::{ConsensusError, Result};
use crate::header::Header;
use crate::proof::ProofEnvelope;
use crate::receipt::Receipt;
use crate::tx::Tx;
use animica_codec::digest::Digest32;
use animica_codec::hash;
use serde::{Deserialize, Serialize};

/// A full block: header plus the bodies whose roots the header commits to.
///
/// `receipts` is optional: a block with `receipts = None` is valid and
/// distinct from `receipts = Some(vec![])`, but the two only coincide in
/// their root (`proofsRoot`/`receiptsRoot` default to the 32-byte zero when
/// the underlying list is empty) when `txs` is also empty — a non-empty
/// `txs` with `receipts = Some(vec![])` is rejected by `verify_against_header`
/// because lengths must match when receipts are present at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block's header.
    pub header: Header,
    /// Transactions in canonical (header-committed) order.
    pub txs: Vec<Tx>,
    /// PoIES proof envelopes in canonical order.
    pub proofs: Vec<ProofEnvelope>,
    /// Per-transaction receipts, one-to-one with `txs` when present.
    pub receipts: Option<Vec<Receipt>>,
}

impl Block {
    /// Compute the transactions root for a tx list: `merkle_root(tx.hash() for
    /// tx in txs)` (spec.md §3.4) — each leaf fed to the list Merkle is the
    /// transaction's own content hash, not its raw bytes.
    pub fn compute_txs_root(txs: &[Tx]) -> Digest32 {
        let ids: Vec<Digest32> = txs.iter().map(Tx::id).collect();
        if ids.is_empty() {
            return Digest32::ZERO;
        }
        let leaves: Vec<&[u8]> = ids.iter().map(Digest32::as_bytes).collect();
        hash::merkle_root(&leaves)
    }

    /// Compute the receipts root for a receipts list: `merkle_root(r.hash()
    /// for r in receipts)` (spec.md §3.4).
    pub fn compute_receipts_root(receipts: &[Receipt]) -> Digest32 {
        let ids: Vec<Digest32> = receipts.iter().map(Receipt::id).collect();
        if ids.is_empty() {
            return Digest32::ZERO;
        }
        let leaves: Vec<&[u8]> = ids.iter().map(Digest32::as_bytes).collect();
        hash::merkle_root(&leaves)
    }

    /// Compute the proofs root: `merkle_root(sha3_256(cbor(p)) for p in
    /// proofs)` (spec.md §3.4) — each leaf is the hash of the envelope's
    /// canonical CBOR encoding, not the raw `body` and not the CBOR bytes
    /// themselves.
    pub fn compute_proofs_root(proofs: &[ProofEnvelope]) -> Result<Digest32> {
        if proofs.is_empty() {
            return Ok(Digest32::ZERO);
        }
        let mut ids = Vec::with_capacity(proofs.len());
        for p in proofs {
            ids.push(hash::sha3_256(&p.to_cbor()?));
        }
        let leaves: Vec<&[u8]> = ids.iter().map(Digest32::as_bytes).collect();
        Ok(hash::merkle_root(&leaves))
    }

    /// Assemble a block, optionally verifying its bodies against the header's
    /// claimed roots and the receipts/txs length invariant.
    pub fn from_components(
        header: Header,
        txs: Vec<Tx>,
        proofs: Vec<ProofEnvelope>,
        receipts: Option<Vec<Receipt>>,
        verify: bool,
    ) -> Result<Self> {
        let block = Block {
            header,
            txs,
            proofs,
            receipts,
        };
        if verify {
            block.verify_against_header()?;
        }
        Ok(block)
    }

    /// Block identity: the header hash.
    pub fn id(&self) -> Digest32 {
        self.header.hash()
    }

    /// Recompute `txsRoot`/`receiptsRoot`/`proofsRoot` from the bodies and
    /// check them against the header's claimed values, and check that
    /// `receipts`, when present, has the same length as `txs`.
    pub fn verify_against_header(&self) -> Result<()> {
        if let Some(receipts) = &self.receipts {
            if receipts.len() != self.txs.len() {
                return Err(ConsensusError::RootMismatch {
                    which: "receiptsRoot",
                    expected: format!("{} receipts", self.txs.len()),
                    got: format!("{} receipts", receipts.len()),
                }
                .into());
            }
            let got = Self::compute_receipts_root(receipts);
            if got != self.header.receipts_root {
                return Err(ConsensusError::RootMismatch {
                    which: "receiptsRoot",
                    expected: self.header.receipts_root.to_hex(),
                    got: got.to_hex(),
                }
                .into());
            }
        }

        let txs_root = Self::compute_txs_root(&self.txs);
        if txs_root != self.header.txs_root {
            return Err(ConsensusError::RootMismatch {
                which: "txsRoot",
                expected: self.header.txs_root.to_hex(),
                got: txs_root.to_hex(),
            }
            .into());
        }

        let proofs_root = Self::compute_proofs_root(&self.proofs)?;
        if proofs_root != self.header.proofs_root {
            return Err(ConsensusError::RootMismatch {
                which: "proofsRoot",
                expected: self.header.proofs_root.to_hex(),
                got: proofs_root.to_hex(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z() -> Digest32 {
        Digest32::ZERO
    }

    fn genesis_with_roots(txs_root: Digest32, receipts_root: Digest32, proofs_root: Digest32) -> Header {
        Header::genesis(1, 1, z(), txs_root, receipts_root, proofs_root, z(), z(), z(), z(), 1, vec![]).unwrap()
    }

    #[test]
    fn empty_block_roots_are_all_zero() {
        let header = genesis_with_roots(z(), z(), z());
        let block = Block::from_components(header, vec![], vec![], None, true).unwrap();
        assert_eq!(Block::compute_txs_root(&block.txs), Digest32::ZERO);
        assert_eq!(Block::compute_proofs_root(&block.proofs).unwrap(), Digest32::ZERO);
    }

    #[test]
    fn non_empty_roots_differ_from_zero_sentinel() {
        let txs = vec![Tx::new(vec![1, 2, 3])];
        let txs_root = Block::compute_txs_root(&txs);
        assert_ne!(txs_root, Digest32::ZERO);
        let header = genesis_with_roots(txs_root, z(), z());
        let block = Block::from_components(header, txs, vec![], None, true).unwrap();
        assert_eq!(block.txs.len(), 1);
    }

    #[test]
    fn mismatched_receipts_length_is_rejected() {
        let txs = vec![Tx::new(vec![1]), Tx::new(vec![2])];
        let txs_root = Block::compute_txs_root(&txs);
        let header = genesis_with_roots(txs_root, z(), z());
        let receipts = Some(vec![Receipt::new(vec![9])]);
        assert!(Block::from_components(header, txs, vec![], receipts, true).is_err());
    }

    #[test]
    fn root_mismatch_is_rejected() {
        let txs = vec![Tx::new(vec![1, 2, 3])];
        let header = genesis_with_roots(z(), z(), z());
        assert!(Block::from_components(header, txs, vec![], None, true).is_err());
    }
}
