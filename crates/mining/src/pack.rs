// Path: crates/mining/src/pack.rs
//! Header packing (`spec.md` §4.8): fold a `HeaderBase` plus a bundled set
//! of transactions and proofs into a candidate `Header` with `nonce = 0` and
//! `receiptsRoot` left zero (filled in only once the candidate is actually
//! executed).

use crate::template::HeaderBase;
use animica_codec::digest::Digest32;
use animica_types::block::Block;
use animica_types::header::Header;
use animica_types::proof::ProofEnvelope;
use animica_types::tx::Tx;
use animica_types::Result;

/// Assemble a candidate header from `base` and the bodies it commits to.
/// `stateRoot` is left zero here: execution (outside this crate) fills it
/// in once the candidate's transactions have actually been applied, the
/// same way `receiptsRoot` is left zero until execution runs.
pub fn pack_candidate(base: &HeaderBase, txs: &[Tx], proofs: &[ProofEnvelope]) -> Result<Header> {
    let txs_root = Block::compute_txs_root(txs);
    let proofs_root = Block::compute_proofs_root(proofs)?;
    Header::from_parts(
        base.chain_id,
        base.height,
        base.parent_hash,
        base.timestamp,
        Digest32::ZERO,
        txs_root,
        Digest32::ZERO,
        proofs_root,
        base.da_root,
        base.mix_seed,
        base.poies_policy_root,
        base.pq_alg_policy_root,
        base.theta_micro,
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> HeaderBase {
        HeaderBase {
            parent_hash: Digest32::from_array([7; 32]),
            height: 10,
            chain_id: 1,
            theta_micro: 1_000_000,
            timestamp: 1_700_000_100,
            poies_policy_root: Digest32::from_array([1; 32]),
            pq_alg_policy_root: Digest32::from_array([2; 32]),
            da_root: Digest32::from_array([3; 32]),
            mix_seed: Digest32::from_array([4; 32]),
        }
    }

    #[test]
    fn empty_bodies_pack_to_zero_roots() {
        let header = pack_candidate(&base(), &[], &[]).unwrap();
        assert_eq!(header.txs_root, Digest32::ZERO);
        assert_eq!(header.proofs_root, Digest32::ZERO);
        assert_eq!(header.receipts_root, Digest32::ZERO);
        assert_eq!(header.nonce, 0);
        assert_eq!(header.height, 10);
        assert_eq!(header.parent_hash, base().parent_hash);
    }

    #[test]
    fn non_empty_txs_change_txs_root() {
        let txs = vec![Tx::new(vec![9, 9, 9])];
        let header = pack_candidate(&base(), &txs, &[]).unwrap();
        assert_ne!(header.txs_root, Digest32::ZERO);
        assert_eq!(header.txs_root, Block::compute_txs_root(&txs));
    }

    #[test]
    fn packed_header_inherits_policy_roots_from_base() {
        let b = base();
        let header = pack_candidate(&b, &[], &[]).unwrap();
        assert_eq!(header.poies_policy_root, b.poies_policy_root);
        assert_eq!(header.pq_alg_policy_root, b.pq_alg_policy_root);
        assert_eq!(header.mix_seed, b.mix_seed);
        assert_eq!(header.theta_micro, b.theta_micro);
    }
}
