// Path: crates/types/src/share_receipt.rs
//! Share receipts and the per-block aggregator (component C), grounded on
//! `original_source/consensus/share_receipts.py`.
//!
//! Three empty-root conventions coexist in this workspace by design: the
//! generic list/KV Merkle (`leaf_hash(0x00||"")`, in `animica_codec::hash`),
//! the state-root tree (`sha3_256(DOMAIN_EMPTY)`, in `animica_codec::
//! state_root`), and this aggregator's (the 32-byte zero). Each consumer
//! fixes its own sentinel; none of the three are unified.

use animica_codec::digest::Digest32;
use animica_codec::hash::{self, sha3_256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LEAF_TAG: &[u8] = b"SR\x01";

/// A single useful-work share's settlement record: how much credit
/// (`micro_units`, a fixed-point 1e-6 unit) a proof of type `type_id`
/// earned, keyed by its anti-replay `nullifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareReceipt {
    /// Proof-type discriminant this share credits (see `ProofType`).
    pub type_id: u8,
    /// The proof's anti-replay nullifier, copied from its envelope.
    pub nullifier: Digest32,
    /// Credited amount, in micro-units (1e-6 of the canonical unit).
    pub micro_units: u64,
    /// Reserved bitfield for forward compatibility; always 0 today.
    pub meta_flags: u8,
}

impl ShareReceipt {
    /// Construct a new share receipt.
    pub fn new(type_id: u8, nullifier: Digest32, micro_units: u64, meta_flags: u8) -> Self {
        ShareReceipt {
            type_id,
            nullifier,
            micro_units,
            meta_flags,
        }
    }

    /// Canonical leaf preimage:
    /// `"SR\x01" || u8(type_id) || u8(meta_flags) || u64be(micro_units) || nullifier`.
    pub fn leaf_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(LEAF_TAG.len() + 1 + 1 + 8 + 32);
        out.extend_from_slice(LEAF_TAG);
        out.push(self.type_id);
        out.push(self.meta_flags);
        out.extend_from_slice(&self.micro_units.to_be_bytes());
        out.extend_from_slice(self.nullifier.as_bytes());
        out
    }

    /// Merkle leaf hash: `sha3_256(leaf_bytes())`.
    pub fn leaf_hash(&self) -> Digest32 {
        sha3_256(&self.leaf_bytes())
    }
}

/// Draw a deterministic uniform value in `[0, 1)` from
/// `sha3_256(seed || u8(type_id) || nullifier)`, taking the first 8 bytes as
/// a little-endian `u64` over `2^64`.
fn draw_unit_interval(seed: &[u8], type_id: u8, nullifier: &Digest32) -> f64 {
    let mut preimage = Vec::with_capacity(seed.len() + 1 + 32);
    preimage.extend_from_slice(seed);
    preimage.push(type_id);
    preimage.extend_from_slice(nullifier.as_bytes());
    let digest = sha3_256(&preimage);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(buf) as f64) / (u64::MAX as f64 + 1.0)
}

/// Stochastically round a real-valued credit `x` to an integral micro-unit
/// amount: `floor(x) + 1` with probability `frac(x)`, else `floor(x)`.
/// `x <= 0` always rounds to 0. The random draw is deterministic given
/// `(seed, type_id, nullifier)`, so validators re-deriving the same credit
/// from the same inputs agree on the rounded result.
pub fn stochastic_round(seed: &[u8], type_id: u8, nullifier: &Digest32, x: f64) -> u64 {
    if x <= 0.0 {
        return 0;
    }
    let floor = x.floor();
    let frac = x - floor;
    let rnd = draw_unit_interval(seed, type_id, nullifier);
    let micro = if rnd < frac { floor + 1.0 } else { floor };
    micro as u64
}

/// Per-type credit breakdown accompanying a finalized aggregation round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    /// Number of receipts aggregated.
    pub count: u64,
    /// Sum of all receipts' `micro_units`.
    pub total_micro_units: u64,
    /// `micro_units` summed per `type_id`.
    pub per_type: BTreeMap<u8, u64>,
}

/// Accumulates `ShareReceipt`s for one block and produces their canonical
/// Merkle root plus summary statistics.
#[derive(Debug, Clone)]
pub struct ShareAggregator {
    seed: Vec<u8>,
    receipts: Vec<ShareReceipt>,
}

impl ShareAggregator {
    /// Construct an empty aggregator. `seed` is the deterministic randomness
    /// source for `add_fractional`'s stochastic rounding, typically the
    /// block's `mixSeed`.
    pub fn new(seed: Vec<u8>) -> Self {
        ShareAggregator {
            seed,
            receipts: Vec::new(),
        }
    }

    /// Add a receipt with an already-integral credit.
    pub fn add_integral(&mut self, type_id: u8, nullifier: Digest32, micro_units: u64, meta_flags: u8) {
        self.receipts
            .push(ShareReceipt::new(type_id, nullifier, micro_units, meta_flags));
    }

    /// Add a receipt whose real-valued credit `x` is stochastically rounded
    /// using this aggregator's seed as the deterministic randomness source.
    pub fn add_fractional(&mut self, type_id: u8, nullifier: Digest32, x: f64, meta_flags: u8) {
        let micro_units = stochastic_round(&self.seed, type_id, &nullifier, x);
        self.receipts
            .push(ShareReceipt::new(type_id, nullifier, micro_units, meta_flags));
    }

    /// Canonically ordered receipts: `(type_id asc, nullifier lexicographic asc)`.
    fn sorted(&self) -> Vec<&ShareReceipt> {
        let mut out: Vec<&ShareReceipt> = self.receipts.iter().collect();
        out.sort_by(|a, b| {
            a.type_id
                .cmp(&b.type_id)
                .then_with(|| a.nullifier.as_bytes().cmp(b.nullifier.as_bytes()))
        });
        out
    }

    /// Canonically ordered leaf hashes.
    pub fn merkle_leaves(&self) -> Vec<Digest32> {
        self.sorted().into_iter().map(|r| r.leaf_hash()).collect()
    }

    /// Merkle root over the canonically ordered receipts. Empty input yields
    /// the 32-byte zero, distinct from both other empty-root conventions in
    /// this workspace.
    pub fn merkle_root(&self) -> Digest32 {
        if self.receipts.is_empty() {
            return Digest32::ZERO;
        }
        hash::merkle_root_over_hashes(&self.merkle_leaves())
    }

    /// Finalize this round: returns the Merkle root and a summary.
    pub fn finalize(&self) -> (Digest32, AggregationStats) {
        let mut stats = AggregationStats {
            count: self.receipts.len() as u64,
            ..Default::default()
        };
        for r in &self.receipts {
            stats.total_micro_units = stats.total_micro_units.saturating_add(r.micro_units);
            *stats.per_type.entry(r.type_id).or_insert(0) += r.micro_units;
        }
        (self.merkle_root(), stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_aggregator_root_is_32_byte_zero() {
        let agg = ShareAggregator::new(vec![0u8; 32]);
        assert_eq!(agg.merkle_root(), Digest32::ZERO);
        // distinct from the generic list-Merkle empty-root convention
        assert_ne!(agg.merkle_root(), hash::merkle_root(&[]));
    }

    #[test]
    fn finalize_sums_per_type_and_total() {
        let mut agg = ShareAggregator::new(vec![0u8; 32]);
        agg.add_integral(0, Digest32::from_array([1; 32]), 100, 0);
        agg.add_integral(0, Digest32::from_array([2; 32]), 50, 0);
        agg.add_integral(1, Digest32::from_array([3; 32]), 7, 0);
        let (_, stats) = agg.finalize();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_micro_units, 157);
        assert_eq!(stats.per_type.get(&0), Some(&150));
        assert_eq!(stats.per_type.get(&1), Some(&7));
    }

    #[test]
    fn ordering_is_type_then_nullifier_not_insertion_order() {
        let mut a = ShareAggregator::new(vec![0u8; 32]);
        a.add_integral(1, Digest32::from_array([2; 32]), 1, 0);
        a.add_integral(0, Digest32::from_array([9; 32]), 1, 0);
        a.add_integral(0, Digest32::from_array([1; 32]), 1, 0);

        let mut b = ShareAggregator::new(vec![0u8; 32]);
        b.add_integral(0, Digest32::from_array([1; 32]), 1, 0);
        b.add_integral(0, Digest32::from_array([9; 32]), 1, 0);
        b.add_integral(1, Digest32::from_array([2; 32]), 1, 0);

        assert_eq!(a.merkle_root(), b.merkle_root());
    }

    #[test]
    fn stochastic_round_is_deterministic_and_bounded() {
        let nullifier = Digest32::from_array([5; 32]);
        let a = stochastic_round(b"seed", 0, &nullifier, 3.25);
        let b = stochastic_round(b"seed", 0, &nullifier, 3.25);
        assert_eq!(a, b);
        assert!(a == 3 || a == 4);
    }

    #[test]
    fn stochastic_round_clamps_non_positive_to_zero() {
        let nullifier = Digest32::from_array([6; 32]);
        assert_eq!(stochastic_round(b"seed", 0, &nullifier, 0.0), 0);
        assert_eq!(stochastic_round(b"seed", 0, &nullifier, -5.0), 0);
    }
}
