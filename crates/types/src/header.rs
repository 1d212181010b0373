// Path: crates/types/src/header.rs
//! Canonical block header (component B), grounded on
//! `original_source/core/types/header.py`.

use crate::error::{ConsensusError, Result, ValidationError};
use animica_codec::cbor::{canonical_cbor, from_canonical_cbor, CanonicalValue};
use animica_codec::digest::Digest32;
use animica_codec::hash::sha3_256;
use serde::{Deserialize, Serialize};

/// The only header schema version this implementation accepts on decode.
pub const HEADER_VERSION: u8 = 1;

/// Canonical block header. Every `D32` field is exactly 32 bytes; this is
/// enforced at construction and on decode (spec §3.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Schema version, currently always 1.
    pub v: u8,
    /// Chain identifier (Animica mainnet = 1).
    pub chain_id: u64,
    /// Block height; genesis is 0.
    pub height: u64,
    /// Hash of the parent header; all-zero for genesis.
    pub parent_hash: Digest32,
    /// Seconds since the UNIX epoch, as claimed by the block producer.
    pub timestamp: u64,
    /// Post-state root after executing this block's transactions.
    pub state_root: Digest32,
    /// Merkle root of transactions in canonical order.
    pub txs_root: Digest32,
    /// Merkle root of receipts/logs.
    pub receipts_root: Digest32,
    /// Merkle root of PoIES proof receipts.
    pub proofs_root: Digest32,
    /// Data-availability NMT root.
    pub da_root: Digest32,
    /// Entropy mix for the u-draw and lotteries, derived per epoch.
    pub mix_seed: Digest32,
    /// Merkle root of the PoIES policy tree in effect.
    pub poies_policy_root: Digest32,
    /// Merkle root of the PQ algorithm-policy tree in effect.
    pub pq_alg_policy_root: Digest32,
    /// Θ acceptance threshold in micro-nats (fixed point).
    pub theta_micro: u64,
    /// Producer-chosen nonce used in the u-draw domain; 0 in mempool templates.
    pub nonce: u64,
    /// Opaque, bounded, non-consensus hint bytes.
    pub extra: Vec<u8>,
}

/// Upper bound on `Header::extra`, chosen to keep headers small and bounded
/// independent of any particular hint payload shape.
pub const MAX_EXTRA_BYTES: usize = 1024;

impl Header {
    /// Build a deterministic genesis header: `height=0`, `parentHash=0^32`, `nonce=0`.
    #[allow(clippy::too_many_arguments)]
    pub fn genesis(
        chain_id: u64,
        timestamp: u64,
        state_root: Digest32,
        txs_root: Digest32,
        receipts_root: Digest32,
        proofs_root: Digest32,
        da_root: Digest32,
        mix_seed: Digest32,
        poies_policy_root: Digest32,
        pq_alg_policy_root: Digest32,
        theta_micro: u64,
        extra: Vec<u8>,
    ) -> Result<Self> {
        let h = Header {
            v: HEADER_VERSION,
            chain_id,
            height: 0,
            parent_hash: Digest32::ZERO,
            timestamp,
            state_root,
            txs_root,
            receipts_root,
            proofs_root,
            da_root,
            mix_seed,
            poies_policy_root,
            pq_alg_policy_root,
            theta_micro,
            nonce: 0,
            extra,
        };
        h.validate()?;
        Ok(h)
    }

    /// Build a template for the next block referencing this header as parent.
    /// `mix_seed`/`poies_policy_root`/`pq_alg_policy_root`/`theta_micro` default
    /// to inheriting the parent's values unless overridden.
    #[allow(clippy::too_many_arguments)]
    pub fn build_child(
        &self,
        timestamp: u64,
        state_root: Digest32,
        txs_root: Digest32,
        receipts_root: Digest32,
        proofs_root: Digest32,
        da_root: Digest32,
        mix_seed: Option<Digest32>,
        poies_policy_root: Option<Digest32>,
        pq_alg_policy_root: Option<Digest32>,
        theta_micro: Option<u64>,
        extra: Vec<u8>,
    ) -> Result<Self> {
        let h = Header {
            v: self.v,
            chain_id: self.chain_id,
            height: self.height + 1,
            parent_hash: self.hash(),
            timestamp,
            state_root,
            txs_root,
            receipts_root,
            proofs_root,
            da_root,
            mix_seed: mix_seed.unwrap_or(self.mix_seed),
            poies_policy_root: poies_policy_root.unwrap_or(self.poies_policy_root),
            pq_alg_policy_root: pq_alg_policy_root.unwrap_or(self.pq_alg_policy_root),
            theta_micro: theta_micro.unwrap_or(self.theta_micro),
            nonce: 0,
            extra,
        };
        h.validate()?;
        Ok(h)
    }

    /// Build a header directly from its component fields, for callers (the
    /// mining header packer) that assemble a candidate from a `HeaderBase`
    /// rather than from a parent `Header` value. `nonce` starts at 0; the
    /// scanner fills it per attempt via [`Header::with_nonce`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        chain_id: u64,
        height: u64,
        parent_hash: Digest32,
        timestamp: u64,
        state_root: Digest32,
        txs_root: Digest32,
        receipts_root: Digest32,
        proofs_root: Digest32,
        da_root: Digest32,
        mix_seed: Digest32,
        poies_policy_root: Digest32,
        pq_alg_policy_root: Digest32,
        theta_micro: u64,
        extra: Vec<u8>,
    ) -> Result<Self> {
        let h = Header {
            v: HEADER_VERSION,
            chain_id,
            height,
            parent_hash,
            timestamp,
            state_root,
            txs_root,
            receipts_root,
            proofs_root,
            da_root,
            mix_seed,
            poies_policy_root,
            pq_alg_policy_root,
            theta_micro,
            nonce: 0,
            extra,
        };
        h.validate()?;
        Ok(h)
    }

    /// Return a copy with a different nonce (the only field the miner varies).
    pub fn with_nonce(&self, nonce: u64) -> Self {
        Header {
            nonce,
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.extra.len() > MAX_EXTRA_BYTES {
            return Err(ValidationError::InvalidLength(format!(
                "extra exceeds {MAX_EXTRA_BYTES} bytes"
            ))
            .into());
        }
        Ok(())
    }

    /// Canonical map view, used for both CBOR encoding and hashing.
    pub fn to_obj(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("v", CanonicalValue::Int(self.v as i128)),
            ("chainId", CanonicalValue::Int(self.chain_id as i128)),
            ("height", CanonicalValue::Int(self.height as i128)),
            ("parentHash", CanonicalValue::Bytes(self.parent_hash.as_bytes().to_vec())),
            ("timestamp", CanonicalValue::Int(self.timestamp as i128)),
            ("stateRoot", CanonicalValue::Bytes(self.state_root.as_bytes().to_vec())),
            ("txsRoot", CanonicalValue::Bytes(self.txs_root.as_bytes().to_vec())),
            ("receiptsRoot", CanonicalValue::Bytes(self.receipts_root.as_bytes().to_vec())),
            ("proofsRoot", CanonicalValue::Bytes(self.proofs_root.as_bytes().to_vec())),
            ("daRoot", CanonicalValue::Bytes(self.da_root.as_bytes().to_vec())),
            ("mixSeed", CanonicalValue::Bytes(self.mix_seed.as_bytes().to_vec())),
            (
                "poiesPolicyRoot",
                CanonicalValue::Bytes(self.poies_policy_root.as_bytes().to_vec()),
            ),
            (
                "pqAlgPolicyRoot",
                CanonicalValue::Bytes(self.pq_alg_policy_root.as_bytes().to_vec()),
            ),
            ("thetaMicro", CanonicalValue::Int(self.theta_micro as i128)),
            ("nonce", CanonicalValue::Int(self.nonce as i128)),
            ("extra", CanonicalValue::Bytes(self.extra.clone())),
        ])
    }

    /// Parse a header back out of its canonical map view.
    pub fn from_obj(v: &CanonicalValue) -> Result<Self> {
        let map = match v {
            CanonicalValue::Map(m) => m,
            _ => return Err(ValidationError::InvalidEncoding("header is not a map".into()).into()),
        };
        let get = |k: &str| -> Result<&CanonicalValue> {
            map.get(k)
                .ok_or_else(|| ValidationError::InvalidEncoding(format!("missing field {k}")).into())
        };
        let as_u64 = |v: &CanonicalValue, name: &str| -> Result<u64> {
            match v {
                CanonicalValue::Int(i) if *i >= 0 => Ok(*i as u64),
                _ => Err(ValidationError::InvalidEncoding(format!("{name} is not a non-negative int")).into()),
            }
        };
        let as_digest = |v: &CanonicalValue, name: &str| -> Result<Digest32> {
            match v {
                CanonicalValue::Bytes(b) => Ok(Digest32::from_slice(b).map_err(ValidationError::from)?),
                _ => Err(ValidationError::InvalidEncoding(format!("{name} is not bytes")).into()),
            }
        };
        let as_bytes = |v: &CanonicalValue, name: &str| -> Result<Vec<u8>> {
            match v {
                CanonicalValue::Bytes(b) => Ok(b.clone()),
                _ => Err(ValidationError::InvalidEncoding(format!("{name} is not bytes")).into()),
            }
        };

        let v_field = as_u64(get("v")?, "v")? as u8;
        let h = Header {
            v: v_field,
            chain_id: as_u64(get("chainId")?, "chainId")?,
            height: as_u64(get("height")?, "height")?,
            parent_hash: as_digest(get("parentHash")?, "parentHash")?,
            timestamp: as_u64(get("timestamp")?, "timestamp")?,
            state_root: as_digest(get("stateRoot")?, "stateRoot")?,
            txs_root: as_digest(get("txsRoot")?, "txsRoot")?,
            receipts_root: as_digest(get("receiptsRoot")?, "receiptsRoot")?,
            proofs_root: as_digest(get("proofsRoot")?, "proofsRoot")?,
            da_root: as_digest(get("daRoot")?, "daRoot")?,
            mix_seed: as_digest(get("mixSeed")?, "mixSeed")?,
            poies_policy_root: as_digest(get("poiesPolicyRoot")?, "poiesPolicyRoot")?,
            pq_alg_policy_root: as_digest(get("pqAlgPolicyRoot")?, "pqAlgPolicyRoot")?,
            theta_micro: as_u64(get("thetaMicro")?, "thetaMicro")?,
            nonce: as_u64(get("nonce")?, "nonce")?,
            extra: as_bytes(get("extra")?, "extra")?,
        };
        if h.v != HEADER_VERSION {
            return Err(ConsensusError::HeaderVersionUnsupported(h.v).into());
        }
        h.validate()?;
        Ok(h)
    }

    /// Encode to canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(canonical_cbor(&self.to_obj())?)
    }

    /// Decode from canonical CBOR bytes.
    pub fn from_cbor(b: &[u8]) -> Result<Self> {
        let v = from_canonical_cbor(b)?;
        Header::from_obj(&v)
    }

    /// Consensus header hash (block id): `sha3_256(canonical_cbor(header))`.
    /// This is the *only* place `nonce` participates in the hash that matters
    /// for consensus identity — miners vary `nonce` and recompute `hash()`.
    pub fn hash(&self) -> Digest32 {
        // Encoding of a validated Header cannot fail.
        let bytes = canonical_cbor(&self.to_obj()).unwrap_or_default();
        sha3_256(&bytes)
    }

    /// The PoW/PoIES u-draw preimage: every field except `nonce`, plus an
    /// appended `domainTag`. The nonce is varied externally by the scanner.
    pub fn signing_preimage(&self, domain_tag: &[u8]) -> Vec<u8> {
        let obj = CanonicalValue::map([
            ("v", CanonicalValue::Int(self.v as i128)),
            ("chainId", CanonicalValue::Int(self.chain_id as i128)),
            ("height", CanonicalValue::Int(self.height as i128)),
            ("parentHash", CanonicalValue::Bytes(self.parent_hash.as_bytes().to_vec())),
            ("timestamp", CanonicalValue::Int(self.timestamp as i128)),
            ("stateRoot", CanonicalValue::Bytes(self.state_root.as_bytes().to_vec())),
            ("txsRoot", CanonicalValue::Bytes(self.txs_root.as_bytes().to_vec())),
            ("receiptsRoot", CanonicalValue::Bytes(self.receipts_root.as_bytes().to_vec())),
            ("proofsRoot", CanonicalValue::Bytes(self.proofs_root.as_bytes().to_vec())),
            ("daRoot", CanonicalValue::Bytes(self.da_root.as_bytes().to_vec())),
            ("mixSeed", CanonicalValue::Bytes(self.mix_seed.as_bytes().to_vec())),
            (
                "poiesPolicyRoot",
                CanonicalValue::Bytes(self.poies_policy_root.as_bytes().to_vec()),
            ),
            (
                "pqAlgPolicyRoot",
                CanonicalValue::Bytes(self.pq_alg_policy_root.as_bytes().to_vec()),
            ),
            ("thetaMicro", CanonicalValue::Int(self.theta_micro as i128)),
            ("extra", CanonicalValue::Bytes(self.extra.clone())),
            ("domainTag", CanonicalValue::Bytes(domain_tag.to_vec())),
        ]);
        canonical_cbor(&obj).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z() -> Digest32 {
        Digest32::ZERO
    }

    #[test]
    fn genesis_header_matches_spec_invariants() {
        // spec.md §8 scenario C
        let h = Header::genesis(
            1,
            1_700_000_000,
            z(),
            z(),
            z(),
            z(),
            z(),
            Digest32::from_array([0x42; 32]),
            Digest32::from_array([0x11; 32]),
            Digest32::from_array([0x22; 32]),
            1_000_000,
            b"animica-devnet".to_vec(),
        )
        .unwrap();
        assert_eq!(h.height, 0);
        assert_eq!(h.parent_hash, Digest32::ZERO);
        assert_eq!(h.nonce, 0);
        let hash1 = h.hash();
        let hash2 = h.hash();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn roundtrip_through_cbor_preserves_hash() {
        let h = Header::genesis(1, 1, z(), z(), z(), z(), z(), z(), z(), z(), 1, vec![]).unwrap();
        let enc = h.to_cbor().unwrap();
        let dec = Header::from_cbor(&enc).unwrap();
        assert_eq!(h, dec);
        assert_eq!(h.hash(), dec.hash());
    }

    #[test]
    fn signing_preimage_excludes_nonce() {
        let h = Header::genesis(1, 1, z(), z(), z(), z(), z(), z(), z(), z(), 1, vec![]).unwrap();
        let h2 = h.with_nonce(42);
        assert_eq!(
            h.signing_preimage(b"mining.preimage"),
            h2.signing_preimage(b"mining.preimage")
        );
        assert_ne!(h.hash(), h2.hash());
    }

    #[test]
    fn build_child_inherits_parent_policy_roots() {
        let parent = Header::genesis(
            1,
            1,
            z(),
            z(),
            z(),
            z(),
            z(),
            Digest32::from_array([9; 32]),
            Digest32::from_array([1; 32]),
            Digest32::from_array([2; 32]),
            1000,
            vec![],
        )
        .unwrap();
        let child = parent
            .build_child(2, z(), z(), z(), z(), z(), None, None, None, None, vec![])
            .unwrap();
        assert_eq!(child.height, 1);
        assert_eq!(child.parent_hash, parent.hash());
        assert_eq!(child.mix_seed, parent.mix_seed);
        assert_eq!(child.poies_policy_root, parent.poies_policy_root);
        assert_eq!(child.pq_alg_policy_root, parent.pq_alg_policy_root);
        assert_eq!(child.theta_micro, parent.theta_micro);
    }
}
