// Path: crates/p2p/src/adapters.rs
//! Fast-path gossip admission pre-checks (`spec.md` §4.12, component K):
//! cheap structural sanity on headers/txs/blocks decoded from CBOR, and a
//! liberal array-or-map proof-envelope pre-parse with stable rejection
//! reason strings. None of this replaces full consensus validation — it
//! exists so a peer can be rejected before the caller pays for the
//! expensive checks.

use animica_codec::cbor::{from_canonical_cbor, CanonicalValue};
use animica_codec::digest::Digest32;
use animica_types::block::Block;
use animica_types::header::Header;
use animica_types::proof::{ProofEnvelope, MAX_BODY_BYTES};
use animica_types::tx::Tx;
use animica_types::Result;
use std::collections::HashSet;

/// Stable rejection reason strings (`spec.md` §4.12). Callers log or count
/// by this string; it must never change shape once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The payload exceeded a caller-configured size bound.
    Oversize,
    /// CBOR decoding failed outright.
    DecodeFailed,
    /// The payload decoded but was not a well-formed envelope shape.
    BadEnvelope,
    /// The envelope named a `typeId` this build does not recognize.
    UnknownType,
    /// The envelope carried no (or a malformed) nullifier.
    MissingNullifier,
    /// The nullifier was already present in the caller's seen-set.
    DuplicateNullifier,
}

impl RejectReason {
    /// The stable wire/log string for this reason (`spec.md` §4.12).
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::Oversize => "oversize",
            RejectReason::DecodeFailed => "decode-failed",
            RejectReason::BadEnvelope => "bad-envelope",
            RejectReason::UnknownType => "unknown-type",
            RejectReason::MissingNullifier => "missing-nullifier",
            RejectReason::DuplicateNullifier => "duplicate-nullifier",
        }
    }
}

/// Decode a header from canonical CBOR, surfacing only whether it decoded —
/// callers that need the error detail use `animica_types::header::Header::from_cbor` directly.
pub fn decode_header(bytes: &[u8]) -> Option<Header> {
    Header::from_cbor(bytes).ok()
}

/// Decode a transaction. A `Tx` is an opaque byte wrapper (`spec.md` §1
/// Non-goals), so "decoding" here just means the bytes are non-empty and
/// within `max_len`; there is no schema to reject.
pub fn decode_tx(bytes: &[u8], max_len: usize) -> Option<Tx> {
    if bytes.is_empty() || bytes.len() > max_len {
        return None;
    }
    Some(Tx::new(bytes.to_vec()))
}

/// Decode a full block from canonical CBOR via its constituent header/txs/
/// proofs fields, without verifying roots (that is full consensus
/// validation, not an admission pre-check).
pub fn decode_block_header_only(bytes: &[u8]) -> Option<Header> {
    decode_header(bytes)
}

/// Header-level sanity (`spec.md` §4.12 `sanity_header`): every `D32` field
/// is exactly 32 bytes (enforced by `Header`'s own decode), plus the
/// additional relational checks the spec calls out explicitly.
pub fn sanity_header(header: &Header) -> bool {
    header.chain_id > 0 && header.theta_micro > 0 && header.mix_seed.as_bytes().len() == 32
}

/// Transaction-level sanity (`spec.md` §4.12 `sanity_tx`): `chainId` matches
/// when the caller expects one, the payload is non-empty, and — since
/// `Tx` here is an opaque byte wrapper rather than a parsed fee/signature
/// structure — the only length check available is the outer size bound
/// already applied by `decode_tx`.
pub fn sanity_tx(tx: &Tx) -> bool {
    !tx.as_bytes().is_empty()
}

/// Block-level sanity (`spec.md` §4.12 `sanity_block`): delegates to header
/// sanity; a block whose header fails sanity is rejected outright regardless
/// of its bodies.
pub fn sanity_block(block: &Block) -> bool {
    sanity_header(&block.header)
}

/// The fields a caller needs out of a gossiped proof envelope without fully
/// verifying it: the type id, the nullifier, and — for `HashShare` bodies
/// only — an optional header-hash hint some miners attach so a peer can
/// cheaply tell which candidate a share targets before decoding the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSummary {
    pub type_id: u8,
    pub nullifier: Digest32,
    pub header_hash_hint: Option<Digest32>,
}

/// Liberally decode a proof envelope from CBOR, accepting either the
/// canonical map shape (`{"v":1,"typeId":...,"nullifier":...,"body":...}`)
/// or a positional array shape `[v, typeId, nullifier, body]`
/// (`spec.md` §9 "accept mostly anything" decoders) — both normalize to the
/// same [`ProofEnvelope`].
pub fn decode_envelope_liberal(bytes: &[u8], max_size: usize) -> std::result::Result<ProofEnvelope, RejectReason> {
    if bytes.len() > max_size {
        return Err(RejectReason::Oversize);
    }
    let value = from_canonical_cbor(bytes).map_err(|_| RejectReason::DecodeFailed)?;
    let env = match &value {
        CanonicalValue::Map(_) => ProofEnvelope::from_obj(&value).map_err(|_| RejectReason::BadEnvelope)?,
        CanonicalValue::Array(items) => decode_envelope_array(items)?,
        _ => return Err(RejectReason::BadEnvelope),
    };
    if env.body.len() > MAX_BODY_BYTES {
        return Err(RejectReason::Oversize);
    }
    Ok(env)
}

fn decode_envelope_array(items: &[CanonicalValue]) -> std::result::Result<ProofEnvelope, RejectReason> {
    let [_v, type_id, nullifier, body] = items else {
        return Err(RejectReason::BadEnvelope);
    };
    let type_id = match type_id {
        CanonicalValue::Int(i) if *i >= 0 && *i <= u8::MAX as i128 => *i as u8,
        _ => return Err(RejectReason::BadEnvelope),
    };
    let nullifier = match nullifier {
        CanonicalValue::Bytes(b) => Digest32::from_slice(b).map_err(|_| RejectReason::MissingNullifier)?,
        _ => return Err(RejectReason::MissingNullifier),
    };
    let body = match body {
        CanonicalValue::Bytes(b) => b.clone(),
        _ => return Err(RejectReason::BadEnvelope),
    };
    ProofEnvelope::new(type_id, nullifier, body).map_err(|_| RejectReason::BadEnvelope)
}

/// Extract the admission-relevant summary from a decoded envelope, rejecting
/// an unrecognized `typeId` and checking the nullifier against a
/// caller-owned seen-set (`spec.md` §5 "Nullifier sets for gossip dedupe
/// are caller-owned; the core merely checks/inserts through a `MutableSet`
/// interface").
pub fn summarize_and_dedupe(
    env: &ProofEnvelope,
    known_type_ids: &HashSet<u8>,
    seen_nullifiers: &mut dyn SeenSet,
) -> std::result::Result<EnvelopeSummary, RejectReason> {
    if !known_type_ids.contains(&env.type_id) {
        return Err(RejectReason::UnknownType);
    }
    if seen_nullifiers.contains(&env.nullifier) {
        return Err(RejectReason::DuplicateNullifier);
    }
    seen_nullifiers.insert(env.nullifier);
    Ok(EnvelopeSummary {
        type_id: env.type_id,
        nullifier: env.nullifier,
        header_hash_hint: header_hash_hint(env),
    })
}

/// For `HashShare` envelopes (`typeId == 0`), a miner may prefix the opaque
/// body with the 32-byte header hash the share targets, as a cheap routing
/// hint; any other type id, or a body shorter than 32 bytes, yields `None`.
fn header_hash_hint(env: &ProofEnvelope) -> Option<Digest32> {
    if env.type_id != 0 || env.body.len() < 32 {
        return None;
    }
    Digest32::from_slice(&env.body[..32]).ok()
}

/// A caller-owned mutable set of previously-seen nullifiers, used for gossip
/// dedupe. The core never owns this storage; it only checks and inserts
/// through this interface (`spec.md` §5).
pub trait SeenSet {
    /// Whether `nullifier` has already been observed.
    fn contains(&self, nullifier: &Digest32) -> bool;
    /// Record `nullifier` as seen.
    fn insert(&mut self, nullifier: Digest32);
}

impl SeenSet for HashSet<Digest32> {
    fn contains(&self, nullifier: &Digest32) -> bool {
        HashSet::contains(self, nullifier)
    }

    fn insert(&mut self, nullifier: Digest32) {
        HashSet::insert(self, nullifier);
    }
}

/// Re-export so `Result<Header>` etc. read naturally at call sites that need
/// the full consensus error rather than a [`RejectReason`].
pub type FullResult<T> = Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use animica_codec::cbor::canonical_cbor;
    use animica_types::proof::ProofEnvelope;

    fn sample_header() -> Header {
        Header::genesis(
            1,
            1,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::from_array([9; 32]),
            Digest32::ZERO,
            Digest32::ZERO,
            1_000_000,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn header_roundtrips_through_decode() {
        let h = sample_header();
        let bytes = h.to_cbor().unwrap();
        let decoded = decode_header(&bytes).unwrap();
        assert_eq!(h, decoded);
        assert!(sanity_header(&decoded));
    }

    #[test]
    fn sanity_header_rejects_zero_chain_id_or_theta() {
        let mut h = sample_header();
        h.chain_id = 0;
        assert!(!sanity_header(&h));
    }

    #[test]
    fn decode_tx_rejects_empty_or_oversize() {
        assert!(decode_tx(&[], 1024).is_none());
        assert!(decode_tx(&[1, 2, 3], 2).is_none());
        assert!(decode_tx(&[1, 2, 3], 16).is_some());
    }

    #[test]
    fn decode_envelope_liberal_accepts_map_shape() {
        let env = ProofEnvelope::new(0, Digest32::from_array([1; 32]), vec![1, 2, 3]).unwrap();
        let bytes = env.to_cbor().unwrap();
        let decoded = decode_envelope_liberal(&bytes, 1 << 16).unwrap();
        assert_eq!(decoded, env);
    }

    #[test]
    fn decode_envelope_liberal_accepts_array_shape() {
        let arr = CanonicalValue::Array(vec![
            CanonicalValue::Int(1),
            CanonicalValue::Int(2),
            CanonicalValue::Bytes(vec![7; 32]),
            CanonicalValue::Bytes(vec![4, 5, 6]),
        ]);
        let bytes = canonical_cbor(&arr).unwrap();
        let decoded = decode_envelope_liberal(&bytes, 1 << 16).unwrap();
        assert_eq!(decoded.type_id, 2);
        assert_eq!(decoded.body, vec![4, 5, 6]);
    }

    #[test]
    fn decode_envelope_liberal_rejects_oversize() {
        let env = ProofEnvelope::new(0, Digest32::ZERO, vec![0u8; 64]).unwrap();
        let bytes = env.to_cbor().unwrap();
        assert_eq!(decode_envelope_liberal(&bytes, 16).unwrap_err(), RejectReason::Oversize);
    }

    #[test]
    fn decode_envelope_liberal_rejects_garbage() {
        assert_eq!(
            decode_envelope_liberal(&[0xff, 0xff, 0xff], 1024).unwrap_err(),
            RejectReason::DecodeFailed
        );
    }

    #[test]
    fn summarize_rejects_unknown_type_and_dedupes_nullifiers() {
        let known: HashSet<u8> = [0u8, 1, 2, 3, 4].into_iter().collect();
        let mut seen: HashSet<Digest32> = HashSet::new();
        let env = ProofEnvelope::new(0, Digest32::from_array([5; 32]), vec![]).unwrap();
        let first = summarize_and_dedupe(&env, &known, &mut seen).unwrap();
        assert_eq!(first.type_id, 0);
        let second = summarize_and_dedupe(&env, &known, &mut seen);
        assert_eq!(second.unwrap_err(), RejectReason::DuplicateNullifier);

        let unknown_type_env = ProofEnvelope::new(9, Digest32::from_array([6; 32]), vec![]).unwrap();
        let rejected = summarize_and_dedupe(&unknown_type_env, &known, &mut seen);
        assert_eq!(rejected.unwrap_err(), RejectReason::UnknownType);
    }

    #[test]
    fn header_hash_hint_present_only_for_hash_share() {
        let mut body = vec![0xab; 32];
        body.extend_from_slice(b"extra");
        let share = ProofEnvelope::new(0, Digest32::ZERO, body.clone()).unwrap();
        assert!(header_hash_hint(&share).is_some());
        let ai = ProofEnvelope::new(1, Digest32::ZERO, body).unwrap();
        assert!(header_hash_hint(&ai).is_none());
    }
}
