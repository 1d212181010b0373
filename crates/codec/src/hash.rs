// Path: crates/codec/src/hash.rs
//! Domain-separated SHA3 hashing and the canonical list/KV Merkle tree.
//!
//! This module's empty-root convention (`leaf_hash(0x00 || "")`) is
//! deliberately distinct from `state_root`'s (`sha3_256(EMPTY_TAG)`) and from
//! the share-receipt aggregator's (32-byte zero) — each consumer fixes its
//! own empty-set sentinel.

use crate::digest::{Digest32, Digest64};
use crate::error::{CodecError, Result};
use sha3::{Digest, Sha3_256, Sha3_512};

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;
const KV_LEAF_TAG: u8 = 0x02;

/// SHA3-256 over arbitrary bytes.
pub fn sha3_256(data: &[u8]) -> Digest32 {
    let mut h = Sha3_256::new();
    h.update(data);
    Digest32::from_array(h.finalize().into())
}

/// SHA3-512 over arbitrary bytes.
pub fn sha3_512(data: &[u8]) -> Digest64 {
    let mut h = Sha3_512::new();
    h.update(data);
    Digest64::from_array(h.finalize().into())
}

/// Auxiliary, non-consensus BLAKE3 hash. Gated behind the `aux-hashes` feature.
#[cfg(feature = "aux-hashes")]
pub fn blake3_256(data: &[u8]) -> Digest32 {
    Digest32::from_array(*blake3::hash(data).as_bytes())
}

/// Auxiliary, non-consensus Keccak-256 hash (the pre-NIST-padding SHA3 variant).
#[cfg(feature = "aux-hashes")]
pub fn keccak256(data: &[u8]) -> Digest32 {
    use sha3::Keccak256;
    let mut h = Keccak256::new();
    h.update(data);
    Digest32::from_array(h.finalize().into())
}

fn leaf_hash(leaf: &[u8]) -> Digest32 {
    let mut buf = Vec::with_capacity(1 + leaf.len());
    buf.push(LEAF_TAG);
    buf.extend_from_slice(leaf);
    sha3_256(&buf)
}

fn node_hash(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut buf = Vec::with_capacity(1 + 64);
    buf.push(NODE_TAG);
    buf.extend_from_slice(left.as_bytes());
    buf.extend_from_slice(right.as_bytes());
    sha3_256(&buf)
}

/// Canonical binary Merkle root over pre-hashed leaves.
///
/// Reduces pairwise, duplicating the last element of an odd-sized level.
/// The empty root is `leaf_hash(0x00 || "")`.
pub fn merkle_root_over_hashes(leaf_hashes: &[Digest32]) -> Digest32 {
    if leaf_hashes.is_empty() {
        return leaf_hash(&[]);
    }
    let mut level: Vec<Digest32> = leaf_hashes.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut it = level.chunks(2);
        while let Some(pair) = it.next() {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            next.push(node_hash(&left, &right));
        }
        level = next;
    }
    level[0]
}

/// Canonical binary Merkle root over raw leaf byte-strings (list Merkle).
///
/// Leaves are hashed in the order given — this Merkle form is *ordered*;
/// permuting the input changes the root (§8 property 2).
pub fn merkle_root(leaves: &[&[u8]]) -> Digest32 {
    let hashes: Vec<Digest32> = leaves.iter().map(|l| leaf_hash(l)).collect();
    merkle_root_over_hashes(&hashes)
}

/// One step of an inclusion proof: the sibling hash and which side it sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The sibling is the left operand when recombining.
    Left,
    /// The sibling is the right operand when recombining.
    Right,
}

/// An inclusion proof: an ordered list of (sibling, direction) steps from leaf to root.
#[derive(Debug, Clone, Default)]
pub struct MerkleProof(pub Vec<(Digest32, Direction)>);

/// Build an inclusion proof for the leaf at `index` within `leaves` (raw byte-strings).
pub fn merkle_proof(leaves: &[&[u8]], index: usize) -> Result<MerkleProof> {
    if index >= leaves.len() {
        return Err(CodecError::InvalidEncoding(format!(
            "merkle_proof index {} out of range for {} leaves",
            index,
            leaves.len()
        )));
    }
    let mut level: Vec<Digest32> = leaves.iter().map(|l| leaf_hash(l)).collect();
    let mut idx = index;
    let mut steps = Vec::new();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut i = 0;
        while i < level.len() {
            let left = level[i];
            let right = if i + 1 < level.len() { level[i + 1] } else { level[i] };
            if i == idx || i + 1 == idx {
                if idx == i {
                    steps.push((right, Direction::Right));
                } else {
                    steps.push((left, Direction::Left));
                }
            }
            next.push(node_hash(&left, &right));
            i += 2;
        }
        idx /= 2;
        level = next;
    }
    Ok(MerkleProof(steps))
}

/// Verify an inclusion proof against an expected root.
pub fn merkle_verify(leaf: &[u8], proof: &MerkleProof, root: &Digest32) -> bool {
    let mut acc = leaf_hash(leaf);
    for (sibling, dir) in &proof.0 {
        acc = match dir {
            Direction::Left => node_hash(sibling, &acc),
            Direction::Right => node_hash(&acc, sibling),
        };
    }
    &acc == root
}

/// Build the canonical key/value leaf preimage: `0x02 || u32be(|k|) || k || u32be(32) || sha3_256(v)`.
pub fn kv_leaf_bytes(key: &[u8], value: &[u8]) -> Vec<u8> {
    let vhash = sha3_256(value);
    let mut out = Vec::with_capacity(1 + 4 + key.len() + 4 + 32);
    out.push(KV_LEAF_TAG);
    out.extend_from_slice(&(key.len() as u32).to_be_bytes());
    out.extend_from_slice(key);
    out.extend_from_slice(&32u32.to_be_bytes());
    out.extend_from_slice(vhash.as_bytes());
    out
}

/// Canonical key/value Merkle root: sorts by key, rejects duplicates, reuses list Merkle.
///
/// Permutation-invariant over the input map (§8 property 2).
pub fn kv_merkle_root(kv: &[(&[u8], &[u8])]) -> Result<Digest32> {
    let mut sorted: Vec<&(&[u8], &[u8])> = kv.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for w in sorted.windows(2) {
        if w[0].0 == w[1].0 {
            return Err(CodecError::DuplicateKey);
        }
    }
    let leaves: Vec<Vec<u8>> = sorted.iter().map(|(k, v)| kv_leaf_bytes(k, v)).collect();
    let refs: Vec<&[u8]> = leaves.iter().map(|l| l.as_slice()).collect();
    Ok(merkle_root(&refs))
}

/// Build an inclusion proof for `key` within a key/value map (sorted internally).
pub fn kv_merkle_proof(kv: &[(&[u8], &[u8])], key: &[u8]) -> Result<MerkleProof> {
    let mut sorted: Vec<&(&[u8], &[u8])> = kv.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for w in sorted.windows(2) {
        if w[0].0 == w[1].0 {
            return Err(CodecError::DuplicateKey);
        }
    }
    let idx = sorted
        .iter()
        .position(|(k, _)| *k == key)
        .ok_or_else(|| CodecError::InvalidEncoding("key not present in kv set".into()))?;
    let leaves: Vec<Vec<u8>> = sorted.iter().map(|(k, v)| kv_leaf_bytes(k, v)).collect();
    let refs: Vec<&[u8]> = leaves.iter().map(|l| l.as_slice()).collect();
    merkle_proof(&refs, idx)
}

/// Verify a key/value inclusion proof against an expected root.
pub fn kv_merkle_verify(key: &[u8], value: &[u8], proof: &MerkleProof, root: &Digest32) -> bool {
    let leaf = kv_leaf_bytes(key, value);
    merkle_verify(&leaf, proof, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merkle_of_three_matches_spec_vector() {
        // spec.md §8 scenario A
        let leaves: [&[u8]; 3] = [b"a", b"bb", b"ccc"];
        let h0 = leaf_hash(leaves[0]);
        let h1 = leaf_hash(leaves[1]);
        let h2 = leaf_hash(leaves[2]);
        let l1_0 = node_hash(&h0, &h1);
        let l1_1 = node_hash(&h2, &h2);
        let expected = node_hash(&l1_0, &l1_1);
        assert_eq!(merkle_root(&leaves), expected);
    }

    #[test]
    fn empty_merkle_root_is_leaf_hash_of_empty() {
        assert_eq!(merkle_root(&[]), leaf_hash(&[]));
    }

    #[test]
    fn kv_merkle_is_permutation_invariant() {
        let a: Vec<(&[u8], &[u8])> = vec![(b"k1", b"v1"), (b"k2", b"v2"), (b"k3", b"v3")];
        let b: Vec<(&[u8], &[u8])> = vec![(b"k3", b"v3"), (b"k1", b"v1"), (b"k2", b"v2")];
        assert_eq!(kv_merkle_root(&a).unwrap(), kv_merkle_root(&b).unwrap());
    }

    #[test]
    fn kv_merkle_rejects_duplicate_keys() {
        let kv: Vec<(&[u8], &[u8])> = vec![(b"k1", b"v1"), (b"k1", b"v2")];
        assert!(matches!(kv_merkle_root(&kv), Err(CodecError::DuplicateKey)));
    }

    #[test]
    fn list_merkle_is_order_sensitive() {
        let a: [&[u8]; 2] = [b"x", b"y"];
        let b: [&[u8]; 2] = [b"y", b"x"];
        assert_ne!(merkle_root(&a), merkle_root(&b));
    }

    #[test]
    fn inclusion_proof_roundtrips() {
        let leaves: [&[u8]; 5] = [b"a", b"b", b"c", b"d", b"e"];
        let root = merkle_root(&leaves);
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = merkle_proof(&leaves, i).unwrap();
            assert!(merkle_verify(leaf, &proof, &root));
        }
    }
}
