// Path: crates/codec/src/state_root.rs
//! Canonical key/value state root (component D).
//!
//! Distinct from [`crate::hash`]'s generic list/KV Merkle: this tree embeds
//! the *raw value* in the leaf preimage (not a value hash), and its empty-set
//! sentinel is `sha3_256(DOMAIN_EMPTY)` rather than `leaf_hash(0x00 || "")`.
//! Both conventions are intentional and must not be unified — see
//! `original_source/core/chain/state_root.py`, which resolves what would
//! otherwise be an ambiguity in spec.md §9 Open Question 1.

use crate::digest::Digest32;
use crate::error::{CodecError, Result};
use sha3::{Digest, Sha3_256};

const DOMAIN_LEAF: &[u8] = b"animica/state/leaf:v1";
const DOMAIN_NODE: &[u8] = b"animica/state/node:v1";
const DOMAIN_EMPTY: &[u8] = b"animica/state/empty:v1";

fn sha3(data: &[u8]) -> Digest32 {
    let mut h = Sha3_256::new();
    h.update(data);
    Digest32::from_array(h.finalize().into())
}

fn state_leaf_hash(key: &[u8], value: &[u8]) -> Digest32 {
    let mut buf = Vec::with_capacity(DOMAIN_LEAF.len() + 4 + key.len() + 4 + value.len());
    buf.extend_from_slice(DOMAIN_LEAF);
    buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
    buf.extend_from_slice(value);
    sha3(&buf)
}

fn state_node_hash(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut buf = Vec::with_capacity(DOMAIN_NODE.len() + 64);
    buf.extend_from_slice(DOMAIN_NODE);
    buf.extend_from_slice(left.as_bytes());
    buf.extend_from_slice(right.as_bytes());
    sha3(&buf)
}

fn state_empty_root() -> Digest32 {
    sha3(DOMAIN_EMPTY)
}

/// Compute the canonical state root over a set of key/value pairs.
///
/// Keys are sorted bytewise ascending; duplicate keys are rejected.
pub fn compute_state_root(kv: &[(&[u8], &[u8])]) -> Result<Digest32> {
    if kv.is_empty() {
        return Ok(state_empty_root());
    }
    let mut sorted: Vec<&(&[u8], &[u8])> = kv.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for w in sorted.windows(2) {
        if w[0].0 == w[1].0 {
            return Err(CodecError::DuplicateKey);
        }
    }
    let mut level: Vec<Digest32> = sorted.iter().map(|(k, v)| state_leaf_hash(k, v)).collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut i = 0;
        while i < level.len() {
            let left = level[i];
            let right = if i + 1 < level.len() { level[i + 1] } else { level[i] };
            next.push(state_node_hash(&left, &right));
            i += 2;
        }
        level = next;
    }
    Ok(level[0])
}

/// Non-consensus diagnostic summary over a state root computation, mirroring
/// `original_source/core/chain/state_root.py`'s `StateRootDebug` dataclass.
#[derive(Debug, Clone)]
pub struct StateRootDebug {
    /// Number of key/value pairs folded into the root.
    pub count: usize,
    /// The lexicographically first key, if any.
    pub first_key: Option<Vec<u8>>,
    /// The lexicographically last key, if any.
    pub last_key: Option<Vec<u8>>,
    /// The computed root.
    pub root: Digest32,
}

/// Compute the state root and a diagnostic summary in one pass.
pub fn compute_state_root_debug(kv: &[(&[u8], &[u8])]) -> Result<StateRootDebug> {
    let root = compute_state_root(kv)?;
    if kv.is_empty() {
        return Ok(StateRootDebug {
            count: 0,
            first_key: None,
            last_key: None,
            root,
        });
    }
    let mut keys: Vec<&[u8]> = kv.iter().map(|(k, _)| *k).collect();
    keys.sort();
    Ok(StateRootDebug {
        count: kv.len(),
        first_key: keys.first().map(|k| k.to_vec()),
        last_key: keys.last().map(|k| k.to_vec()),
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_root_uses_distinct_domain_from_list_merkle() {
        let empty = compute_state_root(&[]).unwrap();
        let list_merkle_empty = crate::hash::merkle_root(&[]);
        assert_ne!(empty, list_merkle_empty);
        assert_eq!(empty, state_empty_root());
    }

    #[test]
    fn state_root_is_permutation_invariant() {
        let a: Vec<(&[u8], &[u8])> = vec![(b"alpha", b"1"), (b"beta", b"2"), (b"gamma", b"3")];
        let b: Vec<(&[u8], &[u8])> = vec![(b"gamma", b"3"), (b"alpha", b"1"), (b"beta", b"2")];
        assert_eq!(compute_state_root(&a).unwrap(), compute_state_root(&b).unwrap());
    }

    #[test]
    fn state_root_rejects_duplicate_keys() {
        let kv: Vec<(&[u8], &[u8])> = vec![(b"k", b"v1"), (b"k", b"v2")];
        assert!(matches!(compute_state_root(&kv), Err(CodecError::DuplicateKey)));
    }

    #[test]
    fn debug_summary_tracks_key_range() {
        let kv: Vec<(&[u8], &[u8])> = vec![(b"zeta", b"1"), (b"alpha", b"2")];
        let dbg = compute_state_root_debug(&kv).unwrap();
        assert_eq!(dbg.count, 2);
        assert_eq!(dbg.first_key.as_deref(), Some(&b"alpha"[..]));
        assert_eq!(dbg.last_key.as_deref(), Some(&b"zeta"[..]));
    }
}
