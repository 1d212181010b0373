// Path: crates/pq/src/address.rs
//! Animica address derivation (`spec.md` §3.1/§4.5): a thin wrapper over
//! `animica-codec`'s bech32m primitives, fixing the HRP and payload shape.

use crate::registry::AlgRegistry;
use animica_codec::bech32m;
use animica_codec::digest::Digest32;
use animica_types::error::{CryptoError, Result};

/// Derive an Animica address for a public key under a registered algorithm.
pub fn derive(registry: &AlgRegistry, alg_name: &str, pubkey: &[u8]) -> Result<String> {
    let entry = registry
        .by_name(alg_name)
        .ok_or_else(|| CryptoError::AlgorithmUnavailable(alg_name.to_string()))?;
    if pubkey.len() != entry.pk_len {
        return Err(CryptoError::InvalidKeyLength {
            expected: entry.pk_len,
            got: pubkey.len(),
        }
        .into());
    }
    Ok(bech32m::derive_address(entry.id, pubkey)?)
}

/// Decode an Animica address, resolving its algorithm id against `registry`.
pub fn decode(registry: &AlgRegistry, addr: &str) -> Result<(String, Digest32)> {
    let (alg_id, digest) = bech32m::decode_address(addr)?;
    let entry = registry
        .by_id(alg_id)
        .ok_or_else(|| CryptoError::AlgorithmUnavailable(format!("alg id {alg_id}")))?;
    Ok((entry.name.clone(), digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_and_decode_roundtrip() {
        let reg = AlgRegistry::builtin();
        let pk = vec![0x01u8; 1952];
        let addr = derive(&reg, "dilithium3", &pk).unwrap();
        let (name, digest) = decode(&reg, &addr).unwrap();
        assert_eq!(name, "dilithium3");
        assert_eq!(digest, animica_codec::hash::sha3_256(&pk));
    }

    #[test]
    fn derive_rejects_wrong_key_length() {
        let reg = AlgRegistry::builtin();
        assert!(derive(&reg, "dilithium3", &[0u8; 10]).is_err());
    }
}
