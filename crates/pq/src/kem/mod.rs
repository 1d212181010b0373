// Path: crates/pq/src/kem/mod.rs
//! ML-KEM-768 (Kyber768) key encapsulation (component F), generalized from
//! the teacher's multi-level `KyberKEM` dispatch down to the single KEM
//! algorithm the handshake uses.

use crate::registry::{AlgKind, AlgRegistry};
use animica_types::error::{CryptoError, Result};
use dcrypt::api::Kem as DcryptKemApi;
use dcrypt::kem::kyber::{Kyber768, KyberCiphertext, KyberPublicKey, KyberSecretKey};
use zeroize::Zeroizing;

fn kem_entry<'a>(registry: &'a AlgRegistry, alg_name: &str) -> Result<&'a crate::registry::AlgEntry> {
    registry
        .by_name(alg_name)
        .filter(|e| e.kind == AlgKind::Kem)
        .ok_or_else(|| CryptoError::AlgorithmUnavailable(alg_name.to_string()).into())
}

/// Generate a fresh KEM keypair for the named algorithm, returning
/// `(pk_bytes, sk_bytes)`.
pub fn keypair(registry: &AlgRegistry, alg_name: &str) -> Result<(Vec<u8>, Vec<u8>)> {
    let entry = kem_entry(registry, alg_name)?;
    match entry.name.as_str() {
        "mlkem768" => {
            let mut rng = rand::rngs::OsRng;
            let (pk, sk) = Kyber768::keypair(&mut rng).map_err(|e| CryptoError::KemFailure(e.to_string()))?;
            Ok((pk.to_bytes(), sk.to_bytes_zeroizing().to_vec()))
        }
        other => Err(CryptoError::AlgorithmUnavailable(other.to_string()).into()),
    }
}

/// Encapsulate against a peer's public key, returning `(ciphertext, shared_secret)`.
pub fn encapsulate(registry: &AlgRegistry, alg_name: &str, pk_bytes: &[u8]) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
    let entry = kem_entry(registry, alg_name)?;
    match entry.name.as_str() {
        "mlkem768" => {
            let pk = KyberPublicKey::from_bytes(pk_bytes).map_err(|e| CryptoError::KemFailure(e.to_string()))?;
            let mut rng = rand::rngs::OsRng;
            let (ct, ss) = Kyber768::encapsulate(&mut rng, &pk).map_err(|e| CryptoError::KemFailure(e.to_string()))?;
            Ok((ct.to_bytes(), ss.to_bytes_zeroizing()))
        }
        other => Err(CryptoError::AlgorithmUnavailable(other.to_string()).into()),
    }
}

/// Decapsulate a ciphertext using our secret key, returning the shared secret.
pub fn decapsulate(registry: &AlgRegistry, alg_name: &str, sk_bytes: &[u8], ct_bytes: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let entry = kem_entry(registry, alg_name)?;
    match entry.name.as_str() {
        "mlkem768" => {
            let sk = KyberSecretKey::from_bytes(sk_bytes).map_err(|e| CryptoError::KemFailure(e.to_string()))?;
            let ct = KyberCiphertext::from_bytes(ct_bytes).map_err(|e| CryptoError::KemFailure(e.to_string()))?;
            let ss = Kyber768::decapsulate(&sk, &ct).map_err(|e| CryptoError::KemFailure(e.to_string()))?;
            Ok(ss.to_bytes_zeroizing())
        }
        other => Err(CryptoError::AlgorithmUnavailable(other.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encapsulate_decapsulate_agree() {
        let registry = AlgRegistry::builtin();
        let (pk, sk) = keypair(&registry, "mlkem768").unwrap();
        let (ct, ss_sender) = encapsulate(&registry, "mlkem768", &pk).unwrap();
        let ss_receiver = decapsulate(&registry, "mlkem768", &sk, &ct).unwrap();
        assert_eq!(ss_sender.as_slice(), ss_receiver.as_slice());
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let registry = AlgRegistry::builtin();
        assert!(keypair(&registry, "mlkem1024").is_err());
    }
}
