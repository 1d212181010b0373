// Path: crates/pq/src/sign/mod.rs
//! Domain-separated SignBytes preimage and sign/verify dispatch over
//! Dilithium3 and SPHINCS+-SHAKE-128s (`spec.md` §4.6), generalized from the
//! teacher's multi-level `DilithiumScheme` dispatch down to the exact two
//! signature algorithms named here.

use crate::registry::{AlgKind, AlgRegistry};
use animica_codec::digest::Digest64;
use animica_codec::varint::append_lp;
use animica_types::error::{AnimicaError, CryptoError, Result};
use dcrypt::sign::dilithium::{
    Dilithium3, DilithiumPublicKey, DilithiumSecretKey, DilithiumSignatureData,
};
use dcrypt::sign::sphincsplus::{
    SphincsPublicKey, SphincsSecretKey, SphincsShake128s, SphincsSignatureData,
};
use sha3::{Digest, Sha3_256, Sha3_512};

const SIGN_TAG: &[u8] = b"animica:sign/v1";

/// Which hash the signature preimage was prehashed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prehash {
    /// SHA3-256 prehash.
    Sha3_256,
    /// SHA3-512 prehash (the default).
    Sha3_512,
}

/// A domain-separated signature envelope (`spec.md` §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    /// Registered numeric algorithm id.
    pub alg_id: u16,
    /// Registered algorithm name, carried for human-readable diagnostics.
    pub alg_name: String,
    /// The domain string this signature is bound to.
    pub domain: String,
    /// Which prehash produced the signed preimage.
    pub prehash: Prehash,
    /// The raw signature bytes.
    pub sig: Vec<u8>,
}

/// Build the canonical SignBytes preimage:
/// `LP(TAG) || LP(domain) || LP(chainId?) || LP(uvar(algId)) || LP(context) || LP(message)`,
/// then SHA3-512 it (the default prehash).
pub fn sign_bytes_preimage(domain: &str, chain_id: Option<u64>, alg_id: u16, context: &[u8], message: &[u8]) -> Digest64 {
    let raw = raw_preimage(domain, chain_id, alg_id, context, message);
    let mut h = Sha3_512::new();
    h.update(&raw);
    Digest64::from_array(h.finalize().into())
}

fn raw_preimage(domain: &str, chain_id: Option<u64>, alg_id: u16, context: &[u8], message: &[u8]) -> Vec<u8> {
    let mut chain_id_bytes = Vec::new();
    if let Some(cid) = chain_id {
        animica_codec::varint::write_uvarint(cid, &mut chain_id_bytes);
    }
    let mut alg_id_bytes = Vec::new();
    animica_codec::varint::write_uvarint(u64::from(alg_id), &mut alg_id_bytes);

    let mut raw = Vec::new();
    append_lp(&mut raw, SIGN_TAG);
    append_lp(&mut raw, domain.as_bytes());
    append_lp(&mut raw, &chain_id_bytes);
    append_lp(&mut raw, &alg_id_bytes);
    append_lp(&mut raw, context);
    append_lp(&mut raw, message);
    raw
}

fn prehash_bytes(preimage: &[u8], prehash: Prehash) -> Vec<u8> {
    match prehash {
        Prehash::Sha3_256 => {
            let mut h = Sha3_256::new();
            h.update(preimage);
            h.finalize().to_vec()
        }
        Prehash::Sha3_512 => preimage.to_vec(),
    }
}

fn sig_entry<'a>(registry: &'a AlgRegistry, alg_name: &str) -> Result<&'a crate::registry::AlgEntry> {
    registry
        .by_name(alg_name)
        .filter(|e| e.kind == AlgKind::Sig)
        .ok_or_else(|| CryptoError::AlgorithmUnavailable(alg_name.to_string()).into())
}

/// Generate a fresh keypair for the named signature algorithm, returning
/// `(pk_bytes, sk_bytes)`.
pub fn keypair(registry: &AlgRegistry, alg_name: &str) -> Result<(Vec<u8>, Vec<u8>)> {
    let entry = sig_entry(registry, alg_name)?;
    let mut rng = rand::rngs::OsRng;
    match entry.name.as_str() {
        "dilithium3" => {
            let (pk, sk) = Dilithium3::keypair(&mut rng).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            Ok((pk.to_bytes().to_vec(), sk.to_bytes().to_vec()))
        }
        "sphincs-shake-128s" => {
            let (pk, sk) =
                SphincsShake128s::keypair(&mut rng).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            Ok((pk.to_bytes().to_vec(), sk.to_bytes().to_vec()))
        }
        other => Err(CryptoError::AlgorithmUnavailable(other.to_string()).into()),
    }
}

/// Sign a message, returning a complete [`SignatureEnvelope`].
///
/// The SignBytes preimage is derived internally from `(domain, chain_id,
/// alg_id, context, message)`; callers never construct it themselves.
#[allow(clippy::too_many_arguments)]
pub fn sign(
    registry: &AlgRegistry,
    alg_name: &str,
    sk_bytes: &[u8],
    domain: &str,
    chain_id: Option<u64>,
    context: &[u8],
    message: &[u8],
    prehash: Prehash,
) -> Result<SignatureEnvelope> {
    let entry = sig_entry(registry, alg_name)?;
    let preimage = sign_bytes_preimage(domain, chain_id, entry.id, context, message);
    let to_sign = prehash_bytes(preimage.as_bytes(), prehash);

    let sig = match entry.name.as_str() {
        "dilithium3" => {
            let sk = DilithiumSecretKey::from_bytes(sk_bytes).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            let sig = Dilithium3::sign(&to_sign, &sk).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            sig.to_bytes().to_vec()
        }
        "sphincs-shake-128s" => {
            let sk = SphincsSecretKey::from_bytes(sk_bytes).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            let sig =
                SphincsShake128s::sign(&to_sign, &sk).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            sig.to_bytes().to_vec()
        }
        other => return Err(CryptoError::AlgorithmUnavailable(other.to_string()).into()),
    };

    Ok(SignatureEnvelope {
        alg_id: entry.id,
        alg_name: entry.name.clone(),
        domain: domain.to_string(),
        prehash,
        sig,
    })
}

/// Verify a [`SignatureEnvelope`] against a public key and the expected
/// `(domain, chain_id, context, message)`. In strict mode, a mismatched
/// `domain` or algorithm between the envelope and the caller's expectation is
/// rejected before any cryptographic verification runs (testable property 7).
#[allow(clippy::too_many_arguments)]
pub fn verify(
    registry: &AlgRegistry,
    pk_bytes: &[u8],
    envelope: &SignatureEnvelope,
    expected_domain: &str,
    chain_id: Option<u64>,
    context: &[u8],
    message: &[u8],
    strict: bool,
) -> Result<bool> {
    if strict && envelope.domain != expected_domain {
        return Err(CryptoError::DomainMismatch {
            expected: expected_domain.to_string(),
            got: envelope.domain.clone(),
        }
        .into());
    }
    let entry = registry
        .by_id(envelope.alg_id)
        .filter(|e| e.kind == AlgKind::Sig)
        .ok_or_else(|| CryptoError::AlgorithmUnavailable(envelope.alg_name.clone()))?;
    if strict && entry.name != envelope.alg_name {
        return Err(CryptoError::AlgMismatch {
            expected: entry.id,
            got: envelope.alg_id,
        }
        .into());
    }

    let preimage = sign_bytes_preimage(&envelope.domain, chain_id, entry.id, context, message);
    let to_verify = prehash_bytes(preimage.as_bytes(), envelope.prehash);

    let ok = match entry.name.as_str() {
        "dilithium3" => {
            let pk = DilithiumPublicKey::from_bytes(pk_bytes).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            let sig = DilithiumSignatureData::from_bytes(&envelope.sig)
                .map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            Dilithium3::verify(&to_verify, &sig, &pk).is_ok()
        }
        "sphincs-shake-128s" => {
            let pk = SphincsPublicKey::from_bytes(pk_bytes).map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            let sig = SphincsSignatureData::from_bytes(&envelope.sig)
                .map_err(|e| CryptoError::BackendFailure(e.to_string()))?;
            SphincsShake128s::verify(&to_verify, &sig, &pk).is_ok()
        }
        other => return Err(CryptoError::AlgorithmUnavailable(other.to_string()).into()),
    };
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preimage_changes_with_domain_and_chain_id() {
        let a = sign_bytes_preimage("tx/sign", Some(1), 0x0103, b"", b"m");
        let b = sign_bytes_preimage("other", Some(1), 0x0103, b"", b"m");
        let c = sign_bytes_preimage("tx/sign", Some(2), 0x0103, b"", b"m");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn preimage_with_no_chain_id_is_stable() {
        let a = sign_bytes_preimage("tx/sign", None, 0x0103, b"", b"m");
        let b = sign_bytes_preimage("tx/sign", None, 0x0103, b"", b"m");
        assert_eq!(a, b);
    }

    #[test]
    fn sign_verify_roundtrip_dilithium3() {
        let registry = AlgRegistry::builtin();
        let (pk, sk) = keypair(&registry, "dilithium3").unwrap();
        let env = sign(&registry, "dilithium3", &sk, "tx/sign", Some(99), b"", b"tx-payload", Prehash::Sha3_512).unwrap();
        assert!(verify(&registry, &pk, &env, "tx/sign", Some(99), b"", b"tx-payload", true).unwrap());
        assert!(!verify(&registry, &pk, &env, "tx/sign", Some(99), b"", b"tampered", true).unwrap());
    }

    #[test]
    fn strict_verify_rejects_domain_mismatch() {
        let registry = AlgRegistry::builtin();
        let (pk, sk) = keypair(&registry, "dilithium3").unwrap();
        let env = sign(&registry, "dilithium3", &sk, "tx/sign", Some(99), b"", b"m", Prehash::Sha3_512).unwrap();
        let result = verify(&registry, &pk, &env, "generic", Some(99), b"", b"m", true);
        assert!(matches!(
            result,
            Err(AnimicaError::Crypto(CryptoError::DomainMismatch { .. }))
        ));
    }
}
