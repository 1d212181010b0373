// Path: crates/pq/src/dev_fallback.rs
//! An insecure, symmetric-key stand-in for sign/verify used only to unblock
//! local development when a real PQ backend is unavailable (e.g. a
//! cross-compiled target missing `dcrypt`'s assembly). Gated three ways: the
//! `pq-dev-fallback` Cargo feature, a debug build, and one of two env vars.
//! None of this is cryptographically meaningful.

use animica_types::error::{CryptoError, Result};
use sha3::{Digest, Sha3_256};

const ENV_ALLOW: &str = "ANIMICA_ALLOW_PQ_PURE_FALLBACK";
const ENV_UNSAFE: &str = "ANIMICA_UNSAFE_PQ_FAKE";

/// Whether the dev fallback may be used in this process: requires the
/// `pq-dev-fallback` feature, a debug build, and one of the two env vars set
/// to a non-empty value.
pub fn is_enabled() -> bool {
    if !cfg!(feature = "pq-dev-fallback") {
        return false;
    }
    if !cfg!(debug_assertions) {
        return false;
    }
    env_set(ENV_ALLOW) || env_set(ENV_UNSAFE)
}

fn env_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Refuse unless [`is_enabled`], logging a warning when it proceeds.
pub fn guard() -> Result<()> {
    if !is_enabled() {
        return Err(CryptoError::AlgorithmUnavailable("pq-dev-fallback disabled".into()).into());
    }
    tracing::warn!(
        target: "animica_pq::dev_fallback",
        "using insecure PQ dev fallback; never enable this in a release build"
    );
    Ok(())
}

/// A fake 32-byte "keypair": both halves are random and otherwise unrelated
/// to each other except via the symmetric `fallback_sign`/`fallback_verify`
/// construction below, which treats the secret as a MAC key.
pub fn fallback_keypair() -> Result<(Vec<u8>, Vec<u8>)> {
    guard()?;
    use rand::RngCore;
    let mut sk = vec![0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut sk);
    let pk = sk.clone();
    Ok((pk, sk))
}

/// `sig = SHA3-256(sk || message)`. Verifiable only by a holder of `sk`
/// (i.e. `pk == sk` here), not a real asymmetric signature.
pub fn fallback_sign(sk: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    guard()?;
    let mut h = Sha3_256::new();
    h.update(sk);
    h.update(message);
    Ok(h.finalize().to_vec())
}

/// Recompute the fake MAC using `pk` as the key and compare.
pub fn fallback_verify(pk: &[u8], sig: &[u8], message: &[u8]) -> Result<bool> {
    guard()?;
    let mut h = Sha3_256::new();
    h.update(pk);
    h.update(message);
    let expected = h.finalize();
    Ok(expected.as_slice() == sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default_even_with_feature_and_debug() {
        std::env::remove_var(ENV_ALLOW);
        std::env::remove_var(ENV_UNSAFE);
        assert!(!is_enabled());
        assert!(fallback_keypair().is_err());
    }

    #[test]
    fn sign_verify_agree_when_enabled_via_env() {
        std::env::set_var(ENV_ALLOW, "1");
        if cfg!(feature = "pq-dev-fallback") {
            let (pk, sk) = fallback_keypair().unwrap();
            let sig = fallback_sign(&sk, b"m").unwrap();
            assert!(fallback_verify(&pk, &sig, b"m").unwrap());
            assert!(!fallback_verify(&pk, &sig, b"other").unwrap());
        }
        std::env::remove_var(ENV_ALLOW);
    }
}
