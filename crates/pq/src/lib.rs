// Path: crates/pq/src/lib.rs
//! Post-quantum envelope for Animica (components E/F): the algorithm
//! registry, bech32m address derivation, domain-separated sign/verify and
//! KEM dispatch over Dilithium3 / SPHINCS+-SHAKE-128s / ML-KEM-768, and the
//! Noise-like PQ handshake.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

/// Bech32m address derivation over registered algorithm ids.
pub mod address;
/// Dev-only insecure fallback, gated by a Cargo feature and two env vars.
pub mod dev_fallback;
/// The Noise-like PQ handshake state machine and key schedule.
pub mod handshake;
/// ML-KEM-768 (Kyber768) key encapsulation.
pub mod kem;
/// Numeric algorithm-id registry, loaded from a TOML policy file.
pub mod registry;
/// Domain-separated SignBytes preimage and Dilithium3/SPHINCS+ dispatch.
pub mod sign;

pub use registry::{AlgEntry, AlgKind, AlgRegistry};
