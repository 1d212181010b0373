// Path: crates/api/src/verifier.rs
//! The verifier-kind dispatch function type (component L, `spec.md` §4.14).
//! The registry that stores these lives in `animica-p2p`; this crate only
//! names the shape so callers on either side of the registry agree on it.

use animica_types::proof::ProofEnvelope;

/// A verification function for one proof kind: given a decoded envelope,
/// return whether it is valid. Implementations never panic; an
/// unverifiable-but-structurally-sound envelope should return `false`, not
/// abort the caller.
pub trait VerifyFn: Send + Sync {
    /// Verify `envelope`, returning `true` iff it is valid for this kind.
    fn verify(&self, envelope: &ProofEnvelope) -> bool;
}

impl<F> VerifyFn for F
where
    F: Fn(&ProofEnvelope) -> bool + Send + Sync,
{
    fn verify(&self, envelope: &ProofEnvelope) -> bool {
        self(envelope)
    }
}
