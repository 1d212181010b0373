// Path: crates/p2p/src/registry.rs
//! The verifier-kind registry (`spec.md` §4.14, component L): a threadsafe
//! string-to-callable map dispatching `envelope.kind` (here, the proof
//! envelope's `typeId` rendered as its registered name) to a
//! [`VerifyFn`] supplied by an external full-verification adapter.

use animica_codec::error::ErrorCode;
use animica_types::proof::ProofEnvelope;
use animica_api::VerifyFn;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by registry operations (`spec.md` §4.14).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `register` was called with a kind that is already bound.
    #[error("verifier kind already registered: {0}")]
    AlreadyRegistered(String),
    /// `unregister`/`resolve` was called with a kind that has no binding.
    #[error("verifier kind not registered: {0}")]
    NotRegistered(String),
    /// A caller-supplied verifier spec failed to construct (e.g. a dynamic
    /// loader failed to resolve its backing implementation).
    #[error("failed to import verifier for kind {kind}: {reason}")]
    ImportFailure {
        /// The kind whose import failed.
        kind: String,
        /// Why the import failed.
        reason: String,
    },
    /// A caller-supplied envelope lacked a field the registry's dispatch needs.
    #[error("missing field: {0}")]
    MissingField(String),
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            RegistryError::AlreadyRegistered(_) => "P2P_VERIFIER_ALREADY_REGISTERED",
            RegistryError::NotRegistered(_) => "P2P_VERIFIER_NOT_REGISTERED",
            RegistryError::ImportFailure { .. } => "P2P_VERIFIER_IMPORT_FAILURE",
            RegistryError::MissingField(_) => "P2P_VERIFIER_MISSING_FIELD",
        }
    }
}

/// Maps a proof kind name (e.g. `"hash-share"`, `"ai-proof"`) to a
/// [`VerifyFn`] able to fully verify envelopes of that kind. Registration is
/// expected to happen once at startup per kind a deployment supports;
/// `verify` is the hot path, called per gossiped envelope.
#[derive(Default)]
pub struct VerifierRegistry {
    kinds: DashMap<String, Arc<dyn VerifyFn>>,
}

impl VerifierRegistry {
    /// Construct an empty registry.
    pub fn new() -> Self {
        VerifierRegistry {
            kinds: DashMap::new(),
        }
    }

    /// Bind `kind` to `verifier`, rejecting a kind that is already bound.
    pub fn register(&self, kind: impl Into<String>, verifier: Arc<dyn VerifyFn>) -> Result<(), RegistryError> {
        let kind = kind.into();
        if self.kinds.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.kinds.insert(kind, verifier);
        Ok(())
    }

    /// Remove `kind`'s binding, rejecting an unregistered kind.
    pub fn unregister(&self, kind: &str) -> Result<(), RegistryError> {
        self.kinds
            .remove(kind)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotRegistered(kind.to_string()))
    }

    /// List every currently-registered kind name.
    pub fn list_kinds(&self) -> Vec<String> {
        self.kinds.iter().map(|e| e.key().clone()).collect()
    }

    /// Resolve `kind` to its bound verifier, without invoking it.
    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn VerifyFn>, RegistryError> {
        self.kinds
            .get(kind)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| RegistryError::NotRegistered(kind.to_string()))
    }

    /// Dispatch `envelope` to the verifier bound to `kind`, returning its
    /// verdict. `kind` is supplied by the caller rather than derived from
    /// the envelope, since `ProofEnvelope` (`spec.md` §3.3) identifies a
    /// proof by numeric `typeId`, not by a string kind — the mapping from
    /// `typeId` to a registered kind name is the caller's policy
    /// (`poiesPolicyRoot`), not this registry's concern.
    pub fn verify(&self, kind: &str, envelope: &ProofEnvelope) -> Result<bool, RegistryError> {
        let verifier = self.resolve(kind)?;
        Ok(verifier.verify(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animica_codec::digest::Digest32;

    fn always_true() -> Arc<dyn VerifyFn> {
        Arc::new(|_env: &ProofEnvelope| true)
    }

    fn always_false() -> Arc<dyn VerifyFn> {
        Arc::new(|_env: &ProofEnvelope| false)
    }

    #[test]
    fn register_resolve_and_verify_roundtrip() {
        let registry = VerifierRegistry::new();
        registry.register("hash-share", always_true()).unwrap();
        let env = ProofEnvelope::new(0, Digest32::ZERO, vec![]).unwrap();
        assert!(registry.verify("hash-share", &env).unwrap());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = VerifierRegistry::new();
        registry.register("hash-share", always_true()).unwrap();
        assert!(matches!(
            registry.register("hash-share", always_false()),
            Err(RegistryError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn unregistered_kind_is_rejected() {
        let registry = VerifierRegistry::new();
        let env = ProofEnvelope::new(0, Digest32::ZERO, vec![]).unwrap();
        assert!(matches!(registry.verify("nope", &env), Err(RegistryError::NotRegistered(_))));
    }

    #[test]
    fn unregister_then_list_is_empty() {
        let registry = VerifierRegistry::new();
        registry.register("vdf", always_false()).unwrap();
        assert_eq!(registry.list_kinds(), vec!["vdf".to_string()]);
        registry.unregister("vdf").unwrap();
        assert!(registry.list_kinds().is_empty());
        assert!(matches!(registry.unregister("vdf"), Err(RegistryError::NotRegistered(_))));
    }
}
