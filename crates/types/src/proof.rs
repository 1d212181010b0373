// Path: crates/types/src/proof.rs
//! PoIES proof envelope and typed wrappers (component B), grounded on
//! `original_source/core/types/proof.py`.

use crate::error::{Result, ValidationError};
use animica_codec::cbor::{canonical_cbor, from_canonical_cbor, CanonicalValue};
use animica_codec::digest::Digest32;
use animica_codec::hash::sha3_256;
use serde::{Deserialize, Serialize};

/// The five proof kinds spec.md §3.3/§5 registers at genesis. Additional
/// kinds may be registered later by governance (see `ChainParams`); this
/// enum only names the ones the protocol ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProofType {
    /// Classical hash-based useful-work share (θ-gated SHA3 scan).
    HashShare = 0,
    /// Reference to an externally verified AI/ML inference proof.
    AIProofRef = 1,
    /// Reference to an externally verified quantum-computation proof.
    QuantumProofRef = 2,
    /// Storage-provider liveness heartbeat.
    StorageHeartbeat = 3,
    /// Reference to a verifiable-delay-function proof.
    VDFProofRef = 4,
}

impl ProofType {
    /// Parse a numeric type id into a known `ProofType`.
    pub fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => ProofType::HashShare,
            1 => ProofType::AIProofRef,
            2 => ProofType::QuantumProofRef,
            3 => ProofType::StorageHeartbeat,
            4 => ProofType::VDFProofRef,
            other => return Err(ValidationError::UnknownType(other as u64).into()),
        })
    }
}

/// Schema version for `ProofEnvelope`.
pub const PROOF_ENVELOPE_VERSION: u8 = 1;

/// Generic proof envelope. `body` is opaque here; typed wrappers below fix
/// `type_id` and hand back a typed view without parsing `body` themselves —
/// parsing is the verifier registry's job (component L).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofEnvelope {
    /// Schema version, currently always 1.
    pub v: u8,
    /// Numeric proof-type discriminant.
    pub type_id: u8,
    /// Anti-replay nullifier, unique per (miner, job, type) in well-formed proofs.
    pub nullifier: Digest32,
    /// Opaque, type-specific payload.
    pub body: Vec<u8>,
}

/// Upper bound on `ProofEnvelope::body`, independent of any specific proof
/// kind's actual payload shape.
pub const MAX_BODY_BYTES: usize = 1 << 20;

impl ProofEnvelope {
    /// Construct a new envelope, validating its schema version and body bound.
    pub fn new(type_id: u8, nullifier: Digest32, body: Vec<u8>) -> Result<Self> {
        if body.len() > MAX_BODY_BYTES {
            return Err(ValidationError::InvalidLength(format!(
                "proof body exceeds {MAX_BODY_BYTES} bytes"
            ))
            .into());
        }
        Ok(ProofEnvelope {
            v: PROOF_ENVELOPE_VERSION,
            type_id,
            nullifier,
            body,
        })
    }

    /// Canonical map view, used for both hashing (proofsRoot leaves) and CBOR.
    pub fn to_obj(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("v", CanonicalValue::Int(self.v as i128)),
            ("typeId", CanonicalValue::Int(self.type_id as i128)),
            ("nullifier", CanonicalValue::Bytes(self.nullifier.as_bytes().to_vec())),
            ("body", CanonicalValue::Bytes(self.body.clone())),
        ])
    }

    /// Parse an envelope back out of its canonical map view.
    pub fn from_obj(v: &CanonicalValue) -> Result<Self> {
        let map = match v {
            CanonicalValue::Map(m) => m,
            _ => return Err(ValidationError::InvalidEncoding("proof envelope is not a map".into()).into()),
        };
        let get = |k: &str| -> Result<&CanonicalValue> {
            map.get(k)
                .ok_or_else(|| ValidationError::InvalidEncoding(format!("missing field {k}")).into())
        };
        let version = match get("v")? {
            CanonicalValue::Int(i) if *i >= 0 => *i as u8,
            _ => return Err(ValidationError::InvalidEncoding("v is not a non-negative int".into()).into()),
        };
        let type_id = match get("typeId")? {
            CanonicalValue::Int(i) if *i >= 0 => *i as u8,
            _ => return Err(ValidationError::InvalidEncoding("typeId is not a non-negative int".into()).into()),
        };
        let nullifier = match get("nullifier")? {
            CanonicalValue::Bytes(b) => Digest32::from_slice(b).map_err(ValidationError::from)?,
            _ => return Err(ValidationError::InvalidEncoding("nullifier is not bytes".into()).into()),
        };
        let body = match get("body")? {
            CanonicalValue::Bytes(b) => b.clone(),
            _ => return Err(ValidationError::InvalidEncoding("body is not bytes".into()).into()),
        };
        if version != PROOF_ENVELOPE_VERSION {
            return Err(ValidationError::BadEnvelope(format!("unsupported envelope version {version}")).into());
        }
        ProofEnvelope::new(type_id, nullifier, body)
    }

    /// Encode to canonical CBOR bytes. This is also what `proofsRoot` leaves
    /// hash over — the envelope, not the raw body.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(canonical_cbor(&self.to_obj())?)
    }

    /// Decode from canonical CBOR bytes.
    pub fn from_cbor(b: &[u8]) -> Result<Self> {
        let v = from_canonical_cbor(b)?;
        ProofEnvelope::from_obj(&v)
    }

    /// Non-consensus convenience identifier for logs/indices:
    /// `sha3_256(typeId || nullifier || sha3_256(body))`.
    pub fn envelope_id(&self) -> Digest32 {
        let body_hash = sha3_256(&self.body);
        let mut preimage = Vec::with_capacity(1 + 32 + 32);
        preimage.push(self.type_id);
        preimage.extend_from_slice(self.nullifier.as_bytes());
        preimage.extend_from_slice(body_hash.as_bytes());
        sha3_256(&preimage)
    }
}

macro_rules! typed_proof_wrapper {
    ($name:ident, $type_id:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(ProofEnvelope);

        impl $name {
            /// Wrap a generic envelope, rejecting one tagged with a different `type_id`.
            pub fn wrap(envelope: ProofEnvelope) -> Result<Self> {
                if envelope.type_id != $type_id {
                    return Err(ValidationError::BadEnvelope(format!(
                        "expected type id {}, got {}",
                        $type_id, envelope.type_id
                    ))
                    .into());
                }
                Ok(Self(envelope))
            }

            /// Build one directly from a nullifier and body.
            pub fn new(nullifier: Digest32, body: Vec<u8>) -> Result<Self> {
                Ok(Self(ProofEnvelope::new($type_id, nullifier, body)?))
            }

            /// Borrow the underlying generic envelope.
            pub fn envelope(&self) -> &ProofEnvelope {
                &self.0
            }

            /// Consume this wrapper, returning the underlying generic envelope.
            pub fn into_envelope(self) -> ProofEnvelope {
                self.0
            }
        }
    };
}

typed_proof_wrapper!(HashShare, 0, "A `ProofEnvelope` known to carry a classical hash-share proof.");
typed_proof_wrapper!(AIProofRef, 1, "A `ProofEnvelope` known to carry an AI-inference proof reference.");
typed_proof_wrapper!(
    QuantumProofRef,
    2,
    "A `ProofEnvelope` known to carry a quantum-computation proof reference."
);
typed_proof_wrapper!(
    StorageHeartbeat,
    3,
    "A `ProofEnvelope` known to carry a storage-provider liveness heartbeat."
);
typed_proof_wrapper!(VDFProofRef, 4, "A `ProofEnvelope` known to carry a verifiable-delay-function proof reference.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_wrapper_rejects_wrong_type_id() {
        let env = ProofEnvelope::new(1, Digest32::ZERO, vec![1, 2, 3]).unwrap();
        assert!(HashShare::wrap(env.clone()).is_err());
        assert!(AIProofRef::wrap(env).is_ok());
    }

    #[test]
    fn envelope_roundtrips_through_cbor() {
        let env = ProofEnvelope::new(0, Digest32::from_array([7; 32]), vec![9, 9, 9]).unwrap();
        let enc = env.to_cbor().unwrap();
        let dec = ProofEnvelope::from_cbor(&enc).unwrap();
        assert_eq!(env, dec);
    }

    #[test]
    fn envelope_id_changes_with_body() {
        let a = ProofEnvelope::new(0, Digest32::ZERO, vec![1]).unwrap();
        let b = ProofEnvelope::new(0, Digest32::ZERO, vec![2]).unwrap();
        assert_ne!(a.envelope_id(), b.envelope_id());
    }

    #[test]
    fn proof_type_rejects_unknown_discriminant() {
        assert!(ProofType::from_u8(5).is_err());
        assert!(ProofType::from_u8(0).is_ok());
    }
}
