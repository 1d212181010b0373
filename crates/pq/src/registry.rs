// Path: crates/pq/src/registry.rs
//! Numeric PQ algorithm-id registry (component E), loaded from a TOML policy
//! file the same way the teacher's `GenesisBuilder` loads chain config.

use animica_types::error::{CryptoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a registered algorithm is a signature scheme or a KEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgKind {
    /// A signature algorithm (Dilithium3, SPHINCS+-SHAKE-128s, ...).
    Sig,
    /// A key-encapsulation mechanism (ML-KEM-768, ...).
    Kem,
}

/// One registered algorithm's numeric id, name, and size metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgEntry {
    /// Stable numeric id, unique within its `kind`.
    pub id: u16,
    /// Canonical name, e.g. `"dilithium3"`, `"mlkem768"`.
    pub name: String,
    /// Sig or Kem.
    pub kind: AlgKind,
    /// Public key length in bytes.
    pub pk_len: usize,
    /// Secret/private key length in bytes.
    pub sk_len: usize,
    /// Signature length in bytes, for `kind == Sig`.
    #[serde(default)]
    pub sig_len: Option<usize>,
    /// Ciphertext length in bytes, for `kind == Kem`.
    #[serde(default)]
    pub ct_len: Option<usize>,
    /// Shared-secret length in bytes, for `kind == Kem`.
    #[serde(default)]
    pub ss_len: Option<usize>,
    /// Informal security class label (e.g. `"NIST-3"`).
    pub security_class: String,
    /// Backend/provider hint (e.g. `"dcrypt"`).
    pub provider: String,
}

/// On-disk policy file shape: a flat list of entries plus default choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    default_sig: Option<String>,
    #[serde(default)]
    default_kem: Option<String>,
    #[serde(rename = "alg")]
    algs: Vec<AlgEntry>,
}

/// The loaded, effectively-immutable algorithm table. `spec.md` §3.6:
/// signature and KEM algorithm ids are disjoint namespaces; names and ids are
/// each unique within the whole table.
#[derive(Debug, Clone)]
pub struct AlgRegistry {
    by_id: HashMap<u16, AlgEntry>,
    by_name: HashMap<String, u16>,
    default_sig: Option<u16>,
    default_kem: Option<u16>,
}

impl AlgRegistry {
    /// Build a registry from a list of entries, rejecting duplicate ids or
    /// names and cross-kind id collisions.
    pub fn from_entries(entries: Vec<AlgEntry>, default_sig: Option<&str>, default_kem: Option<&str>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());
        for entry in entries {
            if by_id.contains_key(&entry.id) {
                return Err(CryptoError::AlgorithmUnavailable(format!(
                    "duplicate algorithm id {}",
                    entry.id
                ))
                .into());
            }
            if by_name.contains_key(&entry.name) {
                return Err(CryptoError::AlgorithmUnavailable(format!(
                    "duplicate algorithm name {}",
                    entry.name
                ))
                .into());
            }
            by_name.insert(entry.name.clone(), entry.id);
            by_id.insert(entry.id, entry);
        }
        let resolve = |name: Option<&str>| -> Option<u16> { name.and_then(|n| by_name.get(n).copied()) };
        Ok(AlgRegistry {
            default_sig: resolve(default_sig),
            default_kem: resolve(default_kem),
            by_id,
            by_name,
        })
    }

    /// Parse a registry from its TOML policy-file representation.
    pub fn from_toml(s: &str) -> Result<Self> {
        let file: PolicyFile = toml::from_str(s)
            .map_err(|e| CryptoError::AlgorithmUnavailable(format!("bad policy toml: {e}")))?;
        Self::from_entries(file.algs, file.default_sig.as_deref(), file.default_kem.as_deref())
    }

    /// The registry shipped with this crate, covering exactly the three
    /// algorithms `spec.md` names.
    pub fn builtin() -> Self {
        #[allow(clippy::unwrap_used)]
        Self::from_entries(
            vec![
                AlgEntry {
                    id: 0x0103,
                    name: "dilithium3".into(),
                    kind: AlgKind::Sig,
                    pk_len: 1952,
                    sk_len: 4032,
                    sig_len: Some(3309),
                    ct_len: None,
                    ss_len: None,
                    security_class: "NIST-3".into(),
                    provider: "dcrypt".into(),
                },
                AlgEntry {
                    id: 0x0201,
                    name: "sphincs-shake-128s".into(),
                    kind: AlgKind::Sig,
                    pk_len: 32,
                    sk_len: 64,
                    sig_len: Some(7856),
                    ct_len: None,
                    ss_len: None,
                    security_class: "NIST-1".into(),
                    provider: "dcrypt".into(),
                },
                AlgEntry {
                    id: 0x0301,
                    name: "mlkem768".into(),
                    kind: AlgKind::Kem,
                    pk_len: 1184,
                    sk_len: 2400,
                    sig_len: None,
                    ct_len: Some(1088),
                    ss_len: Some(32),
                    security_class: "NIST-3".into(),
                    provider: "dcrypt".into(),
                },
            ],
            Some("dilithium3"),
            Some("mlkem768"),
        )
        .unwrap()
    }

    /// Look up an entry by numeric id.
    pub fn by_id(&self, id: u16) -> Option<&AlgEntry> {
        self.by_id.get(&id)
    }

    /// Look up an entry by canonical name.
    pub fn by_name(&self, name: &str) -> Option<&AlgEntry> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// The default signing algorithm: Dilithium3 when registered, else
    /// SPHINCS+-SHAKE-128s (`spec.md` §4.5).
    pub fn default_sig(&self) -> Option<&AlgEntry> {
        self.default_sig.and_then(|id| self.by_id.get(&id))
    }

    /// The default KEM algorithm (ML-KEM-768).
    pub fn default_kem(&self) -> Option<&AlgEntry> {
        self.default_kem.and_then(|id| self.by_id.get(&id))
    }

    /// All registered entries of a given kind.
    pub fn by_kind(&self, kind: AlgKind) -> Vec<&AlgEntry> {
        self.by_id.values().filter(|e| e.kind == kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_disjoints_sig_and_kem_ids() {
        let reg = AlgRegistry::builtin();
        let sigs: Vec<u16> = reg.by_kind(AlgKind::Sig).iter().map(|e| e.id).collect();
        let kems: Vec<u16> = reg.by_kind(AlgKind::Kem).iter().map(|e| e.id).collect();
        for id in &sigs {
            assert!(!kems.contains(id));
        }
    }

    #[test]
    fn default_sig_is_dilithium3() {
        let reg = AlgRegistry::builtin();
        assert_eq!(reg.default_sig().unwrap().name, "dilithium3");
        assert_eq!(reg.default_kem().unwrap().name, "mlkem768");
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let entries = vec![
            AlgEntry {
                id: 1,
                name: "a".into(),
                kind: AlgKind::Sig,
                pk_len: 1,
                sk_len: 1,
                sig_len: Some(1),
                ct_len: None,
                ss_len: None,
                security_class: "x".into(),
                provider: "x".into(),
            },
            AlgEntry {
                id: 1,
                name: "b".into(),
                kind: AlgKind::Sig,
                pk_len: 1,
                sk_len: 1,
                sig_len: Some(1),
                ct_len: None,
                ss_len: None,
                security_class: "x".into(),
                provider: "x".into(),
            },
        ];
        assert!(AlgRegistry::from_entries(entries, None, None).is_err());
    }

    #[test]
    fn toml_roundtrip_parses_builtin_shape() {
        let toml_src = r#"
            default_sig = "dilithium3"
            default_kem = "mlkem768"

            [[alg]]
            id = 259
            name = "dilithium3"
            kind = "sig"
            pk_len = 1952
            sk_len = 4032
            sig_len = 3309
            security_class = "NIST-3"
            provider = "dcrypt"

            [[alg]]
            id = 769
            name = "mlkem768"
            kind = "kem"
            pk_len = 1184
            sk_len = 2400
            ct_len = 1088
            ss_len = 32
            security_class = "NIST-3"
            provider = "dcrypt"
        "#;
        let reg = AlgRegistry::from_toml(toml_src).unwrap();
        assert_eq!(reg.by_name("dilithium3").unwrap().id, 259);
        assert_eq!(reg.default_kem().unwrap().name, "mlkem768");
    }
}
