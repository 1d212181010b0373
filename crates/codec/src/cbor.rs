// Path: crates/codec/src/cbor.rs
//! Canonical CBOR: deterministic map key order, minimal integer width, no
//! indefinite-length items. Built over [`ciborium::Value`] rather than
//! deriving `serde::Serialize` directly, because canonical ordering is a
//! property of the *encoder*, not of Rust's field declaration order.

use crate::error::{CodecError, Result};
use ciborium::value::Value;
use std::collections::BTreeMap;

/// A canonical value model: a restricted subset of CBOR whose encoding is
/// fully determined by its structure (map keys sorted, ints minimal width).
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    /// CBOR major type 0/1: an unsigned or negative integer.
    Int(i128),
    /// CBOR major type 2: a byte string.
    Bytes(Vec<u8>),
    /// CBOR major type 3: a UTF-8 text string.
    Text(String),
    /// CBOR major type 4: an array of values.
    Array(Vec<CanonicalValue>),
    /// CBOR major type 5: a map, canonicalized by sorting keys bytewise on
    /// their encoded form.
    Map(BTreeMap<String, CanonicalValue>),
    /// CBOR major type 7: a boolean.
    Bool(bool),
}

impl CanonicalValue {
    /// Construct a map value from an ordered list of (key, value) pairs.
    /// Input order is discarded; the encoder always sorts by key.
    pub fn map(entries: impl IntoIterator<Item = (&'static str, CanonicalValue)>) -> Self {
        let mut m = BTreeMap::new();
        for (k, v) in entries {
            m.insert(k.to_string(), v);
        }
        CanonicalValue::Map(m)
    }

    fn to_ciborium(&self) -> Result<Value> {
        Ok(match self {
            CanonicalValue::Int(i) => {
                let int: ciborium::value::Integer = (*i).try_into().map_err(|_| {
                    CodecError::InvalidEncoding(format!("integer {i} out of CBOR range"))
                })?;
                Value::Integer(int)
            }
            CanonicalValue::Bytes(b) => Value::Bytes(b.clone()),
            CanonicalValue::Text(s) => Value::Text(s.clone()),
            CanonicalValue::Array(a) => {
                let mut out = Vec::with_capacity(a.len());
                for v in a {
                    out.push(v.to_ciborium()?);
                }
                Value::Array(out)
            }
            CanonicalValue::Map(m) => {
                // BTreeMap already iterates in sorted key order.
                let mut out = Vec::with_capacity(m.len());
                for (k, v) in m {
                    out.push((Value::Text(k.clone()), v.to_ciborium()?));
                }
                Value::Map(out)
            }
            CanonicalValue::Bool(b) => Value::Bool(*b),
        })
    }

    fn from_ciborium(v: &Value) -> Result<Self> {
        match v {
            Value::Integer(i) => Ok(CanonicalValue::Int(i128::from(*i))),
            Value::Bytes(b) => Ok(CanonicalValue::Bytes(b.clone())),
            Value::Text(s) => Ok(CanonicalValue::Text(s.clone())),
            Value::Array(a) => {
                let mut out = Vec::with_capacity(a.len());
                for item in a {
                    out.push(CanonicalValue::from_ciborium(item)?);
                }
                Ok(CanonicalValue::Array(out))
            }
            Value::Map(m) => {
                let mut out = BTreeMap::new();
                for (k, v) in m {
                    let key = match k {
                        Value::Text(s) => s.clone(),
                        _ => {
                            return Err(CodecError::NonCanonical(
                                "map keys must be text strings".into(),
                            ))
                        }
                    };
                    if out.insert(key, CanonicalValue::from_ciborium(v)?).is_some() {
                        return Err(CodecError::NonCanonical("duplicate map key".into()));
                    }
                }
                Ok(CanonicalValue::Map(out))
            }
            Value::Bool(b) => Ok(CanonicalValue::Bool(*b)),
            Value::Float(_) => Err(CodecError::NonCanonical("floats are not canonical".into())),
            _ => Err(CodecError::InvalidEncoding("unsupported CBOR major type".into())),
        }
    }
}

/// Encode a canonical value to CBOR bytes.
///
/// `ciborium` always emits definite-length items and minimal-width integers,
/// so determinism reduces to sorting map keys, which [`CanonicalValue::Map`]
/// guarantees via `BTreeMap`.
pub fn canonical_cbor(value: &CanonicalValue) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::into_writer(&value.to_ciborium()?, &mut out)
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
    Ok(out)
}

/// Decode CBOR bytes into a canonical value, rejecting anything non-canonical
/// (floats, non-text map keys, duplicate keys).
pub fn from_canonical_cbor(bytes: &[u8]) -> Result<CanonicalValue> {
    let v: Value =
        ciborium::from_reader(bytes).map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
    CanonicalValue::from_ciborium(&v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_key_order_is_canonical_regardless_of_insertion_order() {
        let a = CanonicalValue::map([("b", CanonicalValue::Int(2)), ("a", CanonicalValue::Int(1))]);
        let b = CanonicalValue::map([("a", CanonicalValue::Int(1)), ("b", CanonicalValue::Int(2))]);
        assert_eq!(canonical_cbor(&a).unwrap(), canonical_cbor(&b).unwrap());
    }

    #[test]
    fn roundtrip_preserves_value() {
        let v = CanonicalValue::map([
            ("x", CanonicalValue::Bytes(vec![1, 2, 3])),
            ("y", CanonicalValue::Array(vec![CanonicalValue::Int(-1), CanonicalValue::Int(42)])),
        ]);
        let enc = canonical_cbor(&v).unwrap();
        let dec = from_canonical_cbor(&enc).unwrap();
        assert_eq!(v, dec);
    }

    #[test]
    fn rejects_floats() {
        let mut out = Vec::new();
        ciborium::into_writer(&Value::Float(1.5), &mut out).unwrap();
        assert!(from_canonical_cbor(&out).is_err());
    }
}
