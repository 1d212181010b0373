// Path: crates/codec/src/json.rs
//! Canonical JSON: sorted keys, compact separators, no floats, deterministic
//! integer/byte encoding.
//!
//! `serde_json`'s `preserve_order` feature preserves *input* order; canonical
//! JSON needs the opposite — input order must be discarded and keys sorted —
//! so this is a small hand-rolled pass over [`serde_json::Value`].

use crate::error::{CodecError, Result};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// How out-of-range integers (outside ±(2^53 - 1), JS's safe integer range)
/// are encoded in canonical JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPolicy {
    /// Emit as a raw JSON number (may lose precision in non-Rust consumers).
    Raw,
    /// Emit as a decimal string, e.g. `"18446744073709551615"`.
    String,
    /// Emit as a `0x`-prefixed lower-hex string.
    Hex,
}

const SAFE_INT_MAX: i64 = (1i64 << 53) - 1;
const SAFE_INT_MIN: i64 = -((1i64 << 53) - 1);

/// Encode a [`serde_json::Value`] to canonical JSON bytes.
///
/// Rejects floats outright (§4.1). Bytes are not a native JSON type in
/// `serde_json::Value`; callers that need byte fields should pre-encode them
/// as `Value::String("0x...")` before calling this function, or use
/// [`bytes_to_hex_value`].
pub fn canonical_json(value: &Value, int_policy: IntPolicy) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_canonical(value, int_policy, &mut out)?;
    Ok(out)
}

/// Wrap raw bytes as the canonical `"0x"`-prefixed lower-hex JSON string form.
pub fn bytes_to_hex_value(b: &[u8]) -> Value {
    Value::String(format!("0x{}", hex::encode(b)))
}

fn write_canonical(value: &Value, policy: IntPolicy, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => write_number(n, policy, out)?,
        Value::String(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, policy, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            out.push(b'{');
            let sorted = sorted_entries(map);
            for (i, (k, v)) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_json_string(k, out);
                out.push(b':');
                write_canonical(v, policy, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn sorted_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let tree: BTreeMap<&String, &Value> = map.iter().collect();
    tree.into_iter().collect()
}

fn write_number(n: &Number, policy: IntPolicy, out: &mut Vec<u8>) -> Result<()> {
    if n.is_f64() && !n.is_i64() && !n.is_u64() {
        return Err(CodecError::NonCanonical("floats are not canonical JSON".into()));
    }
    if let Some(i) = n.as_i64() {
        if (SAFE_INT_MIN..=SAFE_INT_MAX).contains(&i) || policy == IntPolicy::Raw {
            out.extend_from_slice(i.to_string().as_bytes());
        } else {
            encode_out_of_range(i128::from(i), policy, out);
        }
        return Ok(());
    }
    if let Some(u) = n.as_u64() {
        if u <= SAFE_INT_MAX as u64 || policy == IntPolicy::Raw {
            out.extend_from_slice(u.to_string().as_bytes());
        } else {
            encode_out_of_range(i128::from(u), policy, out);
        }
        return Ok(());
    }
    Err(CodecError::NonCanonical("floats are not canonical JSON".into()))
}

fn encode_out_of_range(v: i128, policy: IntPolicy, out: &mut Vec<u8>) {
    match policy {
        IntPolicy::Raw => out.extend_from_slice(v.to_string().as_bytes()),
        IntPolicy::String => {
            out.push(b'"');
            out.extend_from_slice(v.to_string().as_bytes());
            out.push(b'"');
        }
        IntPolicy::Hex => {
            let sign = if v < 0 { "-" } else { "" };
            out.push(b'"');
            out.extend_from_slice(format!("{sign}0x{:x}", v.unsigned_abs()).as_bytes());
            out.push(b'"');
        }
    }
}

fn write_json_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_regardless_of_input_order() {
        let v = json!({"b": 1, "a": 2});
        let enc = canonical_json(&v, IntPolicy::Raw).unwrap();
        assert_eq!(enc, br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn compact_separators_no_whitespace() {
        let v = json!({"a": [1, 2, 3]});
        let enc = canonical_json(&v, IntPolicy::Raw).unwrap();
        assert_eq!(enc, br#"{"a":[1,2,3]}"#);
    }

    #[test]
    fn floats_are_rejected() {
        let v = json!({"a": 1.5});
        assert!(canonical_json(&v, IntPolicy::Raw).is_err());
    }

    #[test]
    fn out_of_range_ints_use_selected_policy() {
        let v = json!(u64::MAX);
        let as_string = canonical_json(&v, IntPolicy::String).unwrap();
        assert_eq!(as_string, format!("\"{}\"", u64::MAX).into_bytes());
        let as_hex = canonical_json(&v, IntPolicy::Hex).unwrap();
        assert_eq!(as_hex, format!("\"0x{:x}\"", u64::MAX).into_bytes());
    }
}
