// Path: crates/codec/src/bech32m.rs
//! Bech32m (BIP-350) address encoding used by Animica's address format (§3.1).
//!
//! Animica's address payload is bespoke (`alg_id_be16 || sha3_256(pubkey)`,
//! 34 bytes), so only the `bech32` crate's bit-packing/checksum primitives
//! are used directly, rather than a higher-level word-oriented API.

use crate::error::{CodecError, Result};
use bech32::{primitives::decode::CheckedHrpstring, Bech32m, Hrp};

/// Human-readable part for Animica mainnet addresses.
pub const HRP_ANIM: &str = "anim";

/// Maximum total encoded address length (HRP + separator + data + checksum).
pub const MAX_ADDR_LEN: usize = 90;

/// Encode arbitrary bytes as a bech32m string with the given HRP.
pub fn encode(hrp: &str, payload: &[u8]) -> Result<String> {
    let hrp = Hrp::parse(hrp).map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
    let s = bech32::encode::<Bech32m>(hrp, payload)
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
    if s.len() > MAX_ADDR_LEN {
        return Err(CodecError::InvalidEncoding(format!(
            "encoded bech32m string exceeds {MAX_ADDR_LEN} chars"
        )));
    }
    Ok(s)
}

/// Decode a bech32m string, returning `(hrp, payload)`.
///
/// Rejects mixed-case input and non-zero padding bits on 5-to-8 conversion,
/// per BIP-173/350 strict decoding rules (enforced by the `bech32` crate).
pub fn decode(s: &str) -> Result<(String, Vec<u8>)> {
    if s.len() > MAX_ADDR_LEN {
        return Err(CodecError::InvalidEncoding(format!(
            "bech32m string exceeds {MAX_ADDR_LEN} chars"
        )));
    }
    if s.chars().any(|c| c.is_ascii_uppercase()) && s.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(CodecError::InvalidEncoding("mixed-case bech32m input rejected".into()));
    }
    let checked = CheckedHrpstring::new::<Bech32m>(s)
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
    let hrp = checked.hrp().to_string();
    let data: Vec<u8> = checked.byte_iter().collect();
    Ok((hrp, data))
}

/// Derive an Animica address: `bech32m("anim", u16be(alg_id) || sha3_256(pk))`.
pub fn derive_address(alg_id: u16, pubkey: &[u8]) -> Result<String> {
    let digest = crate::hash::sha3_256(pubkey);
    let mut payload = Vec::with_capacity(2 + 32);
    payload.extend_from_slice(&alg_id.to_be_bytes());
    payload.extend_from_slice(digest.as_bytes());
    encode(HRP_ANIM, &payload)
}

/// Decode an Animica address back into `(alg_id, digest)`.
pub fn decode_address(addr: &str) -> Result<(u16, crate::digest::Digest32)> {
    let (hrp, payload) = decode(addr)?;
    if hrp != HRP_ANIM {
        return Err(CodecError::InvalidEncoding(format!("unexpected HRP {hrp}")));
    }
    if payload.len() != 34 {
        return Err(CodecError::InvalidLength {
            expected: 34,
            got: payload.len(),
        });
    }
    let alg_id = u16::from_be_bytes([payload[0], payload[1]]);
    let digest = crate::digest::Digest32::from_slice(&payload[2..])?;
    Ok((alg_id, digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrips() {
        // spec.md §8 scenario D
        let pk = [0x01u8; 48];
        let alg_id = 0x0103u16;
        let addr = derive_address(alg_id, &pk).unwrap();
        assert!(addr.starts_with("anim1"));
        let (decoded_alg, digest) = decode_address(&addr).unwrap();
        assert_eq!(decoded_alg, alg_id);
        assert_eq!(digest, crate::hash::sha3_256(&pk));
    }

    #[test]
    fn mixed_case_is_rejected() {
        let pk = [0x02u8; 48];
        let addr = derive_address(0x0201, &pk).unwrap();
        let mut chars: Vec<char> = addr.chars().collect();
        // Flip the case of one data character (after the separator) to break strict casing.
        if let Some(pos) = addr.find('1') {
            if let Some(c) = chars.get_mut(pos + 1) {
                *c = c.to_ascii_uppercase();
            }
        }
        let mixed: String = chars.into_iter().collect();
        assert!(decode(&mixed).is_err());
    }
}
