// Path: crates/codec/src/digest.rs
//! Fixed-size digest containers (`Digest32`, `Digest64`).

use crate::error::{CodecError, Result};
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte SHA3-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest32(pub [u8; 32]);

/// A 64-byte SHA3-512 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest64(pub [u8; 64]);

impl Digest32 {
    /// The all-zero digest, used as a sentinel root for empty collections.
    pub const ZERO: Digest32 = Digest32([0u8; 32]);

    /// Borrow the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Build a digest from an owned 32-byte array.
    pub fn from_array(a: [u8; 32]) -> Self {
        Digest32(a)
    }

    /// Parse a digest from an arbitrary-length byte slice, rejecting anything but 32 bytes.
    pub fn from_slice(b: &[u8]) -> Result<Self> {
        if b.len() != 32 {
            return Err(CodecError::InvalidLength {
                expected: 32,
                got: b.len(),
            });
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(b);
        Ok(Digest32(out))
    }

    /// Lower-hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Digest64 {
    /// Borrow the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Build a digest from an owned 64-byte array.
    pub fn from_array(a: [u8; 64]) -> Self {
        Digest64(a)
    }

    /// Parse a digest from an arbitrary-length byte slice, rejecting anything but 64 bytes.
    pub fn from_slice(b: &[u8]) -> Result<Self> {
        if b.len() != 64 {
            return Err(CodecError::InvalidLength {
                expected: 64,
                got: b.len(),
            });
        }
        let mut out = [0u8; 64];
        out.copy_from_slice(b);
        Ok(Digest64(out))
    }

    /// Lower-hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest32({})", &self.to_hex()[..8])
    }
}

impl fmt::Debug for Digest64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest64({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(a: [u8; 32]) -> Self {
        Digest32(a)
    }
}

impl From<Digest32> for [u8; 32] {
    fn from(d: Digest32) -> Self {
        d.0
    }
}

struct DigestVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for DigestVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{N} bytes")
    }

    fn visit_bytes<E: DeError>(self, v: &[u8]) -> std::result::Result<Self::Value, E> {
        if v.len() != N {
            return Err(E::invalid_length(v.len(), &self));
        }
        let mut out = [0u8; N];
        out.copy_from_slice(v);
        Ok(out)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut out = [0u8; N];
        for slot in out.iter_mut() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| DeError::invalid_length(N, &self))?;
        }
        Ok(out)
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        d.deserialize_bytes(DigestVisitor::<32>).map(Digest32)
    }
}

impl Serialize for Digest64 {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest64 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        d.deserialize_bytes(DigestVisitor::<64>).map(Digest64)
    }
}
