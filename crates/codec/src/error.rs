// Path: crates/codec/src/error.rs
//! Error taxonomy for canonical encoding and hashing.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the canonical codec, hashing, Merkle, and bech32m primitives.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A fixed-size buffer (typically a digest) had the wrong length.
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        got: usize,
    },
    /// CBOR, JSON, or bech32m input could not be decoded.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    /// A key/value Merkle input contained a duplicate key.
    #[error("duplicate key in key/value merkle input")]
    DuplicateKey,
    /// Decoded input was not in canonical form (non-minimal ints, unsorted keys, indefinite length).
    #[error("non-canonical encoding: {0}")]
    NonCanonical(String),
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidLength { .. } => "CODEC_INVALID_LENGTH",
            Self::InvalidEncoding(_) => "CODEC_INVALID_ENCODING",
            Self::DuplicateKey => "CODEC_DUPLICATE_KEY",
            Self::NonCanonical(_) => "CODEC_NON_CANONICAL",
        }
    }
}

/// Convenience result alias for this crate.
pub type Result<T> = std::result::Result<T, CodecError>;
