// Path: crates/types/src/error.rs
//! Error taxonomy for Animica's data layer and consensus-facing components
//! (spec §7): Validation, Consensus, Crypto, Mining, Transport.

pub use animica_codec::error::ErrorCode;
use animica_codec::error::CodecError;
use thiserror::Error;

/// Errors raised validating canonical data (headers, blocks, envelopes, receipts).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A fixed-size field (typically a 32-byte digest) had the wrong length.
    #[error("invalid length: {0}")]
    InvalidLength(String),
    /// CBOR/JSON decoding failed or was non-canonical.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    /// Decoded input was not canonical (unsorted keys, indefinite length, etc).
    #[error("non-canonical encoding: {0}")]
    NonCanonical(String),
    /// A key/value collection contained a duplicate key.
    #[error("duplicate key")]
    DuplicateKey,
    /// A tagged union (`ProofType`, algorithm id) carried an unrecognized discriminant.
    #[error("unknown type id: {0}")]
    UnknownType(u64),
    /// A proof/tx/block envelope failed structural sanity checks.
    #[error("bad envelope: {0}")]
    BadEnvelope(String),
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidLength(_) => "VALIDATION_INVALID_LENGTH",
            Self::InvalidEncoding(_) => "VALIDATION_INVALID_ENCODING",
            Self::NonCanonical(_) => "VALIDATION_NON_CANONICAL",
            Self::DuplicateKey => "VALIDATION_DUPLICATE_KEY",
            Self::UnknownType(_) => "VALIDATION_UNKNOWN_TYPE",
            Self::BadEnvelope(_) => "VALIDATION_BAD_ENVELOPE",
        }
    }
}

impl From<CodecError> for ValidationError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::InvalidLength { expected, got } => {
                ValidationError::InvalidLength(format!("expected {expected}, got {got}"))
            }
            CodecError::InvalidEncoding(s) => ValidationError::InvalidEncoding(s),
            CodecError::DuplicateKey => ValidationError::DuplicateKey,
            CodecError::NonCanonical(s) => ValidationError::NonCanonical(s),
        }
    }
}

/// Errors raised by consensus-facing acceptance checks (header/root/theta binding).
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// A derived root (txs/receipts/proofs/state) did not match the header's claimed root.
    #[error("root mismatch: {which}: expected {expected}, got {got}")]
    RootMismatch {
        /// Which root mismatched (`"txsRoot"`, `"receiptsRoot"`, `"proofsRoot"`, `"stateRoot"`).
        which: &'static str,
        /// Hex-encoded expected root.
        expected: String,
        /// Hex-encoded computed root.
        got: String,
    },
    /// The header's schema version is not supported by this implementation.
    #[error("unsupported header version {0}")]
    HeaderVersionUnsupported(u8),
    /// The header's `chainId` does not match the locally configured chain.
    #[error("chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// Locally configured chain id.
        expected: u64,
        /// Chain id carried by the header.
        got: u64,
    },
    /// A proposed Θ (acceptance threshold) step violated the bounded-adjustment rule.
    #[error("theta {theta_micro} out of bounds [{min},{max}]")]
    ThetaOutOfBounds {
        /// Proposed Θ in micro-nats.
        theta_micro: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A policy root (`poiesPolicyRoot`/`pqAlgPolicyRoot`) did not match the expected value.
    #[error("policy root mismatch: {which}")]
    PolicyRootMismatch {
        /// Which policy root mismatched.
        which: &'static str,
    },
    /// Header timestamps were not monotonically increasing along a chain.
    #[error("timestamp non-monotonic: parent {parent}, child {child}")]
    TimestampNonMonotonic {
        /// Parent header timestamp.
        parent: u64,
        /// Child header timestamp.
        child: u64,
    },
}

impl ErrorCode for ConsensusError {
    fn code(&self) -> &'static str {
        match self {
            Self::RootMismatch { .. } => "CONSENSUS_ROOT_MISMATCH",
            Self::HeaderVersionUnsupported(_) => "CONSENSUS_HEADER_VERSION_UNSUPPORTED",
            Self::ChainIdMismatch { .. } => "CONSENSUS_CHAIN_ID_MISMATCH",
            Self::ThetaOutOfBounds { .. } => "CONSENSUS_THETA_OUT_OF_BOUNDS",
            Self::PolicyRootMismatch { .. } => "CONSENSUS_POLICY_ROOT_MISMATCH",
            Self::TimestampNonMonotonic { .. } => "CONSENSUS_TIMESTAMP_NON_MONOTONIC",
        }
    }
}

/// Errors raised by PQ cryptographic operations (sign/verify/KEM/handshake).
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The requested algorithm has no available backend (and dev fallback is disabled).
    #[error("algorithm unavailable: {0}")]
    AlgorithmUnavailable(String),
    /// A signature's domain tag did not match the caller's expectation under strict mode.
    #[error("domain mismatch: expected {expected}, got {got}")]
    DomainMismatch {
        /// Expected domain string.
        expected: String,
        /// Domain string carried by the envelope.
        got: String,
    },
    /// A signature envelope's algorithm did not match the caller's expectation.
    #[error("algorithm mismatch: expected {expected}, got {got}")]
    AlgMismatch {
        /// Expected algorithm id.
        expected: u16,
        /// Algorithm id carried by the envelope.
        got: u16,
    },
    /// Signature verification returned false.
    #[error("invalid signature")]
    InvalidSignature,
    /// A KEM encapsulate/decapsulate operation failed.
    #[error("KEM failure: {0}")]
    KemFailure(String),
    /// An underlying cryptographic backend failed for a reason outside this taxonomy.
    #[error("backend failure: {0}")]
    BackendFailure(String),
    /// A key or ciphertext had an unexpected byte length for its algorithm.
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        got: usize,
    },
    /// A handshake frame's magic prefix did not match `"ANM1HELLO"`.
    #[error("handshake magic mismatch")]
    MagicMismatch,
    /// A handshake frame ended before its declared fields were fully present.
    #[error("truncated handshake frame")]
    TruncatedFrame,
    /// A handshake frame named a KEM algorithm id this build does not support.
    #[error("unsupported KEM algorithm id {0}")]
    UnsupportedKem(u16),
    /// An AUTH signature over the handshake transcript failed to verify.
    #[error("handshake auth invalid")]
    AuthInvalid,
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlgorithmUnavailable(_) => "CRYPTO_ALGORITHM_UNAVAILABLE",
            Self::DomainMismatch { .. } => "CRYPTO_DOMAIN_MISMATCH",
            Self::AlgMismatch { .. } => "CRYPTO_ALG_MISMATCH",
            Self::InvalidSignature => "CRYPTO_INVALID_SIGNATURE",
            Self::KemFailure(_) => "CRYPTO_KEM_FAILURE",
            Self::BackendFailure(_) => "CRYPTO_BACKEND_FAILURE",
            Self::InvalidKeyLength { .. } => "CRYPTO_INVALID_KEY_LENGTH",
            Self::MagicMismatch => "CRYPTO_HANDSHAKE_MAGIC_MISMATCH",
            Self::TruncatedFrame => "CRYPTO_HANDSHAKE_TRUNCATED_FRAME",
            Self::UnsupportedKem(_) => "CRYPTO_HANDSHAKE_UNSUPPORTED_KEM",
            Self::AuthInvalid => "CRYPTO_HANDSHAKE_AUTH_INVALID",
        }
    }
}

/// Errors raised by the mining pipeline (templates, scanner, Stratum sessions).
#[derive(Debug, Error)]
pub enum MiningError {
    /// A submitted share referenced a `jobId` the server no longer tracks.
    #[error("stale job: {0}")]
    StaleJob(String),
    /// A submitted share did not meet the session's pushed difficulty.
    #[error("low difficulty")]
    LowDifficulty,
    /// A share with the same `(jobId, nonce)` was already accepted.
    #[error("duplicate share")]
    DuplicateShare,
    /// The GPU/accelerator kernel could not be launched; caller should fall back to CPU.
    #[error("kernel unavailable: {0}")]
    KernelUnavailable(String),
    /// A bounded output queue was full; the share/job was dropped to protect liveness.
    #[error("queue full")]
    QueueFull,
}

impl ErrorCode for MiningError {
    fn code(&self) -> &'static str {
        match self {
            Self::StaleJob(_) => "MINING_STALE_JOB",
            Self::LowDifficulty => "MINING_LOW_DIFFICULTY",
            Self::DuplicateShare => "MINING_DUPLICATE_SHARE",
            Self::KernelUnavailable(_) => "MINING_KERNEL_UNAVAILABLE",
            Self::QueueFull => "MINING_QUEUE_FULL",
        }
    }
}

/// Errors raised by transport-facing components (Stratum sessions, the share submitter).
#[derive(Debug, Error)]
pub enum TransportError {
    /// An operation did not complete within its deadline.
    #[error("timeout")]
    Timeout,
    /// The peer disconnected.
    #[error("disconnected")]
    Disconnected,
    /// The remote RPC endpoint does not implement the requested method.
    #[error("method not found: {0}")]
    RpcMethodNotFound(String),
    /// A transient RPC/transport error; safe to retry with backoff.
    #[error("transient RPC error: {0}")]
    RpcTransientError(String),
    /// The remote endpoint returned a semantic rejection with a JSON-RPC error code.
    #[error("semantic RPC rejection (code {code}): {message}")]
    RpcSemanticError {
        /// The JSON-RPC error code.
        code: i64,
        /// The human-readable message.
        message: String,
    },
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "TRANSPORT_TIMEOUT",
            Self::Disconnected => "TRANSPORT_DISCONNECTED",
            Self::RpcMethodNotFound(_) => "TRANSPORT_RPC_METHOD_NOT_FOUND",
            Self::RpcTransientError(_) => "TRANSPORT_RPC_TRANSIENT_ERROR",
            Self::RpcSemanticError { .. } => "TRANSPORT_RPC_SEMANTIC_ERROR",
        }
    }
}

/// Umbrella error type composing the five taxonomies, used at crate boundaries
/// where any of them may surface (e.g. `Block::verify_against_header`).
#[derive(Debug, Error)]
pub enum AnimicaError {
    /// A validation-layer error.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A consensus-layer error.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    /// A cryptography-layer error.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// A mining-pipeline error.
    #[error(transparent)]
    Mining(#[from] MiningError),
    /// A transport-layer error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ErrorCode for AnimicaError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Consensus(e) => e.code(),
            Self::Crypto(e) => e.code(),
            Self::Mining(e) => e.code(),
            Self::Transport(e) => e.code(),
        }
    }
}

impl From<CodecError> for AnimicaError {
    fn from(e: CodecError) -> Self {
        AnimicaError::Validation(ValidationError::from(e))
    }
}

/// Convenience result alias for this crate.
pub type Result<T> = std::result::Result<T, AnimicaError>;
