// Path: crates/api/src/mining.rs
//! Cross-cutting data types and collaborator traits for the mining pipeline
//! (`spec.md` §2 components G–J, §6.2 node JSON-RPC surface).

use animica_codec::digest::Digest32;
use animica_types::header::Header;
use animica_types::proof::ProofEnvelope;
use animica_types::tx::Tx;
use animica_types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A caller-supplied request for a fresh mining job, mirroring
/// `miner.getWork`'s optional `[{chainId, address?}]` parameter (`spec.md`
/// §6.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateRequest {
    /// Chain id the requester expects the template to target.
    pub chain_id: Option<u64>,
    /// The miner's payout/identity address, if the provider uses one to
    /// credit useful-work shares.
    pub address: Option<String>,
}

/// A mining job: a candidate header (nonce = 0, `receiptsRoot` left zero
/// until execution fills it) plus the acceptance thresholds and bookkeeping
/// a scanner/Stratum server needs (`spec.md` §4.8, §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningJob {
    /// Opaque job identifier; `submit` references a job by this.
    pub job_id: String,
    /// The candidate header (nonce = 0).
    pub header: Header,
    /// Block acceptance threshold Θ, in micro-nats (equal to
    /// `header.theta_micro`, repeated here so callers don't need to reach
    /// into the header to find it).
    pub theta_micro: u64,
    /// Share acceptance threshold θ_share, in micro-nats (`spec.md` §4.9) —
    /// always `<= theta_micro`, since every block-accepting draw is also a
    /// share-accepting one.
    pub share_target_micro: u64,
    /// Block height this job targets.
    pub height: u64,
    /// Transactions bundled into this candidate, in header-committed order.
    pub txs: Vec<Tx>,
    /// Proof envelopes bundled into this candidate.
    pub proofs: Vec<ProofEnvelope>,
    /// Opaque implementation-defined hints (e.g. pool-specific extranonce
    /// assignment), passed through without interpretation.
    #[serde(default)]
    pub hints: serde_json::Value,
}

/// A share a scanner found: `u <= e^(-theta_share_micro/1e6)` (`spec.md`
/// §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundShare {
    /// The job this share was found against.
    pub job_id: String,
    /// The winning nonce.
    pub nonce: u64,
    /// The scan digest the acceptance draw was computed from.
    pub digest: Digest32,
    /// The uniform draw `u` in `(0, 1]`.
    pub u: f64,
    /// Difficulty ratio `-ln(u) * 1e6 / theta_micro`, for pool accounting.
    pub d_ratio: f64,
}

/// A share submission as carried over Stratum/JSON-RPC, independent of
/// wire dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareSubmission {
    /// The job this share references.
    pub job_id: String,
    /// The submitted nonce.
    pub nonce: u64,
    /// Submitting identity (worker name, address, or session label).
    pub worker: String,
    /// Opaque extra fields a specific dialect may carry (extranonce2,
    /// ntime, etc.), passed through without interpretation.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// A fully assembled block candidate ready for `miner.submitBlock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockCandidate {
    /// The header with its winning nonce set.
    pub header: Header,
    /// Transactions in header-committed order.
    pub txs: Vec<Tx>,
    /// Proof envelopes in header-committed order.
    pub proofs: Vec<ProofEnvelope>,
}

/// Outcome of a share or block submission (`spec.md` §6.2 result shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Whether the share/block was accepted.
    pub accepted: bool,
    /// A stable reason string when rejected (e.g. `"stale-job"`,
    /// `"low-difficulty"`, `"duplicate"`).
    pub reason: Option<String>,
    /// The resulting header/block hash, when known.
    pub hash: Option<Digest32>,
    /// Difficulty ratio, when known (shares only).
    pub d_ratio: Option<f64>,
    /// Resulting chain height, when known (blocks only).
    pub height: Option<u64>,
}

/// Supplies mining jobs on demand. Implemented by a node-RPC-backed
/// provider in `animica-mining`; mocked in tests by a fixed-template stub.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// Fetch (or build) the current mining job for `request`.
    async fn get_template(&self, request: TemplateRequest) -> Result<MiningJob>;
}

/// Validates a share submission against the job it references. Structural
/// sanity (known job, sane nonce range) is always checked; full HashShare
/// cryptographic re-derivation is delegated to an adapter when available,
/// per `spec.md` §4.10's "dev mode" fallback.
pub trait ShareValidator: Send + Sync {
    /// Validate `submission` against `job`, returning the outcome.
    fn validate(&self, job: &MiningJob, submission: &ShareSubmission) -> SubmitOutcome;
}

/// Submits shares and blocks to a remote node/pool endpoint
/// (`miner.submitShare(Batch)`/`miner.submitBlock`, `spec.md` §4.11).
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit a single share, applying any internal batching/fallback.
    async fn submit_share(&self, share: ShareSubmission) -> Result<SubmitOutcome>;
    /// Submit a fully assembled block candidate.
    async fn submit_block(&self, candidate: BlockCandidate) -> Result<SubmitOutcome>;
}
