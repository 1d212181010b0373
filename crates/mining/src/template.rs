// Path: crates/mining/src/template.rs
//! Template construction (`spec.md` §4.8): the fixed fields a new candidate
//! inherits from its parent head plus the currently effective Θ and policy
//! roots, before any transactions/proofs are bundled in.

use crate::pack::pack_candidate;
use animica_api::{MiningJob, TemplateProvider, TemplateRequest};
use animica_codec::digest::Digest32;
use animica_types::header::Header;
use animica_types::proof::ProofEnvelope;
use animica_types::tx::Tx;
use animica_types::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// The fixed fields a template inherits before txs/proofs are bundled in
/// (`spec.md` §4.8's `header_base`).
#[derive(Debug, Clone)]
pub struct HeaderBase {
    /// Parent header hash.
    pub parent_hash: Digest32,
    /// This candidate's height (`parent.height + 1`).
    pub height: u64,
    /// Chain id.
    pub chain_id: u64,
    /// Block acceptance threshold Θ, in micro-nats.
    pub theta_micro: u64,
    /// Producer-claimed timestamp.
    pub timestamp: u64,
    /// Effective PoIES policy root.
    pub poies_policy_root: Digest32,
    /// Effective PQ algorithm policy root.
    pub pq_alg_policy_root: Digest32,
    /// Data-availability root for this candidate's bodies.
    pub da_root: Digest32,
    /// Entropy mix seed for this round's u-draw.
    pub mix_seed: Digest32,
}

impl HeaderBase {
    /// Derive the next block's base fields from a parent header, inheriting
    /// `mixSeed`/`poiesPolicyRoot`/`pqAlgPolicyRoot`/`thetaMicro` unless
    /// overridden (`Header::build_child`'s contract, generalized to a
    /// template rather than a fully packed header).
    pub fn from_parent(
        parent: &Header,
        timestamp: u64,
        theta_micro: Option<u64>,
        mix_seed: Option<Digest32>,
        poies_policy_root: Option<Digest32>,
        pq_alg_policy_root: Option<Digest32>,
        da_root: Digest32,
    ) -> Self {
        HeaderBase {
            parent_hash: parent.hash(),
            height: parent.height + 1,
            chain_id: parent.chain_id,
            theta_micro: theta_micro.unwrap_or(parent.theta_micro),
            timestamp,
            poies_policy_root: poies_policy_root.unwrap_or(parent.poies_policy_root),
            pq_alg_policy_root: pq_alg_policy_root.unwrap_or(parent.pq_alg_policy_root),
            da_root,
            mix_seed: mix_seed.unwrap_or(parent.mix_seed),
        }
    }
}

/// A minimal [`TemplateProvider`] that tracks a single parent head plus a
/// mempool-like set of pending txs/proofs supplied by the caller, and hands
/// out a fresh, monotonically-numbered `jobId` every time the head or the
/// bundled bodies change. Real deployments drive this from node RPC
/// (`miner.getWork`); this provider is the reference implementation used by
/// `animica-node`'s orchestrator tests and by a standalone miner pointed at
/// a fixed candidate.
pub struct ParentTemplateProvider {
    state: RwLock<ProviderState>,
    job_counter: AtomicU64,
    share_target_micro: u64,
}

struct ProviderState {
    parent: Header,
    txs: Vec<Tx>,
    proofs: Vec<ProofEnvelope>,
    da_root: Digest32,
    timestamp_fn_floor: u64,
}

impl ParentTemplateProvider {
    /// Start tracking `parent` as the current chain head.
    pub fn new(parent: Header, share_target_micro: u64) -> Self {
        ParentTemplateProvider {
            state: RwLock::new(ProviderState {
                parent,
                txs: Vec::new(),
                proofs: Vec::new(),
                da_root: Digest32::ZERO,
                timestamp_fn_floor: 0,
            }),
            job_counter: AtomicU64::new(0),
            share_target_micro,
        }
    }

    /// Replace the tracked parent head (e.g. after a new block lands),
    /// clearing any txs/proofs that were bundled against the old parent.
    pub fn set_parent(&self, parent: Header) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.parent = parent;
        state.txs.clear();
        state.proofs.clear();
    }

    /// Replace the bundled transaction/proof set for the next template.
    pub fn set_bodies(&self, txs: Vec<Tx>, proofs: Vec<ProofEnvelope>, da_root: Digest32) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.txs = txs;
        state.proofs = proofs;
        state.da_root = da_root;
    }

    fn next_job_id(&self) -> String {
        let n = self.job_counter.fetch_add(1, Ordering::SeqCst);
        format!("job-{n:016x}")
    }
}

#[async_trait]
impl TemplateProvider for ParentTemplateProvider {
    async fn get_template(&self, _request: TemplateRequest) -> Result<MiningJob> {
        let (header, txs, proofs, height, theta_micro) = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            // Keep candidate timestamps monotonic even if the wall clock the
            // caller supplies doesn't strictly increase between polls.
            let timestamp = state.parent.timestamp.max(state.timestamp_fn_floor) + 1;
            state.timestamp_fn_floor = timestamp;
            let base = HeaderBase::from_parent(&state.parent, timestamp, None, None, None, None, state.da_root);
            let header = pack_candidate(&base, &state.txs, &state.proofs)?;
            (header, state.txs.clone(), state.proofs.clone(), base.height, base.theta_micro)
        };
        Ok(MiningJob {
            job_id: self.next_job_id(),
            header,
            theta_micro,
            share_target_micro: self.share_target_micro,
            height,
            txs,
            proofs,
            hints: serde_json::Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> Header {
        Header::genesis(
            1,
            1_700_000_000,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::from_array([0x42; 32]),
            Digest32::from_array([0x11; 32]),
            Digest32::from_array([0x22; 32]),
            1_000_000,
            vec![],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn template_inherits_parent_policy_and_bumps_height() {
        let parent = genesis();
        let provider = ParentTemplateProvider::new(parent.clone(), 500_000);
        let job = provider.get_template(TemplateRequest::default()).await.unwrap();
        assert_eq!(job.header.height, 1);
        assert_eq!(job.header.parent_hash, parent.hash());
        assert_eq!(job.header.mix_seed, parent.mix_seed);
        assert_eq!(job.header.nonce, 0);
        assert_eq!(job.share_target_micro, 500_000);
    }

    #[tokio::test]
    async fn successive_templates_get_distinct_job_ids() {
        let provider = ParentTemplateProvider::new(genesis(), 500_000);
        let a = provider.get_template(TemplateRequest::default()).await.unwrap();
        let b = provider.get_template(TemplateRequest::default()).await.unwrap();
        assert_ne!(a.job_id, b.job_id);
    }
}
