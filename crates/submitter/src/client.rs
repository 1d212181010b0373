// Path: crates/submitter/src/client.rs
//! `reqwest`-backed JSON-RPC client implementing [`animica_api::Submitter`]
//! (`spec.md` §4.11): batches single shares into `miner.submitShareBatch`
//! when the remote endpoint supports it, permanently falls back to
//! `miner.submitShare` the first time the endpoint reports
//! `METHOD_NOT_FOUND`, and retries transient transport/server errors with
//! exponential backoff up to a configured bound. Semantic rejections
//! (stale job, low difficulty, duplicate) are returned as-is without retry.

use crate::backoff::BackoffPolicy;
use crate::stats::SubmitterStats;
use animica_api::{BlockCandidate, ShareSubmission, SubmitOutcome, Submitter};
use animica_types::{AnimicaError, Result, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Server-defined JSON-RPC error codes `spec.md` §6.2 assigns the submit
/// surface, mirrored from the Stratum server's own code space so pool and
/// node share one taxonomy end to end.
const CODE_METHOD_NOT_FOUND: i64 = -32601;
const CODE_STALE_JOB: i64 = 4001;
const CODE_LOW_DIFFICULTY: i64 = 4002;
const CODE_DUPLICATE: i64 = 4003;

/// Configuration for a [`SubmitterClient`].
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// The node/pool's JSON-RPC endpoint URL.
    pub endpoint: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        SubmitterConfig {
            endpoint: "http://127.0.0.1:8645/rpc".to_string(),
            request_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// A JSON-RPC client for submitting shares and blocks, following the
/// teacher's pattern of a thin `reqwest::Client` wrapper with typed
/// request/response bodies (see `HttpInferenceRuntime`).
pub struct SubmitterClient {
    http: reqwest::Client,
    config: SubmitterConfig,
    stats: Arc<SubmitterStats>,
    batch_disabled: AtomicBool,
    next_id: AtomicU64,
}

impl SubmitterClient {
    pub fn new(config: SubmitterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AnimicaError::Transport(TransportError::RpcTransientError(e.to_string())))?;
        Ok(SubmitterClient {
            http,
            config,
            stats: Arc::new(SubmitterStats::new()),
            batch_disabled: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn stats(&self) -> Arc<SubmitterStats> {
        self.stats.clone()
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Issue one JSON-RPC call with no retry of its own; the caller applies
    /// backoff around transient failures.
    async fn call(&self, method: &str, params: Value) -> std::result::Result<Value, TransportError> {
        let req = RpcRequest {
            jsonrpc: "2.0",
            id: self.alloc_id(),
            method,
            params,
        };
        let resp = self
            .http
            .post(&self.config.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransportError::RpcTransientError(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(TransportError::RpcTransientError(format!(
                "http status {}",
                resp.status()
            )));
        }
        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| TransportError::RpcTransientError(e.to_string()))?;
        if let Some(err) = body.error {
            if err.code == CODE_METHOD_NOT_FOUND {
                return Err(TransportError::RpcMethodNotFound(err.message));
            }
            return Err(TransportError::RpcSemanticError {
                code: err.code,
                message: err.message,
            });
        }
        body.result
            .ok_or_else(|| TransportError::RpcTransientError("empty result".into()))
    }

    /// Whether a JSON-RPC error is a semantic rejection that should surface
    /// immediately, rather than be retried.
    fn is_semantic_rejection(err: &TransportError) -> Option<&'static str> {
        match err {
            TransportError::RpcSemanticError { code, .. } if *code == CODE_STALE_JOB => Some("stale-job"),
            TransportError::RpcSemanticError { code, .. } if *code == CODE_LOW_DIFFICULTY => {
                Some("low-difficulty")
            }
            TransportError::RpcSemanticError { code, .. } if *code == CODE_DUPLICATE => Some("duplicate"),
            _ => None,
        }
    }

    /// Call `method` with `params`, retrying transient failures per the
    /// configured backoff policy. Semantic rejections and permanent
    /// method-not-found errors are surfaced without retry.
    async fn call_with_retry(&self, method: &str, params: Value) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            match self.call(method, params.clone()).await {
                Ok(v) => return Ok(v),
                Err(err @ TransportError::RpcMethodNotFound(_)) => {
                    return Err(AnimicaError::Transport(err));
                }
                Err(err) if Self::is_semantic_rejection(&err).is_some() => {
                    return Err(AnimicaError::Transport(err));
                }
                Err(err) => {
                    if !self.config.backoff.should_retry(attempt) {
                        self.stats.record_error(err.to_string());
                        return Err(AnimicaError::Transport(err));
                    }
                    tracing::warn!(%err, attempt, "submitter retrying after transient error");
                    tokio::time::sleep(self.config.backoff.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Submit one share once, batching via `miner.submitShareBatch` unless
    /// batching has been permanently disabled for this client (the remote
    /// endpoint doesn't implement it).
    pub async fn submit_share_once(&self, share: ShareSubmission) -> Result<SubmitOutcome> {
        let outcome = if self.batch_disabled.load(Ordering::Relaxed) {
            self.submit_share_single(share).await
        } else {
            match self.submit_share_batch(std::slice::from_ref(&share)).await {
                Ok(mut outcomes) if !outcomes.is_empty() => Ok(outcomes.remove(0)),
                Ok(_) => Err(AnimicaError::Transport(TransportError::RpcTransientError(
                    "empty batch result".into(),
                ))),
                Err(AnimicaError::Transport(TransportError::RpcMethodNotFound(_))) => {
                    self.batch_disabled.store(true, Ordering::Relaxed);
                    tracing::info!("miner.submitShareBatch unsupported; falling back to miner.submitShare");
                    self.submit_share_single(share).await
                }
                Err(e) => Err(e),
            }
        };
        self.record_outcome(&outcome);
        outcome
    }

    async fn submit_share_batch(&self, shares: &[ShareSubmission]) -> Result<Vec<SubmitOutcome>> {
        let params = serde_json::json!({ "shares": shares });
        let result = self.call_with_retry("miner.submitShareBatch", params).await?;
        serde_json::from_value(result)
            .map_err(|e| AnimicaError::Transport(TransportError::RpcTransientError(e.to_string())))
    }

    async fn submit_share_single(&self, share: ShareSubmission) -> Result<SubmitOutcome> {
        let params = serde_json::to_value(&share)
            .map_err(|e| AnimicaError::Transport(TransportError::RpcTransientError(e.to_string())))?;
        let result = self.call_with_retry("miner.submitShare", params).await?;
        serde_json::from_value(result)
            .map_err(|e| AnimicaError::Transport(TransportError::RpcTransientError(e.to_string())))
    }

    /// Submit a fully assembled block once.
    pub async fn submit_block_once(&self, candidate: BlockCandidate) -> Result<SubmitOutcome> {
        let params = serde_json::to_value(&candidate)
            .map_err(|e| AnimicaError::Transport(TransportError::RpcTransientError(e.to_string())))?;
        let outcome = self.call_with_retry("miner.submitBlock", params).await.and_then(|v| {
            serde_json::from_value(v)
                .map_err(|e| AnimicaError::Transport(TransportError::RpcTransientError(e.to_string())))
        });
        self.record_outcome(&outcome);
        outcome
    }

    fn record_outcome(&self, outcome: &Result<SubmitOutcome>) {
        match outcome {
            Ok(o) if o.accepted => self.stats.record_accepted(),
            Ok(_) => self.stats.record_rejected(),
            Err(e) => match e {
                AnimicaError::Transport(t) if Self::is_semantic_rejection(t).is_some() => {
                    self.stats.record_rejected();
                }
                other => self.stats.record_error(other.to_string()),
            },
        }
    }
}

#[async_trait]
impl Submitter for SubmitterClient {
    async fn submit_share(&self, share: ShareSubmission) -> Result<SubmitOutcome> {
        self.submit_share_once(share).await
    }

    async fn submit_block(&self, candidate: BlockCandidate) -> Result<SubmitOutcome> {
        self.submit_block_once(candidate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_rejection_maps_known_codes() {
        let stale = TransportError::RpcSemanticError {
            code: CODE_STALE_JOB,
            message: "x".into(),
        };
        assert_eq!(SubmitterClient::is_semantic_rejection(&stale), Some("stale-job"));

        let low = TransportError::RpcSemanticError {
            code: CODE_LOW_DIFFICULTY,
            message: "x".into(),
        };
        assert_eq!(SubmitterClient::is_semantic_rejection(&low), Some("low-difficulty"));

        let dup = TransportError::RpcSemanticError {
            code: CODE_DUPLICATE,
            message: "x".into(),
        };
        assert_eq!(SubmitterClient::is_semantic_rejection(&dup), Some("duplicate"));

        let other = TransportError::RpcSemanticError {
            code: 9999,
            message: "x".into(),
        };
        assert!(SubmitterClient::is_semantic_rejection(&other).is_none());
    }

    #[test]
    fn default_config_points_at_loopback() {
        let cfg = SubmitterConfig::default();
        assert!(cfg.endpoint.starts_with("http://"));
        assert!(cfg.request_timeout > Duration::from_secs(0));
    }
}
