// Path: crates/stratum/src/server.rs
//! The Stratum TCP server: accepts connections, runs each session's
//! subscribe/authorize/submit state machine, and fans `publish_job` out to
//! every subscribed session in its own dialect (`spec.md` §4.10, §5).

use crate::protocol::{
    error_response, notify_notification, ok_response, parse_submit_params, set_difficulty_notification, Dialect,
    JsonRpcRequest, StratumErrorCode,
};
use crate::session::{Framing, Session, SessionState};
use animica_api::{MiningJob, ShareSubmission, ShareValidator, SubmitOutcome};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::unbounded_channel;

/// Upper bound on how many recent jobs the server keeps addressable by
/// `jobId` for late-arriving submits; older jobs age out and any submit
/// against them is rejected as `STALE_JOB`.
const MAX_TRACKED_JOBS: usize = 64;

/// Called after a submission has been validated, letting an external pool
/// account shares and forward accepted blocks upstream (`spec.md` §4.10).
/// `(session_id, job, submission, accepted, reason, is_block, tx_count)`.
pub type SubmitHook = Arc<dyn Fn(u64, &MiningJob, &ShareSubmission, bool, Option<&str>, bool, usize) + Send + Sync>;

/// Server-side configuration.
#[derive(Debug, Clone)]
pub struct StratumConfig {
    /// Address to bind the TCP listener to.
    pub bind_addr: String,
    /// Share difficulty pushed to a session immediately after it subscribes.
    pub default_share_target_micro: u64,
    /// Maximum line length accepted under line framing, guarding against an
    /// unbounded read filling memory from a misbehaving client.
    pub max_line_bytes: usize,
}

impl Default for StratumConfig {
    fn default() -> Self {
        StratumConfig {
            bind_addr: "0.0.0.0:3333".to_string(),
            default_share_target_micro: 100_000,
            max_line_bytes: 64 * 1024,
        }
    }
}

/// The Stratum server: owns the session registry, the injected share
/// validator, and an optional submit hook.
pub struct StratumServer {
    config: StratumConfig,
    sessions: DashMap<u64, Session>,
    jobs: RwLock<HashMapWithOrder>,
    validator: Arc<dyn ShareValidator>,
    submit_hook: Option<SubmitHook>,
    next_session_id: AtomicU64,
}

struct HashMapWithOrder {
    by_id: std::collections::HashMap<String, MiningJob>,
    order: VecDeque<String>,
}

impl HashMapWithOrder {
    fn new() -> Self {
        HashMapWithOrder {
            by_id: std::collections::HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, job: MiningJob) {
        if self.by_id.contains_key(&job.job_id) {
            return;
        }
        if self.order.len() >= MAX_TRACKED_JOBS {
            if let Some(oldest) = self.order.pop_front() {
                self.by_id.remove(&oldest);
            }
        }
        self.order.push_back(job.job_id.clone());
        self.by_id.insert(job.job_id.clone(), job);
    }

    fn get(&self, job_id: &str) -> Option<MiningJob> {
        self.by_id.get(job_id).cloned()
    }
}

impl StratumServer {
    /// Construct a server around `validator`, with no submit hook.
    pub fn new(config: StratumConfig, validator: Arc<dyn ShareValidator>) -> Self {
        StratumServer {
            config,
            sessions: DashMap::new(),
            jobs: RwLock::new(HashMapWithOrder::new()),
            validator,
            submit_hook: None,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Attach a submit hook, replacing any previously set one.
    pub fn with_submit_hook(mut self, hook: SubmitHook) -> Self {
        self.submit_hook = Some(hook);
        self
    }

    /// Number of currently tracked sessions (any state).
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Bind and run the accept loop forever (or until the listener errors).
    pub async fn run(self: Arc<Self>) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "stratum server listening");
        loop {
            let (socket, peer) = listener.accept().await?;
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                let id = server.next_session_id.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(session_id = id, %peer, "session connected");
                if let Err(e) = server.handle_connection(id, socket).await {
                    tracing::debug!(session_id = id, error = %e, "session closed");
                }
                server.sessions.remove(&id);
            });
        }
    }

    /// Broadcast `job` to every subscribed session, in that session's
    /// dialect, and record it as resolvable by `jobId` for later submits.
    /// Dead writers (their receiver dropped) are pruned as encountered.
    pub fn publish_job(&self, job: MiningJob, clean_jobs: bool) {
        self.jobs.write().insert(job.clone());
        let mut dead = Vec::new();
        for entry in self.sessions.iter() {
            let session = entry.value();
            if session.state == SessionState::Connected {
                continue;
            }
            let dialect = session.dialect.unwrap_or(Dialect::AnimicaNative);
            let notification = notify_notification(dialect, &job, clean_jobs);
            let body = json!({
                "jsonrpc": notification.jsonrpc,
                "method": notification.method,
                "params": notification.params,
            });
            if session.outbox.send(serde_json::to_string(&body).unwrap_or_default()).is_err() {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.sessions.remove(&id);
        }
    }

    /// Push a per-session difficulty change independent of Θ.
    pub fn set_difficulty(&self, session_id: u64, share_target_micro: u64) {
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            session.share_target_micro = share_target_micro;
            let dialect = session.dialect.unwrap_or(Dialect::AnimicaNative);
            let notification = set_difficulty_notification(dialect, share_target_micro);
            session.push(&json!({
                "jsonrpc": notification.jsonrpc,
                "method": notification.method,
                "params": notification.params,
            }));
        }
    }

    async fn handle_connection(&self, id: u64, socket: TcpStream) -> std::io::Result<()> {
        let (read_half, mut write_half) = socket.into_split();
        let (tx, mut rx) = unbounded_channel::<String>();
        self.sessions
            .insert(id, Session::new(id, self.config.default_share_target_micro, tx));

        let writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if write_half.write_all(b"\n").await.is_err() {
                    break;
                }
            }
        });

        let mut lines = BufReader::new(read_half).lines();
        while let Some(line) = lines.next_line().await? {
            if line.len() > self.config.max_line_bytes {
                self.reply_error(id, Value::Null, StratumErrorCode::InvalidRequest);
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            self.dispatch_line(id, &line);
        }

        writer.abort();
        Ok(())
    }

    fn dispatch_line(&self, session_id: u64, line: &str) {
        let req: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(_) => {
                self.reply_error(session_id, Value::Null, StratumErrorCode::InvalidRequest);
                return;
            }
        };
        let id = req.id.clone().unwrap_or(Value::Null);
        let dialect = Dialect::detect(&req.params);

        let result = match req.method.as_str() {
            "miner.subscribe" | "mining.subscribe" => self.handle_subscribe(session_id, dialect, &req.params),
            "miner.authorize" | "mining.authorize" => self.handle_authorize(session_id, &req.params),
            "miner.submit" | "mining.submit" => self.handle_submit(session_id, dialect, &req.params),
            _ => Err(StratumErrorCode::MethodNotFound),
        };

        let response = match result {
            Ok(value) => ok_response(id, value),
            Err(code) => error_response(id, code),
        };
        if let Some(session) = self.sessions.get(&session_id) {
            session.push(&json!({
                "jsonrpc": response.jsonrpc,
                "id": response.id,
                "result": response.result,
                "error": response.error.map(|e| json!({"code": e.code, "message": e.message})),
            }));
        }
    }

    fn reply_error(&self, session_id: u64, id: Value, code: StratumErrorCode) {
        if let Some(session) = self.sessions.get(&session_id) {
            let response = error_response(id, code);
            session.push(&json!({
                "jsonrpc": response.jsonrpc,
                "id": response.id,
                "error": response.error.map(|e| json!({"code": e.code, "message": e.message})),
            }));
        }
    }

    fn handle_subscribe(&self, session_id: u64, dialect: Dialect, params: &Value) -> Result<Value, StratumErrorCode> {
        let framing = match params.get("features").and_then(|f| f.get("framing")).and_then(|v| v.as_str()) {
            Some("length-prefixed") => Framing::LengthPrefixed,
            _ => Framing::Lines,
        };
        let mut session = self.sessions.get_mut(&session_id).ok_or(StratumErrorCode::Internal)?;
        session.subscribe(dialect, framing);
        let share_target = session.share_target_micro;
        Ok(json!({ "subscribed": true, "shareTargetMicro": share_target }))
    }

    fn handle_authorize(&self, session_id: u64, params: &Value) -> Result<Value, StratumErrorCode> {
        let worker = params
            .get("worker")
            .and_then(|v| v.as_str())
            .or_else(|| params.as_array().and_then(|a| a.first()).and_then(|v| v.as_str()))
            .ok_or(StratumErrorCode::InvalidParams)?
            .to_string();
        let mut session = self.sessions.get_mut(&session_id).ok_or(StratumErrorCode::Internal)?;
        session.authorize(worker).map_err(|_| StratumErrorCode::InvalidRequest)?;
        Ok(json!({ "authorized": true }))
    }

    fn handle_submit(&self, session_id: u64, dialect: Dialect, params: &Value) -> Result<Value, StratumErrorCode> {
        let (worker, can_submit) = {
            let session = self.sessions.get(&session_id).ok_or(StratumErrorCode::Internal)?;
            (session.worker.clone().unwrap_or_default(), session.can_submit())
        };
        if !can_submit {
            return Err(StratumErrorCode::InvalidRequest);
        }
        let submission = parse_submit_params(dialect, &worker, params).ok_or(StratumErrorCode::InvalidParams)?;
        let job = self.jobs.read().get(&submission.job_id).ok_or(StratumErrorCode::StaleJob)?;

        let outcome: SubmitOutcome = self.validator.validate(&job, &submission);
        if let Some(hook) = &self.submit_hook {
            let is_block = outcome.height.is_some();
            hook(session_id, &job, &submission, outcome.accepted, outcome.reason.as_deref(), is_block, job.txs.len());
        }
        Ok(json!({
            "accepted": outcome.accepted,
            "reason": outcome.reason,
            "dRatio": outcome.d_ratio,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animica_codec::digest::Digest32;
    use animica_types::header::Header;

    struct AlwaysAccept;
    impl ShareValidator for AlwaysAccept {
        fn validate(&self, _job: &MiningJob, _submission: &ShareSubmission) -> SubmitOutcome {
            SubmitOutcome {
                accepted: true,
                reason: None,
                hash: None,
                d_ratio: Some(1.0),
                height: None,
            }
        }
    }

    fn job(job_id: &str) -> MiningJob {
        let header = Header::genesis(1, 1, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, 1000, vec![])
            .unwrap();
        MiningJob {
            job_id: job_id.to_string(),
            header,
            theta_micro: 1000,
            share_target_micro: 500,
            height: 0,
            txs: vec![],
            proofs: vec![],
            hints: Value::Null,
        }
    }

    #[test]
    fn unknown_job_is_tracked_as_absent() {
        let mut jobs = HashMapWithOrder::new();
        jobs.insert(job("a"));
        assert!(jobs.get("a").is_some());
        assert!(jobs.get("b").is_none());
    }

    #[test]
    fn job_tracking_evicts_oldest_past_capacity() {
        let mut jobs = HashMapWithOrder::new();
        for i in 0..(MAX_TRACKED_JOBS + 5) {
            jobs.insert(job(&format!("job-{i}")));
        }
        assert!(jobs.get("job-0").is_none());
        assert!(jobs.get(&format!("job-{}", MAX_TRACKED_JOBS + 4)).is_some());
    }

    #[tokio::test]
    async fn server_starts_with_no_sessions() {
        let server = Arc::new(StratumServer::new(StratumConfig::default(), Arc::new(AlwaysAccept)));
        assert_eq!(server.session_count(), 0);
    }
}
