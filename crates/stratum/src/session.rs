// Path: crates/stratum/src/session.rs
//! Per-connection session state machine (`spec.md` §4.10):
//! `Connected -> Subscribed -> Authorized -> (ReceiveJobs)`, never
//! transitioning backward.

use crate::protocol::Dialect;
use animica_types::{MiningError, Result};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Framing negotiated via `subscribe.features.framing`: line-delimited JSON
/// by default, or length-prefixed per `spec.md` §4.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    Lines,
    LengthPrefixed,
}

/// Where a session sits in the per-connection state machine. Authorization
/// implies subscription; once a session starts receiving jobs it stays in
/// `Authorized` — "ReceiveJobs" in `spec.md`'s diagram is this same state
/// once `publish_job` starts targeting it, not a distinct transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Subscribed,
    Authorized,
}

/// A single miner connection's state, owned by the server's session
/// registry and updated as subscribe/authorize/submit requests arrive.
pub struct Session {
    pub id: u64,
    pub state: SessionState,
    pub dialect: Option<Dialect>,
    pub framing: Framing,
    pub worker: Option<String>,
    pub share_target_micro: u64,
    /// Outgoing raw JSON-RPC frames (one JSON document per send), written by
    /// the connection's writer task.
    pub outbox: UnboundedSender<String>,
}

impl Session {
    /// Start tracking a freshly accepted connection.
    pub fn new(id: u64, default_share_target_micro: u64, outbox: UnboundedSender<String>) -> Self {
        Session {
            id,
            state: SessionState::Connected,
            dialect: None,
            framing: Framing::default(),
            worker: None,
            share_target_micro: default_share_target_micro,
            outbox,
        }
    }

    /// Apply a `subscribe` request: records dialect and negotiated framing,
    /// advances `Connected -> Subscribed`. Re-subscribing from an already
    /// subscribed/authorized session is tolerated (miners reconnect
    /// features without dropping the TCP connection) and does not regress
    /// state.
    pub fn subscribe(&mut self, dialect: Dialect, framing: Framing) {
        self.dialect = Some(dialect);
        self.framing = framing;
        if self.state == SessionState::Connected {
            self.state = SessionState::Subscribed;
        }
    }

    /// Apply an `authorize` request: requires having subscribed first,
    /// advances `Subscribed -> Authorized`.
    pub fn authorize(&mut self, worker: String) -> Result<()> {
        if self.state == SessionState::Connected {
            return Err(MiningError::StaleJob("not subscribed".into()).into());
        }
        self.worker = Some(worker);
        self.state = SessionState::Authorized;
        Ok(())
    }

    /// Whether this session may submit shares (must be authorized).
    pub fn can_submit(&self) -> bool {
        self.state == SessionState::Authorized
    }

    /// Send a raw JSON-RPC document, framed per this session's negotiated
    /// [`Framing`]. Line framing appends a trailing newline; length-prefixed
    /// framing is applied by the connection's writer task, which owns the
    /// socket — this only queues the undelimited JSON text.
    pub fn push(&self, body: &Value) {
        if let Ok(text) = serde_json::to_string(body) {
            let _ = self.outbox.send(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn authorize_before_subscribe_is_rejected() {
        let (tx, _rx) = unbounded_channel();
        let mut s = Session::new(1, 1_000_000, tx);
        assert!(s.authorize("alice".into()).is_err());
    }

    #[test]
    fn subscribe_then_authorize_advances_state() {
        let (tx, _rx) = unbounded_channel();
        let mut s = Session::new(1, 1_000_000, tx);
        s.subscribe(Dialect::AnimicaNative, Framing::Lines);
        assert_eq!(s.state, SessionState::Subscribed);
        s.authorize("alice".into()).unwrap();
        assert_eq!(s.state, SessionState::Authorized);
        assert!(s.can_submit());
    }

    #[test]
    fn resubscribing_does_not_regress_authorized_state() {
        let (tx, _rx) = unbounded_channel();
        let mut s = Session::new(1, 1_000_000, tx);
        s.subscribe(Dialect::AnimicaNative, Framing::Lines);
        s.authorize("alice".into()).unwrap();
        s.subscribe(Dialect::StratumV1, Framing::Lines);
        assert_eq!(s.state, SessionState::Authorized);
        assert_eq!(s.dialect, Some(Dialect::StratumV1));
    }
}
