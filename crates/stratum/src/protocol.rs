// Path: crates/stratum/src/protocol.rs
//! JSON-RPC 2.0 envelopes and the two wire dialects a session may speak
//! (`spec.md` §4.10): Animica-native (object-shaped `params`) and Stratum v1
//! (list-shaped `params`, classic `mining.*` method names).

use animica_api::{MiningJob, ShareSubmission};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A JSON-RPC 2.0 request, either dialect.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`; not enforced strictly to tolerate lenient miners.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Request id; Stratum v1 miners commonly send integers.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name, dialect-dependent (`miner.*` vs `mining.*`).
    pub method: String,
    /// Either an object (Animica-native) or an array (Stratum v1).
    #[serde(default)]
    pub params: Value,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
}

/// A JSON-RPC 2.0 error body.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// A server-pushed notification (no `id`, no reply expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

/// The JSON-RPC error code taxonomy returned to miners (`spec.md` §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratumErrorCode {
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    StaleJob,
    Internal,
}

impl StratumErrorCode {
    /// The JSON-RPC numeric code sent on the wire. The reserved `-326xx`
    /// range covers the three standard JSON-RPC error classes; `StaleJob`
    /// uses a server-defined code outside that range, as JSON-RPC permits.
    pub fn code(self) -> i64 {
        match self {
            StratumErrorCode::InvalidRequest => -32600,
            StratumErrorCode::MethodNotFound => -32601,
            StratumErrorCode::InvalidParams => -32602,
            StratumErrorCode::Internal => -32603,
            StratumErrorCode::StaleJob => 4001,
        }
    }

    /// A human-readable default message for this code.
    pub fn default_message(self) -> &'static str {
        match self {
            StratumErrorCode::InvalidRequest => "invalid request",
            StratumErrorCode::MethodNotFound => "method not found",
            StratumErrorCode::InvalidParams => "invalid params",
            StratumErrorCode::StaleJob => "stale job",
            StratumErrorCode::Internal => "internal error",
        }
    }
}

/// Build an error response with `code`'s default message.
pub fn error_response(id: Value, code: StratumErrorCode) -> JsonRpcResponse {
    error_response_with_message(id, code, code.default_message().to_string())
}

/// Build an error response with a caller-supplied message.
pub fn error_response_with_message(id: Value, code: StratumErrorCode, message: String) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcErrorBody {
            code: code.code(),
            message,
        }),
    }
}

/// Build a success response.
pub fn ok_response(id: Value, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: Some(result),
        error: None,
    }
}

/// The wire dialect a session is speaking, detected from the shape of its
/// first request's `params`: a JSON array selects Stratum v1; anything else
/// (object, null, missing) selects Animica-native.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    AnimicaNative,
    StratumV1,
}

impl Dialect {
    /// Detect dialect from a request's raw `params` value.
    pub fn detect(params: &Value) -> Dialect {
        match params {
            Value::Array(_) => Dialect::StratumV1,
            _ => Dialect::AnimicaNative,
        }
    }

    /// The method name this dialect expects for "subscribe".
    pub fn subscribe_method(self) -> &'static str {
        match self {
            Dialect::AnimicaNative => "miner.subscribe",
            Dialect::StratumV1 => "mining.subscribe",
        }
    }

    /// The method name this dialect expects for "authorize".
    pub fn authorize_method(self) -> &'static str {
        match self {
            Dialect::AnimicaNative => "miner.authorize",
            Dialect::StratumV1 => "mining.authorize",
        }
    }

    /// The method name this dialect expects for "submit".
    pub fn submit_method(self) -> &'static str {
        match self {
            Dialect::AnimicaNative => "miner.submit",
            Dialect::StratumV1 => "mining.submit",
        }
    }

    /// The server-push method name for a new job.
    pub fn notify_method(self) -> &'static str {
        match self {
            Dialect::AnimicaNative => "miner.notify",
            Dialect::StratumV1 => "mining.notify",
        }
    }

    /// The server-push method name for a difficulty change.
    pub fn set_difficulty_method(self) -> &'static str {
        match self {
            Dialect::AnimicaNative => "miner.setDifficulty",
            Dialect::StratumV1 => "mining.set_difficulty",
        }
    }
}

/// Build a `notify` push for `job` in `dialect`'s params shape.
pub fn notify_notification(dialect: Dialect, job: &MiningJob, clean_jobs: bool) -> JsonRpcNotification {
    let params = match dialect {
        Dialect::AnimicaNative => json!({
            "jobId": job.job_id,
            "height": job.height,
            "header": job.header,
            "shareTargetMicro": job.share_target_micro,
            "thetaMicro": job.theta_micro,
            "hints": job.hints,
            "cleanJobs": clean_jobs,
        }),
        Dialect::StratumV1 => json!([
            job.job_id,
            job.height,
            hex::encode(job.header.hash().as_bytes()),
            job.share_target_micro,
            clean_jobs,
        ]),
    };
    JsonRpcNotification {
        jsonrpc: "2.0",
        method: dialect.notify_method(),
        params,
    }
}

/// Build a `set_difficulty` push.
pub fn set_difficulty_notification(dialect: Dialect, share_target_micro: u64) -> JsonRpcNotification {
    let params = match dialect {
        Dialect::AnimicaNative => json!({ "shareTargetMicro": share_target_micro }),
        Dialect::StratumV1 => json!([share_target_micro]),
    };
    JsonRpcNotification {
        jsonrpc: "2.0",
        method: dialect.set_difficulty_method(),
        params,
    }
}

/// Parse a `submit` request's params into a dialect-independent
/// [`ShareSubmission`], given the worker name the session authorized as
/// (Stratum v1's list params don't repeat the worker name on every submit
/// call in this simplified wire form, so the session-bound name is used).
pub fn parse_submit_params(dialect: Dialect, worker: &str, params: &Value) -> Option<ShareSubmission> {
    match dialect {
        Dialect::AnimicaNative => {
            let job_id = params.get("jobId")?.as_str()?.to_string();
            let nonce = params.get("nonce")?.as_u64()?;
            let extra = params.get("extra").cloned().unwrap_or(Value::Null);
            Some(ShareSubmission {
                job_id,
                nonce,
                worker: worker.to_string(),
                extra,
            })
        }
        Dialect::StratumV1 => {
            let arr = params.as_array()?;
            let job_id = arr.first()?.as_str()?.to_string();
            let nonce_hex = arr.get(1)?.as_str()?;
            let nonce = u64::from_str_radix(nonce_hex.trim_start_matches("0x"), 16).ok()?;
            Some(ShareSubmission {
                job_id,
                nonce,
                worker: worker.to_string(),
                extra: Value::Null,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_stratum_v1_from_array_params() {
        assert_eq!(Dialect::detect(&json!(["foo", 1])), Dialect::StratumV1);
    }

    #[test]
    fn detects_animica_native_from_object_params() {
        assert_eq!(Dialect::detect(&json!({"agent": "x"})), Dialect::AnimicaNative);
        assert_eq!(Dialect::detect(&Value::Null), Dialect::AnimicaNative);
    }

    #[test]
    fn parses_native_submit_params() {
        let params = json!({"jobId": "job-1", "nonce": 42});
        let sub = parse_submit_params(Dialect::AnimicaNative, "alice", &params).unwrap();
        assert_eq!(sub.job_id, "job-1");
        assert_eq!(sub.nonce, 42);
        assert_eq!(sub.worker, "alice");
    }

    #[test]
    fn parses_stratum_v1_submit_params() {
        let params = json!(["job-1", "0x2a"]);
        let sub = parse_submit_params(Dialect::StratumV1, "bob", &params).unwrap();
        assert_eq!(sub.job_id, "job-1");
        assert_eq!(sub.nonce, 42);
        assert_eq!(sub.worker, "bob");
    }

    #[test]
    fn malformed_submit_params_are_rejected() {
        assert!(parse_submit_params(Dialect::AnimicaNative, "a", &json!({"nonce": 1})).is_none());
        assert!(parse_submit_params(Dialect::StratumV1, "a", &json!([])).is_none());
    }
}
