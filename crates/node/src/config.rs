// Path: crates/node/src/config.rs
//! On-disk + environment configuration for the `animica-miner` and
//! `animica-stratum-pool` binaries (`spec.md` §6.4). No CLI argument parser
//! lives here (`spec.md` §1 non-goals): a binary takes an optional config
//! file path as its sole positional argument and the six named environment
//! variables override whatever the file (or the built-in default) set.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The six environment variables `spec.md` §6.4 names, each overriding one
/// field of [`NodeConfig`] when set.
const ENV_RPC_URL: &str = "ANIMICA_RPC_URL";
const ENV_WS_URL: &str = "ANIMICA_WS_URL";
const ENV_CHAIN_ID: &str = "ANIMICA_CHAIN_ID";
const ENV_STRATUM_LISTEN: &str = "ANIMICA_STRATUM_LISTEN";
const ENV_MINER_DEVICE: &str = "ANIMICA_MINER_DEVICE";
const ENV_ALLOW_PQ_PURE_FALLBACK: &str = "ANIMICA_ALLOW_PQ_PURE_FALLBACK";
const ENV_UNSAFE_PQ_FAKE: &str = "ANIMICA_UNSAFE_PQ_FAKE";

/// Configuration shared by both binaries, loaded from an optional TOML file
/// and then overridden field-by-field from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// The node/pool JSON-RPC endpoint this process submits shares/blocks to
    /// and (for `animica-miner`) polls templates from.
    pub rpc_url: String,
    /// The node's websocket push endpoint, used to learn about a new parent
    /// head without polling, when available.
    pub ws_url: Option<String>,
    /// Chain id this process expects to be mining/pooling for.
    pub chain_id: u64,
    /// Address `animica-stratum-pool`'s TCP listener binds to.
    pub stratum_listen: String,
    /// Scan device kind: `"cpu"` (always available) or `"cuda"` (feature-gated,
    /// reports `KernelUnavailable` in this build).
    pub miner_device: String,
    /// Dev-only: allow the insecure PQ pure-fallback path. Off by default;
    /// refused outside debug builds regardless of this setting
    /// (`animica_pq::dev_fallback`).
    pub allow_pq_pure_fallback: bool,
    /// Dev-only: use a fake (non-cryptographic) PQ backend. Same guard as
    /// `allow_pq_pure_fallback`.
    pub unsafe_pq_fake: bool,
    /// Poll interval, in milliseconds, for `TemplateFeeder`.
    pub template_poll_interval_ms: u64,
    /// Nonce-range size scanned per device call before checking for a
    /// fresher template.
    pub scan_chunk_size: u64,
    /// Bounded capacity of the found-share queue between `ScannerTask` and
    /// `SubmitPipe` (`spec.md` §4.15 default 2048).
    pub share_queue_capacity: usize,
    /// Number of concurrent `SubmitPipe` workers draining the share queue.
    pub submit_workers: usize,
    /// How long graceful shutdown waits for in-flight work to drain before
    /// giving up (`spec.md` §4.15).
    pub shutdown_drain_timeout_secs: u64,
    /// Share acceptance threshold θ_share, in micro-nats, used by the
    /// reference `ParentTemplateProvider` when no node RPC is configured.
    pub share_target_micro: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            rpc_url: "http://127.0.0.1:8645/rpc".to_string(),
            ws_url: None,
            chain_id: 1,
            stratum_listen: "0.0.0.0:3333".to_string(),
            miner_device: "cpu".to_string(),
            allow_pq_pure_fallback: false,
            unsafe_pq_fake: false,
            template_poll_interval_ms: 500,
            scan_chunk_size: 1_000_000,
            share_queue_capacity: 2048,
            submit_workers: 4,
            shutdown_drain_timeout_secs: 10,
            share_target_micro: 100_000,
        }
    }
}

impl NodeConfig {
    /// Load configuration: start from the built-in default, merge in `path`
    /// (if given and present) as TOML, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(p)?;
                toml::from_str(&text)?
            }
            _ => NodeConfig::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_RPC_URL) {
            self.rpc_url = v;
        }
        if let Ok(v) = std::env::var(ENV_WS_URL) {
            self.ws_url = Some(v);
        }
        if let Ok(v) = std::env::var(ENV_CHAIN_ID) {
            if let Ok(parsed) = v.parse::<u64>() {
                self.chain_id = parsed;
            } else {
                tracing::warn!(value = %v, "ignoring non-numeric ANIMICA_CHAIN_ID");
            }
        }
        if let Ok(v) = std::env::var(ENV_STRATUM_LISTEN) {
            self.stratum_listen = v;
        }
        if let Ok(v) = std::env::var(ENV_MINER_DEVICE) {
            self.miner_device = v;
        }
        if let Ok(v) = std::env::var(ENV_ALLOW_PQ_PURE_FALLBACK) {
            self.allow_pq_pure_fallback = is_truthy(&v);
        }
        if let Ok(v) = std::env::var(ENV_UNSAFE_PQ_FAKE) {
            self.unsafe_pq_fake = is_truthy(&v);
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = NodeConfig::default();
        assert_eq!(config.chain_id, 1);
        assert!(config.submit_workers > 0);
        assert!(config.share_queue_capacity > 0);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = NodeConfig::load(Some(Path::new("/nonexistent/animica-node.toml"))).unwrap();
        assert_eq!(config.rpc_url, NodeConfig::default().rpc_url);
    }

    #[test]
    fn env_override_parses_chain_id() {
        std::env::set_var(ENV_CHAIN_ID, "7");
        let config = NodeConfig::load(None).unwrap();
        std::env::remove_var(ENV_CHAIN_ID);
        assert_eq!(config.chain_id, 7);
    }

    #[test]
    fn truthy_values_recognized() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy("YES"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
