// Path: crates/node/src/bin/animica-stratum-pool.rs
//! Standalone Stratum server binary: accepts Animica-native and classic
//! Stratum v1 connections, serves jobs polled from a reference template
//! provider, and validates submitted shares against the job they reference
//! (`spec.md` §4.10, §6.4). Takes an optional TOML config file path as its
//! only positional argument; no CLI argument parser lives in this binary.

use animica_codec::digest::Digest32;
use animica_mining::template::ParentTemplateProvider;
use animica_mining::HashShareValidator;
use animica_node::NodeConfig;
use animica_stratum::{StratumConfig, StratumServer};
use animica_types::header::Header;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = NodeConfig::load(config_path.as_deref())?;

    animica_telemetry::init::init_tracing()?;
    if let Ok(sink) = animica_telemetry::prometheus::install() {
        let _ = animica_telemetry::sinks::SINK.set(sink);
        tokio::spawn(animica_telemetry::http::run_server("0.0.0.0:9102".parse()?));
    }

    tracing::info!(listen = %config.stratum_listen, chain_id = config.chain_id, "starting animica-stratum-pool");

    let genesis = Header::genesis(
        config.chain_id,
        1,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::ZERO,
        Digest32::from_array([0x70; 32]),
        Digest32::ZERO,
        Digest32::ZERO,
        config.share_target_micro,
        vec![],
    )?;
    let provider = Arc::new(ParentTemplateProvider::new(genesis, config.share_target_micro));
    let validator = HashShareValidator::shared();

    let server = Arc::new(
        StratumServer::new(
            StratumConfig {
                bind_addr: config.stratum_listen.clone(),
                default_share_target_micro: config.share_target_micro,
                ..Default::default()
            },
            validator,
        ),
    );

    let publisher_server = Arc::clone(&server);
    let poll_interval = Duration::from_millis(config.template_poll_interval_ms);
    tokio::spawn(async move {
        use animica_api::{TemplateProvider, TemplateRequest};
        let mut last_job_id: Option<String> = None;
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            match provider.get_template(TemplateRequest::default()).await {
                Ok(job) => {
                    if last_job_id.as_deref() != Some(job.job_id.as_str()) {
                        last_job_id = Some(job.job_id.clone());
                        publisher_server.publish_job(job, true);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "template poll failed");
                }
            }
        }
    });

    server.run().await?;
    Ok(())
}
