// Path: crates/submitter/src/consumer.rs
//! Background task draining a bounded share queue into a
//! [`SubmitterClient`], batching opportunistically (`spec.md` §4.11).

use crate::client::SubmitterClient;
use animica_api::ShareSubmission;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

/// How many queued shares to pull into one batch submission at most, and how
/// long to wait for the batch to fill before submitting a partial one.
#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    pub max_batch: usize,
    pub batch_window: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            max_batch: 16,
            batch_window: Duration::from_millis(50),
        }
    }
}

/// Drains `rx` until the channel closes, submitting shares through `client`.
/// Individual submission errors are logged and do not stop the loop — a
/// single bad share (stale job, transient RPC failure after retries) should
/// not block the shares queued behind it.
pub async fn run_consumer(client: Arc<SubmitterClient>, mut rx: Receiver<ShareSubmission>, config: ConsumerConfig) {
    let mut batch = Vec::with_capacity(config.max_batch);
    loop {
        batch.clear();
        match rx.recv().await {
            Some(first) => batch.push(first),
            None => return,
        }
        let deadline = tokio::time::sleep(config.batch_window);
        tokio::pin!(deadline);
        while batch.len() < config.max_batch {
            tokio::select! {
                biased;
                maybe_share = rx.recv() => {
                    match maybe_share {
                        Some(share) => batch.push(share),
                        None => break,
                    }
                }
                _ = &mut deadline => break,
            }
        }
        for share in batch.drain(..) {
            let job_id = share.job_id.clone();
            match client.submit_share_once(share).await {
                Ok(outcome) if outcome.accepted => {
                    tracing::debug!(job_id, d_ratio = ?outcome.d_ratio, "share accepted");
                }
                Ok(outcome) => {
                    tracing::debug!(job_id, reason = ?outcome.reason, "share rejected");
                }
                Err(err) => {
                    tracing::warn!(job_id, %err, "share submission failed");
                }
            }
        }
        if rx.is_closed() && rx.is_empty() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SubmitterConfig;
    use tokio::sync::mpsc::channel;

    #[tokio::test]
    async fn consumer_drains_until_channel_closes() {
        let client = Arc::new(SubmitterClient::new(SubmitterConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        }).unwrap());
        let (tx, rx) = channel(8);
        drop(tx);
        run_consumer(client, rx, ConsumerConfig::default()).await;
    }
}
