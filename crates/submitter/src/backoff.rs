// Path: crates/submitter/src/backoff.rs
//! Exponential backoff with jitter for retrying transient submission errors
//! (`spec.md` §4.11: "transport/server errors apply exponential backoff with
//! jitter, bounded by `max_retries`").

use rand::Rng;
use std::time::Duration;

/// Backoff schedule parameters. `attempt` is zero-based: the first retry
/// (after the initial, non-retried attempt) uses `attempt == 0`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            base: Duration::from_millis(200),
            max: Duration::from_secs(10),
            max_retries: 5,
        }
    }
}

impl BackoffPolicy {
    /// Whether a retry is still permitted after `attempt` failed attempts.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before retry number `attempt` (0-based), doubling each time and
    /// capped at `max`, with up to 20% jitter added to avoid thundering-herd
    /// resubmission from many miners at once.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        let scaled = self.base.saturating_mul(factor as u32);
        let capped = scaled.min(self.max);
        let jitter_frac = rand::thread_rng().gen_range(0.0..0.2);
        let jitter = capped.mul_f64(jitter_frac);
        capped.saturating_add(jitter).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_then_saturates_at_max() {
        let policy = BackoffPolicy {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
            max_retries: 10,
        };
        let d0 = policy.delay_for(0);
        let d3 = policy.delay_for(3);
        assert!(d0 >= Duration::from_millis(100));
        assert!(d3 > d0);
        let d_far = policy.delay_for(20);
        assert!(d_far <= Duration::from_secs(1));
    }

    #[test]
    fn should_retry_respects_max_retries() {
        let policy = BackoffPolicy {
            max_retries: 3,
            ..Default::default()
        };
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
