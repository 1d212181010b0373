// Path: crates/mining/src/validator.rs
//! A reference [`ShareValidator`] that recomputes the scan digest for a
//! submitted nonce and re-checks the acceptance draw, rather than trusting
//! the submitter's claim (`spec.md` §4.10's "dev mode" fallback: structural
//! sanity is always checked; full HashShare re-derivation happens here when
//! no external cryptographic adapter is wired in).

use crate::scan::{d_ratio, header_prefix, map_uniform, ratio_accepts, scan_digest_with_prefix};
use animica_api::{MiningJob, ShareSubmission, ShareValidator, SubmitOutcome};
use dashmap::DashSet;
use std::sync::Arc;

/// Upper bound on distinct `(job_id, nonce)` pairs tracked for duplicate
/// detection before the oldest entries are evicted. Bounds memory against a
/// long-running server seeing many jobs over its lifetime.
const MAX_TRACKED_SUBMISSIONS: usize = 1 << 16;

/// Recomputes `scan_digest(header.with_nonce(nonce))` against the job it was
/// submitted for, rejecting stale jobs, sub-threshold draws, and nonces
/// already seen for that job.
pub struct HashShareValidator {
    seen: DashSet<(String, u64)>,
}

impl Default for HashShareValidator {
    fn default() -> Self {
        HashShareValidator { seen: DashSet::new() }
    }
}

impl HashShareValidator {
    /// Construct an empty validator with no submissions recorded yet.
    pub fn new() -> Self {
        HashShareValidator::default()
    }

    /// Wrap in an `Arc` for sharing across a Stratum server's sessions.
    pub fn shared() -> Arc<Self> {
        Arc::new(HashShareValidator::new())
    }
}

impl ShareValidator for HashShareValidator {
    fn validate(&self, job: &MiningJob, submission: &ShareSubmission) -> SubmitOutcome {
        if submission.job_id != job.job_id {
            return SubmitOutcome {
                accepted: false,
                reason: Some("stale-job".to_string()),
                hash: None,
                d_ratio: None,
                height: None,
            };
        }

        let key = (submission.job_id.clone(), submission.nonce);
        if !self.seen.insert(key) {
            return SubmitOutcome {
                accepted: false,
                reason: Some("duplicate".to_string()),
                hash: None,
                d_ratio: None,
                height: None,
            };
        }
        if self.seen.len() > MAX_TRACKED_SUBMISSIONS {
            self.seen.clear();
        }

        let prefix = header_prefix(&job.header);
        let digest = scan_digest_with_prefix(&prefix, &job.header.mix_seed, submission.nonce);
        let u = map_uniform(&digest);
        if !ratio_accepts(u, job.share_target_micro) {
            return SubmitOutcome {
                accepted: false,
                reason: Some("low-difficulty".to_string()),
                hash: None,
                d_ratio: Some(d_ratio(u, job.share_target_micro)),
                height: None,
            };
        }

        SubmitOutcome {
            accepted: true,
            reason: None,
            hash: Some(digest),
            d_ratio: Some(d_ratio(u, job.share_target_micro)),
            height: Some(job.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{map_uniform as _, scan_digest};
    use animica_codec::digest::Digest32;
    use animica_types::header::Header;

    fn job_with_nonce_range(share_target_micro: u64) -> MiningJob {
        let header = Header::genesis(
            1,
            1,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::from_array([3; 32]),
            Digest32::ZERO,
            Digest32::ZERO,
            share_target_micro,
            vec![],
        )
        .unwrap();
        MiningJob {
            job_id: "job-1".to_string(),
            header,
            theta_micro: share_target_micro,
            share_target_micro,
            height: 0,
            txs: vec![],
            proofs: vec![],
            hints: serde_json::Value::Null,
        }
    }

    fn find_accepting_nonce(job: &MiningJob) -> u64 {
        (0..200_000u64)
            .find(|n| {
                let digest = scan_digest(&job.header.with_nonce(*n), *n);
                ratio_accepts(map_uniform(&digest), job.share_target_micro)
            })
            .expect("a generous threshold should yield a hit within range")
    }

    #[test]
    fn accepts_a_genuinely_winning_nonce() {
        let job = job_with_nonce_range(900_000);
        let nonce = find_accepting_nonce(&job);
        let validator = HashShareValidator::new();
        let submission = ShareSubmission {
            job_id: job.job_id.clone(),
            nonce,
            worker: "tester".to_string(),
            extra: serde_json::Value::Null,
        };
        let outcome = validator.validate(&job, &submission);
        assert!(outcome.accepted, "expected nonce {nonce} to accept");
    }

    #[test]
    fn rejects_stale_job_id() {
        let job = job_with_nonce_range(900_000);
        let validator = HashShareValidator::new();
        let submission = ShareSubmission {
            job_id: "some-other-job".to_string(),
            nonce: 0,
            worker: "tester".to_string(),
            extra: serde_json::Value::Null,
        };
        let outcome = validator.validate(&job, &submission);
        assert!(!outcome.accepted);
        assert_eq!(outcome.reason.as_deref(), Some("stale-job"));
    }

    #[test]
    fn rejects_duplicate_submission_of_the_same_nonce() {
        let job = job_with_nonce_range(900_000);
        let nonce = find_accepting_nonce(&job);
        let validator = HashShareValidator::new();
        let submission = ShareSubmission {
            job_id: job.job_id.clone(),
            nonce,
            worker: "tester".to_string(),
            extra: serde_json::Value::Null,
        };
        assert!(validator.validate(&job, &submission).accepted);
        let second = validator.validate(&job, &submission);
        assert!(!second.accepted);
        assert_eq!(second.reason.as_deref(), Some("duplicate"));
    }

    #[test]
    fn rejects_low_difficulty_nonce() {
        // theta so small that an arbitrary fixed nonce essentially never accepts.
        let job = job_with_nonce_range(1);
        let validator = HashShareValidator::new();
        let submission = ShareSubmission {
            job_id: job.job_id.clone(),
            nonce: 12345,
            worker: "tester".to_string(),
            extra: serde_json::Value::Null,
        };
        let outcome = validator.validate(&job, &submission);
        assert!(!outcome.accepted);
        assert_eq!(outcome.reason.as_deref(), Some("low-difficulty"));
    }
}
