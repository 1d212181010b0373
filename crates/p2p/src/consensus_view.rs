// Path: crates/p2p/src/consensus_view.rs
//! Cheap sync-time consensus checks (`spec.md` §4.13, component K):
//! chain-id/policy-root agreement, the bounded Θ step rule, and timestamp
//! monotonicity — all fast enough to run on every gossiped header before a
//! peer is allowed to push a full block through the (out-of-scope) executor.

use animica_codec::digest::Digest32;
use animica_types::error::ConsensusError;
use animica_types::header::Header;
use animica_types::Result;

/// Default fractional bound on how far a single header may move
/// `thetaMicro` relative to its parent (`spec.md` §4.13, `r = 0.25`).
pub const DEFAULT_THETA_STEP_RATIO: f64 = 0.25;

/// Default tolerance around a configured `theta0` that genesis headers are
/// allowed to deviate by (`spec.md` §4.13, "±10% around a configured theta0").
pub const GENESIS_THETA_TOLERANCE_RATIO: f64 = 0.10;

/// A node's locally configured view of the chain, used to cheaply validate
/// gossiped headers before committing to full consensus/state validation.
#[derive(Debug, Clone)]
pub struct ConsensusView {
    /// This node's configured chain id; headers with a different value are rejected.
    pub chain_id: u64,
    /// Expected `poiesPolicyRoot`, when the node pins one (governance may
    /// later permit multiple valid roots; `None` skips the check).
    pub expected_poies_policy_root: Option<Digest32>,
    /// Expected `pqAlgPolicyRoot`, same caveat as above.
    pub expected_pq_alg_policy_root: Option<Digest32>,
    /// Genesis `theta0`, used only to bound the genesis header's `thetaMicro`.
    pub theta0_micro: u64,
    /// Fractional bound on inter-header Θ movement (default 0.25).
    pub theta_step_ratio: f64,
    /// Protocol-wide floor Θ may never move below.
    pub theta_min_micro: u64,
    /// Protocol-wide ceiling Θ may never move above.
    pub theta_max_micro: u64,
}

impl ConsensusView {
    /// Construct a view with the default Θ step ratio.
    pub fn new(
        chain_id: u64,
        theta0_micro: u64,
        theta_min_micro: u64,
        theta_max_micro: u64,
    ) -> Self {
        ConsensusView {
            chain_id,
            expected_poies_policy_root: None,
            expected_pq_alg_policy_root: None,
            theta0_micro,
            theta_step_ratio: DEFAULT_THETA_STEP_RATIO,
            theta_min_micro,
            theta_max_micro,
        }
    }

    /// Pin the expected policy roots this view checks gossiped headers against.
    pub fn with_policy_roots(mut self, poies: Digest32, pq_alg: Digest32) -> Self {
        self.expected_poies_policy_root = Some(poies);
        self.expected_pq_alg_policy_root = Some(pq_alg);
        self
    }

    /// Check `header`'s `chainId` against the locally configured value.
    pub fn check_chain_id(&self, header: &Header) -> Result<()> {
        if header.chain_id != self.chain_id {
            return Err(ConsensusError::ChainIdMismatch {
                expected: self.chain_id,
                got: header.chain_id,
            }
            .into());
        }
        Ok(())
    }

    /// Check `header`'s policy roots against the pinned expectations, when set.
    pub fn check_policy_roots(&self, header: &Header) -> Result<()> {
        if let Some(expected) = self.expected_poies_policy_root {
            if header.poies_policy_root != expected {
                return Err(ConsensusError::PolicyRootMismatch {
                    which: "poiesPolicyRoot",
                }
                .into());
            }
        }
        if let Some(expected) = self.expected_pq_alg_policy_root {
            if header.pq_alg_policy_root != expected {
                return Err(ConsensusError::PolicyRootMismatch {
                    which: "pqAlgPolicyRoot",
                }
                .into());
            }
        }
        Ok(())
    }

    /// Check a Θ step: genesis headers (`height == 0`) tolerate ±10% around
    /// `theta0_micro`; every other header must fall within `[max(min,
    /// prev*(1-r)), min(max, prev*(1+r))]` of its parent's Θ (`spec.md` §4.13).
    pub fn check_theta_step(&self, header: &Header, parent_theta_micro: Option<u64>) -> Result<()> {
        let theta = header.theta_micro;
        if header.height == 0 {
            let lo = (self.theta0_micro as f64 * (1.0 - GENESIS_THETA_TOLERANCE_RATIO)).round() as u64;
            let hi = (self.theta0_micro as f64 * (1.0 + GENESIS_THETA_TOLERANCE_RATIO)).round() as u64;
            return self.bounds_check(theta, lo, hi);
        }
        let prev = parent_theta_micro.unwrap_or(self.theta0_micro);
        let lo = (prev as f64 * (1.0 - self.theta_step_ratio)).round() as u64;
        let hi = (prev as f64 * (1.0 + self.theta_step_ratio)).round() as u64;
        let lo = lo.max(self.theta_min_micro);
        let hi = hi.min(self.theta_max_micro);
        self.bounds_check(theta, lo, hi)
    }

    fn bounds_check(&self, theta: u64, lo: u64, hi: u64) -> Result<()> {
        if theta < lo || theta > hi {
            return Err(ConsensusError::ThetaOutOfBounds {
                theta_micro: theta,
                min: lo,
                max: hi,
            }
            .into());
        }
        Ok(())
    }

    /// Check that `header.timestamp` strictly increased over its parent's,
    /// when the caller carries parent timestamps (`spec.md` §4.13).
    pub fn check_timestamp_monotonic(&self, header: &Header, parent_timestamp: Option<u64>) -> Result<()> {
        if let Some(parent) = parent_timestamp {
            if header.timestamp <= parent {
                return Err(ConsensusError::TimestampNonMonotonic {
                    parent,
                    child: header.timestamp,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Run every cheap check this view owns against a gossiped header and
    /// its known parent context.
    pub fn check_header(&self, header: &Header, parent_theta_micro: Option<u64>, parent_timestamp: Option<u64>) -> Result<()> {
        self.check_chain_id(header)?;
        self.check_policy_roots(header)?;
        self.check_theta_step(header, parent_theta_micro)?;
        self.check_timestamp_monotonic(header, parent_timestamp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(chain_id: u64, height: u64, theta_micro: u64, timestamp: u64) -> Header {
        if height == 0 {
            Header::genesis(
                chain_id,
                timestamp,
                Digest32::ZERO,
                Digest32::ZERO,
                Digest32::ZERO,
                Digest32::ZERO,
                Digest32::ZERO,
                Digest32::ZERO,
                Digest32::ZERO,
                Digest32::ZERO,
                theta_micro,
                vec![],
            )
            .unwrap()
        } else {
            let parent = header_with(chain_id, 0, theta_micro, timestamp - 1);
            parent
                .build_child(timestamp, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, Digest32::ZERO, None, None, None, Some(theta_micro), vec![])
                .unwrap()
        }
    }

    #[test]
    fn chain_id_mismatch_is_rejected() {
        let view = ConsensusView::new(1, 1_000_000, 1, u64::MAX);
        let header = header_with(2, 0, 1_000_000, 10);
        assert!(view.check_chain_id(&header).is_err());
    }

    #[test]
    fn genesis_theta_tolerates_ten_percent() {
        let view = ConsensusView::new(1, 1_000_000, 1, u64::MAX);
        let within = header_with(1, 0, 1_050_000, 10);
        assert!(view.check_theta_step(&within, None).is_ok());
        let outside = header_with(1, 0, 1_200_000, 10);
        assert!(view.check_theta_step(&outside, None).is_err());
    }

    #[test]
    fn non_genesis_theta_step_bound_is_enforced() {
        let view = ConsensusView::new(1, 1_000_000, 1, u64::MAX);
        let header = header_with(1, 1, 1_200_000, 20);
        assert!(view.check_theta_step(&header, Some(1_000_000)).is_ok());
        let header = header_with(1, 1, 1_300_000, 20);
        assert!(view.check_theta_step(&header, Some(1_000_000)).is_err());
    }

    #[test]
    fn timestamp_must_strictly_increase() {
        let view = ConsensusView::new(1, 1_000_000, 1, u64::MAX);
        let header = header_with(1, 0, 1_000_000, 10);
        assert!(view.check_timestamp_monotonic(&header, Some(9)).is_ok());
        assert!(view.check_timestamp_monotonic(&header, Some(10)).is_err());
    }

    #[test]
    fn policy_root_mismatch_is_rejected_when_pinned() {
        let view = ConsensusView::new(1, 1_000_000, 1, u64::MAX)
            .with_policy_roots(Digest32::from_array([1; 32]), Digest32::from_array([2; 32]));
        let header = header_with(1, 0, 1_000_000, 10);
        assert!(view.check_policy_roots(&header).is_err());
    }
}
