// Path: crates/types/src/chain_params.rs
//! Genesis-fixed chain parameters (component B), grounded on
//! `original_source/core/chain/genesis.py` and the teacher's
//! `GenesisBuilder`-style config loading.

use crate::error::{Result, ValidationError};
use animica_codec::digest::Digest32;
use serde::{Deserialize, Serialize};

/// Genesis-fixed parameters every node and miner must agree on out of band:
/// the chain identifier, the initial useful-work threshold, the policy roots
/// a header's `poiesPolicyRoot`/`pqAlgPolicyRoot` must match at genesis, and
/// the bound on how far `thetaMicro` may step between consecutive headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Domain-separating chain identifier, folded into signing preimages and
    /// the genesis header's `chainId` field.
    pub chain_id: u64,
    /// Initial difficulty threshold, in the same micro-fixed-point units as
    /// `Header::theta_micro`.
    pub theta0_micro: u64,
    /// Genesis `poiesPolicyRoot`: the KV Merkle root of the registered proof
    /// kinds and their verification parameters.
    pub poies_policy_root: Digest32,
    /// Genesis `pqAlgPolicyRoot`: the KV Merkle root of the registered PQ
    /// signature/KEM algorithms and their policy metadata.
    pub pq_alg_policy_root: Digest32,
    /// Maximum allowed absolute difference between consecutive headers'
    /// `thetaMicro`, bounding how fast the useful-work threshold may move.
    pub theta_step_bound_micro: u64,
}

impl ChainParams {
    /// Construct a new parameter set, rejecting a zero step bound (which
    /// would freeze `thetaMicro` forever and make difficulty retargeting
    /// impossible).
    pub fn new(
        chain_id: u64,
        theta0_micro: u64,
        poies_policy_root: Digest32,
        pq_alg_policy_root: Digest32,
        theta_step_bound_micro: u64,
    ) -> Result<Self> {
        if theta_step_bound_micro == 0 {
            return Err(ValidationError::InvalidLength(
                "thetaStepBoundMicro must be non-zero".into(),
            )
            .into());
        }
        Ok(ChainParams {
            chain_id,
            theta0_micro,
            poies_policy_root,
            pq_alg_policy_root,
            theta_step_bound_micro,
        })
    }

    /// Check that `next` does not move further from `prev` than this chain's
    /// step bound allows.
    pub fn check_theta_step(&self, prev_micro: u64, next_micro: u64) -> Result<()> {
        let delta = prev_micro.abs_diff(next_micro);
        if delta > self.theta_step_bound_micro {
            return Err(ValidationError::InvalidLength(format!(
                "thetaMicro step {delta} exceeds bound {}",
                self.theta_step_bound_micro
            ))
            .into());
        }
        Ok(())
    }

    /// Parse chain parameters from a TOML document (the on-disk genesis
    /// config format).
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| ValidationError::InvalidEncoding(format!("bad chain params toml: {e}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_step_bound_is_rejected() {
        assert!(ChainParams::new(1, 1000, Digest32::ZERO, Digest32::ZERO, 0).is_err());
    }

    #[test]
    fn theta_step_within_bound_is_accepted() {
        let params = ChainParams::new(1, 1000, Digest32::ZERO, Digest32::ZERO, 50).unwrap();
        assert!(params.check_theta_step(1000, 1040).is_ok());
        assert!(params.check_theta_step(1000, 1060).is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let params = ChainParams::new(7, 2000, Digest32::ZERO, Digest32::ZERO, 25).unwrap();
        let s = toml::to_string(&params).unwrap();
        let back = ChainParams::from_toml(&s).unwrap();
        assert_eq!(params, back);
    }
}
