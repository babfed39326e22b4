//! Rewards domain - expected epoch rewards per pool

mod reward_estimator;

pub use reward_estimator::{get_expected_pool_rewards, RewardEstimator};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::errors::StakingError;
use super::{COBB_DOUGLAS_ALPHA, DELEGATOR_STAKE_WEIGHT};

/// Protocol parameters of the reward formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardParameters {
    pub alpha: Decimal,
    pub delegator_stake_weight: Decimal,
}

impl Default for RewardParameters {
    fn default() -> Self {
        Self {
            alpha: COBB_DOUGLAS_ALPHA,
            delegator_stake_weight: DELEGATOR_STAKE_WEIGHT,
        }
    }
}

impl RewardParameters {
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.alpha <= Decimal::ZERO || self.alpha >= Decimal::ONE {
            return Err(StakingError::InvalidRewardParameters(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.delegator_stake_weight < Decimal::ZERO || self.delegator_stake_weight > Decimal::ONE {
            return Err(StakingError::InvalidRewardParameters(format!(
                "delegator stake weight must be in [0, 1], got {}",
                self.delegator_stake_weight
            )));
        }
        Ok(())
    }
}
