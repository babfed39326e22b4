//! Expected epoch rewards per pool
//!
//! Rewards of the epoch are split between pools with the protocol's
//! Cobb-Douglas function: a pool's share is its share of protocol fees raised
//! to `alpha` times its share of weighted stake raised to `1 - alpha`.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::RewardParameters;
use crate::shared::errors::StakingError;
use crate::shared::types::{
    DelegatorRewardProjection, EpochFeeSnapshot, PoolEpochStats, PoolRewardEstimate,
    StakingRecommendation,
};
use crate::shared::utils::{checked_pow, checked_sum, share_of};

/// Cobb-Douglas reward estimator
#[derive(Debug, Clone, Default)]
pub struct RewardEstimator {
    params: RewardParameters,
}

impl RewardEstimator {
    pub fn new(params: RewardParameters) -> Result<Self, StakingError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Expected rewards of every pool for the current epoch, keyed by pool id.
    ///
    /// With `scale_to_end_of_epoch` the fees collected so far are extrapolated
    /// linearly to the full epoch length; the rest of the reward balance
    /// (rollover, subsidies) is taken as is.
    pub fn estimate(
        &self,
        pools: &[PoolEpochStats],
        current_epoch: &EpochFeeSnapshot,
        current_reward_balance: Decimal,
        scale_to_end_of_epoch: bool,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, PoolRewardEstimate>, StakingError> {
        validate_epoch_pools(pools)?;
        if current_reward_balance < Decimal::ZERO {
            return Err(StakingError::InvalidAmount(current_reward_balance));
        }
        if current_epoch.protocol_fees_generated_in_eth < Decimal::ZERO {
            return Err(StakingError::InvalidAmount(current_epoch.protocol_fees_generated_in_eth));
        }

        let scale_factor = if scale_to_end_of_epoch {
            scale_factor(current_epoch, now)?
        } else {
            Decimal::ONE
        };
        let projected_rewards = projected_rewards(current_epoch, current_reward_balance, scale_factor)?;

        let estimates = self.distribute(pools, projected_rewards)?;
        info!(
            "💰 Projected {} ETH of rewards over {} pools (scale factor {})",
            projected_rewards,
            pools.len(),
            scale_factor
        );
        Ok(estimates)
    }

    /// What a delegator staking the recommended amounts can expect from each pool.
    ///
    /// All recommended stake is added to the member stake of its pool before the
    /// estimate, since it changes every pool's share of the total.
    pub fn estimate_delegator_rewards(
        &self,
        recommendations: &[StakingRecommendation],
        pools: &[PoolEpochStats],
        current_epoch: &EpochFeeSnapshot,
        current_reward_balance: Decimal,
        scale_to_end_of_epoch: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<DelegatorRewardProjection>, StakingError> {
        let mut adjusted = pools.to_vec();
        for recommendation in recommendations {
            if recommendation.zrx_amount < Decimal::ZERO {
                return Err(StakingError::InvalidAmount(recommendation.zrx_amount));
            }
            let pool = adjusted
                .iter_mut()
                .find(|p| p.pool_id == recommendation.pool_id)
                .ok_or_else(|| StakingError::UnknownPool(recommendation.pool_id.clone()))?;
            pool.member_zrx_staked = pool
                .member_zrx_staked
                .checked_add(recommendation.zrx_amount)
                .ok_or(StakingError::ArithmeticOverflow("member stake"))?;
        }

        let estimates = self.estimate(
            &adjusted,
            current_epoch,
            current_reward_balance,
            scale_to_end_of_epoch,
            now,
        )?;
        let member_stake: HashMap<&str, Decimal> = adjusted
            .iter()
            .map(|p| (p.pool_id.as_str(), p.member_zrx_staked))
            .collect();

        recommendations
            .iter()
            .map(|recommendation| {
                let pool_estimate = estimates
                    .get(&recommendation.pool_id)
                    .cloned()
                    .ok_or_else(|| StakingError::UnknownPool(recommendation.pool_id.clone()))?;
                let members = member_stake
                    .get(recommendation.pool_id.as_str())
                    .copied()
                    .unwrap_or_default();
                let expected_delegator_reward = share_of(recommendation.zrx_amount, members, Decimal::ZERO)?
                    .checked_mul(pool_estimate.expected_member_reward)
                    .ok_or(StakingError::ArithmeticOverflow("delegator reward"))?;

                Ok(DelegatorRewardProjection {
                    pool_id: recommendation.pool_id.clone(),
                    zrx_amount: recommendation.zrx_amount,
                    expected_delegator_reward,
                    pool_estimate,
                })
            })
            .collect()
    }

    fn distribute(
        &self,
        pools: &[PoolEpochStats],
        projected_rewards: Decimal,
    ) -> Result<BTreeMap<String, PoolRewardEstimate>, StakingError> {
        let alpha = self.params.alpha;
        let weighted_stakes = pools
            .iter()
            .map(|pool| self.weighted_stake(pool))
            .collect::<Result<Vec<_>, _>>()?;
        let total_weighted_stake = checked_sum(weighted_stakes.iter().copied(), "total weighted stake")?;
        let total_pool_fees = checked_sum(
            pools.iter().map(|p| p.total_protocol_fees_generated_in_eth),
            "total pool fees",
        )?;

        let mut estimates = BTreeMap::new();
        for (pool, weighted_stake) in pools.iter().zip(weighted_stakes) {
            let fee_term = cobb_douglas_term(
                pool.total_protocol_fees_generated_in_eth,
                total_pool_fees,
                alpha,
                "fee term",
            )?;
            let stake_term = cobb_douglas_term(
                weighted_stake,
                total_weighted_stake,
                Decimal::ONE - alpha,
                "stake term",
            )?;

            let expected_total_reward = projected_rewards
                .checked_mul(fee_term)
                .and_then(|r| r.checked_mul(stake_term))
                .ok_or(StakingError::ArithmeticOverflow("total reward"))?;
            let expected_operator_reward = expected_total_reward
                .checked_mul(pool.operator_share)
                .ok_or(StakingError::ArithmeticOverflow("operator reward"))?;
            let expected_member_reward = expected_total_reward - expected_operator_reward;

            estimates.insert(
                pool.pool_id.clone(),
                PoolRewardEstimate {
                    pool_id: pool.pool_id.clone(),
                    expected_total_reward,
                    expected_operator_reward,
                    expected_member_reward,
                    total_weighted_stake: weighted_stake,
                },
            );
        }
        Ok(estimates)
    }

    fn weighted_stake(&self, pool: &PoolEpochStats) -> Result<Decimal, StakingError> {
        pool.member_zrx_staked
            .checked_mul(self.params.delegator_stake_weight)
            .and_then(|members| members.checked_add(pool.operator_zrx_staked))
            .ok_or(StakingError::ArithmeticOverflow("weighted stake"))
    }
}

/// Expected rewards with the protocol parameters and the current time
pub fn get_expected_pool_rewards(
    pools: &[PoolEpochStats],
    current_epoch: &EpochFeeSnapshot,
    current_reward_balance: Decimal,
    scale_to_end_of_epoch: bool,
) -> Result<BTreeMap<String, PoolRewardEstimate>, StakingError> {
    RewardEstimator::default().estimate(
        pools,
        current_epoch,
        current_reward_balance,
        scale_to_end_of_epoch,
        Utc::now(),
    )
}

/// `epoch length / elapsed time`, at millisecond resolution
fn scale_factor(epoch: &EpochFeeSnapshot, now: DateTime<Utc>) -> Result<Decimal, StakingError> {
    let elapsed = now.signed_duration_since(epoch.epoch_start_timestamp);
    let elapsed_ms = elapsed.num_milliseconds();
    if elapsed_ms <= 0 {
        return Err(StakingError::InvalidTimeWindow(elapsed.num_seconds()));
    }
    let epoch_length_ms = Decimal::from(epoch.epoch_length_in_seconds)
        .checked_mul(Decimal::ONE_THOUSAND)
        .ok_or(StakingError::ArithmeticOverflow("epoch length"))?;
    epoch_length_ms
        .checked_div(Decimal::from(elapsed_ms))
        .ok_or(StakingError::ArithmeticOverflow("scale factor"))
}

fn projected_rewards(
    epoch: &EpochFeeSnapshot,
    current_reward_balance: Decimal,
    scale_factor: Decimal,
) -> Result<Decimal, StakingError> {
    let fee_rewards = epoch.protocol_fees_generated_in_eth;
    let mut other_rewards = current_reward_balance - fee_rewards;
    if other_rewards < Decimal::ZERO {
        warn!(
            "⚠️ Reward balance {} is below epoch fees {}, ignoring non-fee rewards",
            current_reward_balance, fee_rewards
        );
        other_rewards = Decimal::ZERO;
    }
    fee_rewards
        .checked_mul(scale_factor)
        .and_then(|scaled| scaled.checked_add(other_rewards))
        .ok_or(StakingError::ArithmeticOverflow("projected rewards"))
}

/// `(part / whole) ^ exponent`, zero when `whole` is zero
fn cobb_douglas_term(
    part: Decimal,
    whole: Decimal,
    exponent: Decimal,
    what: &'static str,
) -> Result<Decimal, StakingError> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    checked_pow(share_of(part, whole, Decimal::ZERO)?, exponent, what)
}

/// Operator share 1 is accepted here: nothing divides by `1 - share`, the
/// operator just keeps the whole pool reward.
fn validate_epoch_pools(pools: &[PoolEpochStats]) -> Result<(), StakingError> {
    let mut seen = HashSet::with_capacity(pools.len());
    for pool in pools {
        if !seen.insert(pool.pool_id.as_str()) {
            return Err(StakingError::invalid_pool(&pool.pool_id, "duplicate pool id"));
        }
        if pool.operator_share < Decimal::ZERO || pool.operator_share > Decimal::ONE {
            return Err(StakingError::invalid_pool(
                &pool.pool_id,
                format!("operator share {} outside [0, 1]", pool.operator_share),
            ));
        }
        if pool.operator_zrx_staked < Decimal::ZERO || pool.member_zrx_staked < Decimal::ZERO {
            return Err(StakingError::invalid_pool(&pool.pool_id, "negative stake"));
        }
        if pool.total_protocol_fees_generated_in_eth < Decimal::ZERO {
            return Err(StakingError::invalid_pool(&pool.pool_id, "negative fees"));
        }
    }
    Ok(())
}
