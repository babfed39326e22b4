//! Common types used across the application

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statistics of a staking pool used to pick where new stake goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStat {
    pub pool_id: String,
    /// Fraction of rewards retained by the operator, in [0, 1]
    pub operator_share: Decimal,
    /// Total stake currently delegated to the pool
    pub zrx_staked: Decimal,
    /// Protocol fees attributed to the pool over the trailing window (7 days)
    pub recent_fees_generated_in_eth: Decimal,
}

impl PoolStat {
    pub fn new(
        pool_id: impl Into<String>,
        operator_share: Decimal,
        zrx_staked: Decimal,
        recent_fees_generated_in_eth: Decimal,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            operator_share,
            zrx_staked,
            recent_fees_generated_in_eth,
        }
    }
}

/// Amount of stake recommended for a single pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingRecommendation {
    pub pool_id: String,
    pub zrx_amount: Decimal,
}

/// Fee state of the epoch in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochFeeSnapshot {
    pub epoch_start_timestamp: DateTime<Utc>,
    pub epoch_length_in_seconds: u64,
    /// Fees collected so far this epoch
    pub protocol_fees_generated_in_eth: Decimal,
}

/// Per-pool stake and fee figures for the epoch in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEpochStats {
    pub pool_id: String,
    pub operator_share: Decimal,
    pub operator_zrx_staked: Decimal,
    pub member_zrx_staked: Decimal,
    pub total_protocol_fees_generated_in_eth: Decimal,
}

/// Expected rewards of one pool for the epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRewardEstimate {
    pub pool_id: String,
    pub expected_total_reward: Decimal,
    pub expected_operator_reward: Decimal,
    pub expected_member_reward: Decimal,
    /// Operator stake plus member stake scaled by the delegator weight
    pub total_weighted_stake: Decimal,
}

/// What a new delegator can expect to earn from a recommended pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorRewardProjection {
    pub pool_id: String,
    pub zrx_amount: Decimal,
    pub expected_delegator_reward: Decimal,
    pub pool_estimate: PoolRewardEstimate,
}

/// Everything a pool source returns in one fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolSnapshot {
    pub pools: Vec<PoolStat>,
    pub current_epoch: Option<EpochFeeSnapshot>,
    pub epoch_pools: Vec<PoolEpochStats>,
}
