// src/report.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::types::{DelegatorRewardProjection, PoolRewardEstimate, StakingRecommendation};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub requested_amount: Decimal,
    /// Requested amount truncated to the display decimals
    pub distributed_amount: Decimal,
    pub pools_considered: usize,
    pub recommendations: Vec<StakingRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_rewards: Option<Vec<DelegatorRewardProjection>>,
    pub timestamp: DateTime<Utc>,
}

impl RecommendationReport {
    pub fn new(
        requested_amount: Decimal,
        pools_considered: usize,
        recommendations: Vec<StakingRecommendation>,
    ) -> Self {
        Self {
            requested_amount,
            distributed_amount: recommendations.iter().map(|r| r.zrx_amount).sum(),
            pools_considered,
            recommendations,
            expected_rewards: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_expected_rewards(mut self, projections: Vec<DelegatorRewardProjection>) -> Self {
        self.expected_rewards = Some(projections);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsReport {
    pub scaled_to_end_of_epoch: bool,
    pub current_reward_balance: Decimal,
    pub estimates: Vec<PoolRewardEstimate>,
    pub timestamp: DateTime<Utc>,
}

impl RewardsReport {
    /// Estimates are listed by expected total reward, largest first
    pub fn new(
        scaled_to_end_of_epoch: bool,
        current_reward_balance: Decimal,
        estimates: impl IntoIterator<Item = PoolRewardEstimate>,
    ) -> Self {
        let mut estimates: Vec<PoolRewardEstimate> = estimates.into_iter().collect();
        estimates.sort_by(|a, b| b.expected_total_reward.cmp(&a.expected_total_reward));
        Self {
            scaled_to_end_of_epoch,
            current_reward_balance,
            estimates,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
