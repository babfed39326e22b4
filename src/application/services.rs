//! Application services and use cases

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::pool_source::PoolSource;
use crate::config::Config;
use crate::domain::allocation::StakingAllocator;
use crate::domain::rewards::RewardEstimator;
use crate::report::{RecommendationReport, RewardsReport};
use crate::shared::errors::AppError;
use crate::shared::utils::format_amount;

/// Inputs of a reward projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardQuery {
    pub current_reward_balance: Decimal,
    pub scale_to_end_of_epoch: bool,
}

/// Application service behind the CLI commands
pub struct StakingService {
    allocator: StakingAllocator,
    estimator: RewardEstimator,
    source: Box<dyn PoolSource>,
}

impl StakingService {
    /// Create new staking service
    pub fn new(config: &Config, source: Box<dyn PoolSource>) -> Result<Self, AppError> {
        Ok(Self {
            allocator: StakingAllocator::new(config.allocation.clone())?,
            estimator: RewardEstimator::new(config.rewards.clone())?,
            source,
        })
    }

    /// Recommend pools for `amount`, optionally with the rewards the new stake would earn
    pub async fn recommend(
        &self,
        amount: Decimal,
        rewards: Option<RewardQuery>,
    ) -> Result<RecommendationReport, AppError> {
        info!("🔍 Loading pools from {}", self.source.name());
        let snapshot = self.source.fetch_snapshot().await?;

        let recommendations = self.allocator.allocate(amount, &snapshot.pools)?;
        let mut report = RecommendationReport::new(amount, snapshot.pools.len(), recommendations);

        if let Some(query) = rewards {
            match &snapshot.current_epoch {
                Some(epoch) if !snapshot.epoch_pools.is_empty() => {
                    let projections = self.estimator.estimate_delegator_rewards(
                        &report.recommendations,
                        &snapshot.epoch_pools,
                        epoch,
                        query.current_reward_balance,
                        query.scale_to_end_of_epoch,
                        Utc::now(),
                    )?;
                    report = report.with_expected_rewards(projections);
                }
                _ => warn!("⚠️ Snapshot has no epoch statistics, skipping reward projection"),
            }
        }

        info!(
            "✅ {} recommendations totalling {}",
            report.recommendations.len(),
            format_amount(report.distributed_amount)
        );
        Ok(report)
    }

    /// Expected rewards of every pool in the current epoch
    pub async fn expected_rewards(&self, query: RewardQuery) -> Result<RewardsReport, AppError> {
        info!("🔍 Loading epoch statistics from {}", self.source.name());
        let snapshot = self.source.fetch_snapshot().await?;
        let epoch = snapshot
            .current_epoch
            .as_ref()
            .ok_or_else(|| AppError::SourceError("snapshot has no current epoch".to_string()))?;

        let estimates = self.estimator.estimate(
            &snapshot.epoch_pools,
            epoch,
            query.current_reward_balance,
            query.scale_to_end_of_epoch,
            Utc::now(),
        )?;
        Ok(RewardsReport::new(
            query.scale_to_end_of_epoch,
            query.current_reward_balance,
            estimates.into_values(),
        ))
    }
}
