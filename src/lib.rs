//! Staking pools - stake allocation and expected epoch rewards
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod application;
pub mod shared;
pub mod config;
pub mod report;

// Re-export main types for convenience
pub use domain::allocation::{get_recommended_staking_pools, AllocationOptions, StakingAllocator};
pub use domain::rewards::{get_expected_pool_rewards, RewardEstimator, RewardParameters};
pub use shared::errors::{AppError, StakingError};
pub use shared::types::{
    DelegatorRewardProjection, EpochFeeSnapshot, PoolEpochStats, PoolRewardEstimate, PoolSnapshot,
    PoolStat, StakingRecommendation,
};
