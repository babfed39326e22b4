//! Allocation domain - splitting new stake across pools

mod allocator;

pub use allocator::{get_recommended_staking_pools, StakingAllocator};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::errors::StakingError;
use super::{COBB_DOUGLAS_ALPHA, DEFAULT_NUM_ITERATIONS};

/// Tuning knobs of the allocator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationOptions {
    /// Cobb-Douglas exponent, strictly between 0 and 1
    pub alpha: Decimal,
    /// Number of equal slices the stake is handed out in
    pub num_iterations: usize,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        Self {
            alpha: COBB_DOUGLAS_ALPHA,
            num_iterations: DEFAULT_NUM_ITERATIONS,
        }
    }
}

impl AllocationOptions {
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.alpha <= Decimal::ZERO || self.alpha >= Decimal::ONE {
            return Err(StakingError::InvalidAllocationOptions(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.num_iterations == 0 {
            return Err(StakingError::InvalidAllocationOptions(
                "num_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
