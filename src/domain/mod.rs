//! Domain layer - staking pool allocation and reward estimation

pub mod allocation;
pub mod rewards;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Cobb-Douglas alpha of the staking protocol (2/3)
pub const COBB_DOUGLAS_ALPHA: Decimal = dec!(0.6666666666666666666666666667);

/// Weight of member (delegated) stake relative to operator stake
pub const DELEGATOR_STAKE_WEIGHT: Decimal = dec!(0.9);

/// Epoch duration of the staking protocol (10 days)
pub const EPOCH_LENGTH_IN_SECONDS: u64 = 864_000;

/// Stake is handed out in this many equal slices by default
pub const DEFAULT_NUM_ITERATIONS: usize = 3;
