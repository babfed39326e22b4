//! Error handling for the application

use rust_decimal::Decimal;
use thiserror::Error;

/// Staking computation errors
///
/// An empty pool list or a zero stake is not an error: both produce an empty result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StakingError {
    #[error("Invalid configuration for pool {pool_id}: {reason}")]
    InvalidPoolConfiguration { pool_id: String, reason: String },

    #[error("Invalid epoch time window: {0}s elapsed since epoch start")]
    InvalidTimeWindow(i64),

    #[error("Invalid stake amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Invalid allocation options: {0}")]
    InvalidAllocationOptions(String),

    #[error("Invalid reward parameters: {0}")]
    InvalidRewardParameters(String),

    #[error("Pool not found: {0}")]
    UnknownPool(String),

    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),
}

impl StakingError {
    pub fn invalid_pool(pool_id: &str, reason: impl Into<String>) -> Self {
        StakingError::InvalidPoolConfiguration {
            pool_id: pool_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Pool source error: {0}")]
    SourceError(String),

    #[error(transparent)]
    Staking(#[from] StakingError),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::SourceError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SourceError(err.to_string())
    }
}
