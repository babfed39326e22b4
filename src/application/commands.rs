//! CLI commands and handlers
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use super::pool_source::{FilePoolSource, HttpPoolSource, PoolSource};
use super::services::{RewardQuery, StakingService};
use crate::config::Config;
use crate::shared::errors::AppError;

#[derive(Parser, Debug)]
#[command(name = "staking-pools", version)]
#[command(about = "Staking pool recommendations and expected epoch rewards")]
pub struct Cli {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// JSON file holding a pool snapshot (overrides config)
    #[arg(long, global = true)]
    pub pools_file: Option<String>,

    /// Staking API base URL (overrides config and --pools-file)
    #[arg(long, global = true)]
    pub pools_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Recommend how to split a stake across pools
    Recommend {
        /// Amount to stake; precision beyond 2 decimals is dropped
        #[arg(short, long)]
        amount: Decimal,

        /// Cobb-Douglas alpha (overrides config)
        #[arg(long)]
        alpha: Option<Decimal>,

        /// Number of slices the stake is handed out in (overrides config)
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Current reward balance; adds expected rewards to the output
        #[arg(long)]
        reward_balance: Option<Decimal>,

        /// Extrapolate this epoch's fees to the end of the epoch
        #[arg(long)]
        scale: bool,
    },

    /// Expected rewards of every pool for the current epoch
    Rewards {
        /// Current reward balance of the staking contract
        #[arg(short, long)]
        balance: Decimal,

        /// Extrapolate this epoch's fees to the end of the epoch
        #[arg(long)]
        scale: bool,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command and return its JSON report
    pub async fn execute(command: Commands, mut config: Config) -> Result<String, AppError> {
        match command {
            Commands::Recommend { amount, alpha, iterations, reward_balance, scale } => {
                if let Some(alpha) = alpha {
                    config.allocation.alpha = alpha;
                }
                if let Some(iterations) = iterations {
                    config.allocation.num_iterations = iterations;
                }
                let query = reward_balance.map(|current_reward_balance| RewardQuery {
                    current_reward_balance,
                    scale_to_end_of_epoch: scale,
                });
                Self::execute_recommend_command(amount, query, config).await
            }
            Commands::Rewards { balance, scale } => {
                let query = RewardQuery {
                    current_reward_balance: balance,
                    scale_to_end_of_epoch: scale,
                };
                Self::execute_rewards_command(query, config).await
            }
        }
    }

    async fn execute_recommend_command(
        amount: Decimal,
        query: Option<RewardQuery>,
        config: Config,
    ) -> Result<String, AppError> {
        info!("🚀 Recommending pools for {} ZRX", amount);
        let service = StakingService::new(&config, pool_source(&config)?)?;
        let report = service.recommend(amount, query).await?;
        Ok(report.to_json()?)
    }

    async fn execute_rewards_command(query: RewardQuery, config: Config) -> Result<String, AppError> {
        info!("🚀 Estimating epoch rewards from a balance of {} ETH", query.current_reward_balance);
        let service = StakingService::new(&config, pool_source(&config)?)?;
        let report = service.expected_rewards(query).await?;
        Ok(report.to_json()?)
    }
}

/// Pick the pool source from config: URL first, then file
pub fn pool_source(config: &Config) -> Result<Box<dyn PoolSource>, AppError> {
    if let Some(url) = &config.source.pools_url {
        return Ok(Box::new(HttpPoolSource::new(url.clone())));
    }
    if let Some(path) = &config.source.pools_file {
        return Ok(Box::new(FilePoolSource::new(path)));
    }
    Err(AppError::ConfigError(
        "no pool source configured, use --pools-url or --pools-file".to_string(),
    ))
}
