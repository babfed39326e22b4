//! Application layer - use cases and services

pub mod commands;
pub mod pool_source;
pub mod services;

pub use commands::{Cli, Commands, CommandExecutor};
pub use pool_source::{FilePoolSource, HttpPoolSource, PoolSource};
pub use services::{RewardQuery, StakingService};
