use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::domain::allocation::AllocationOptions;
use crate::domain::rewards::RewardParameters;

/// Where pool statistics are fetched from
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    pub pools_url: Option<String>,
    pub pools_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub allocation: AllocationOptions,
    pub rewards: RewardParameters,
    pub source: SourceCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse staking config")?;
        cfg.allocation.validate()?;
        cfg.rewards.validate()?;
        Ok(cfg)
    }
}
