//! Sources of pool statistics
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::shared::errors::AppError;
use crate::shared::types::PoolSnapshot;

/// Anything that can hand out a fresh pool snapshot
#[async_trait]
pub trait PoolSource: Send + Sync {
    fn name(&self) -> String;

    async fn fetch_snapshot(&self) -> Result<PoolSnapshot, AppError>;
}

/// Snapshot stored as JSON on disk
pub struct FilePoolSource {
    path: PathBuf,
}

impl FilePoolSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PoolSource for FilePoolSource {
    fn name(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch_snapshot(&self) -> Result<PoolSnapshot, AppError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::SourceError(format!("Failed to read {}: {}", self.path.display(), e)))?;
        let snapshot: PoolSnapshot = serde_json::from_str(&content)?;
        info!("📂 Loaded {} pools from {}", snapshot.pools.len(), self.path.display());
        Ok(snapshot)
    }
}

/// Staking API serving `GET {base_url}/staking-pools`
pub struct HttpPoolSource {
    http_client: Client,
    base_url: String,
}

impl HttpPoolSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn pools_url(&self) -> String {
        format!("{}/staking-pools", self.base_url)
    }
}

#[async_trait]
impl PoolSource for HttpPoolSource {
    fn name(&self) -> String {
        self.pools_url()
    }

    async fn fetch_snapshot(&self) -> Result<PoolSnapshot, AppError> {
        let url = self.pools_url();
        info!("🔍 Fetching staking pools from: {}", url);

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!("⚠️ Staking API returned status: {}", response.status());
            return Err(AppError::SourceError(format!(
                "Staking API request failed with status: {}",
                response.status()
            )));
        }

        let snapshot: PoolSnapshot = response.json().await?;
        info!("✅ Fetched {} staking pools", snapshot.pools.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_file_source_reads_snapshot() {
        let path = std::env::temp_dir().join(format!("staking-pools-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"{
                "pools": [
                    {"poolId": "1", "operatorShare": "0.1", "zrxStaked": "1000", "recentFeesGeneratedInEth": "0.5"}
                ],
                "currentEpoch": {
                    "epochStartTimestamp": "2020-06-01T00:00:00Z",
                    "epochLengthInSeconds": 864000,
                    "protocolFeesGeneratedInEth": "0.5"
                }
            }"#,
        )
        .await
        .unwrap();

        let snapshot = FilePoolSource::new(&path).fetch_snapshot().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(snapshot.pools.len(), 1);
        assert_eq!(snapshot.pools[0].zrx_staked, dec!(1000));
        assert_eq!(snapshot.current_epoch.unwrap().epoch_length_in_seconds, 864_000);
        assert!(snapshot.epoch_pools.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_source_error() {
        let result = FilePoolSource::new("/nonexistent/pools.json").fetch_snapshot().await;
        assert!(matches!(result, Err(AppError::SourceError(_))));
    }

    #[test]
    fn test_http_source_url() {
        let source = HttpPoolSource::new("https://staking.example.org/api/");
        assert_eq!(source.name(), "https://staking.example.org/api/staking-pools");
    }
}
