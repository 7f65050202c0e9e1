//! Run configuration
//!
//! Defaults, optionally overridden by a TOML file, then by `ILR_*`
//! environment variables.

use crate::error::{PipelineError, Result};
use crate::shard::DEFAULT_SHARD_SIZE;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

/// Tunables for one validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum records per shard
    pub shard_size: usize,
    /// Workers allowed to run at once; 0 means one per shard
    pub max_parallel_workers: usize,
    /// Per-worker validation deadline; 0 disables it
    pub worker_timeout_secs: u64,
    pub log_level: Option<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            shard_size: DEFAULT_SHARD_SIZE.get(),
            max_parallel_workers: default_parallelism(),
            worker_timeout_secs: 0,
            log_level: None,
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

impl ValidationConfig {
    /// Defaults merged with the environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, then apply environment overrides
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: ValidationConfig = toml::from_str(&content)?;
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        if let Some(value) = env_parse::<usize>("ILR_SHARD_SIZE")? {
            self.shard_size = value;
        }
        if let Some(value) = env_parse::<usize>("ILR_MAX_PARALLEL_WORKERS")? {
            self.max_parallel_workers = value;
        }
        if let Some(value) = env_parse::<u64>("ILR_WORKER_TIMEOUT_SECS")? {
            self.worker_timeout_secs = value;
        }
        if let Ok(log_level) = std::env::var("ILR_LOG_LEVEL") {
            self.log_level = Some(log_level);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.shard_size == 0 {
            return Err(PipelineError::Config(
                "shard_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn shard_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.shard_size).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn concurrency_limit(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.max_parallel_workers)
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        (self.worker_timeout_secs > 0).then(|| Duration::from_secs(self.worker_timeout_secs))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| PipelineError::Config(format!("{} has invalid value {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}
