use crate::rules::RuleError;
use crate::worker::WorkerError;
use thiserror::Error;

/// Errors surfaced by a pre-validation run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache population failed: {0}")]
    CachePopulation(String),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Sharded validation failed: {0}")]
    Worker(#[from] WorkerError),

    #[error("Validation output handoff failed: {0}")]
    Output(String),

    #[error("Run cancelled during {stage}")]
    Cancelled { stage: &'static str },
}

impl PipelineError {
    /// True when the run stopped because cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Cancelled { .. } | PipelineError::Worker(WorkerError::Cancelled)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
