//! Distributed shard execution
//!
//! The coordinator fans shards out to ephemeral, isolated workers and merges
//! their results once every worker has finished. Workers only ever see
//! serialized payloads, so each one owns a private copy of the reference
//! snapshot and its shard.

pub mod coordinator;
pub mod launcher;
pub mod local;
pub mod payload;

pub use coordinator::{ShardCoordinator, ShardedValidationReport, ShardedValidator};
pub use launcher::{ValidationWorker, WorkerLauncher};
pub use local::{LocalWorkerLauncher, WorkerRuleSets};
pub use payload::{ShardPayload, SnapshotPayload, WorkerId, WorkerRequest};

use crate::rules::RuleError;
use std::time::Duration;

/// Infrastructure failures during sharded execution
///
/// None of these are rule violations. Any of them fails the whole pass,
/// except [`WorkerError::Teardown`], which the coordinator only logs.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker {worker_id}: {reason}")]
    Spawn { worker_id: WorkerId, reason: String },

    #[error("Worker {worker_id} failed on shard {shard}: {reason}")]
    Dispatch {
        worker_id: WorkerId,
        shard: String,
        reason: String,
    },

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Worker {worker_id} timed out after {timeout:?}")]
    Timeout {
        worker_id: WorkerId,
        timeout: Duration,
    },

    #[error("Worker task panicked: {0}")]
    Panicked(String),

    #[error("Teardown of worker {worker_id} failed: {reason}")]
    Teardown { worker_id: WorkerId, reason: String },

    #[error("Sharded validation cancelled")]
    Cancelled,

    #[error(transparent)]
    Rule(#[from] RuleError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;
