//! Worker lifecycle seam

use super::payload::{WorkerId, WorkerRequest};
use super::WorkerResult;
use async_trait::async_trait;

/// Creates isolated workers on demand
///
/// One worker is spawned per shard and torn down as soon as its result has
/// been retrieved.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn spawn(&self, worker_id: WorkerId) -> WorkerResult<Box<dyn ValidationWorker>>;
}

/// An isolated execution unit for a single shard
#[async_trait]
pub trait ValidationWorker: Send {
    fn id(&self) -> &WorkerId;

    /// Validate one shard, returning its violations as serialized JSON
    async fn validate(&mut self, request: WorkerRequest) -> WorkerResult<String>;

    /// Release the worker. Called exactly once, after `validate`, whether or
    /// not validation succeeded.
    async fn teardown(&mut self) -> WorkerResult<()>;
}
