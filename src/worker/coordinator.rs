//! Shard fan-out / fan-in
//!
//! Partition the message, serialize the snapshot once, run one ephemeral
//! worker per shard, wait for every dispatched worker, then merge their
//! violations into a single cache. Teardown runs for every spawned worker,
//! including on failure and cancellation.

use super::launcher::WorkerLauncher;
use super::payload::{decode_errors, ShardPayload, SnapshotPayload, WorkerId, WorkerRequest};
use super::{WorkerError, WorkerResult};
use crate::cancellation::CancellationSignal;
use crate::config::ValidationConfig;
use crate::model::{Message, ValidationError, ValidationErrorCache, ValidationRunContext};
use crate::reference::ReferenceSnapshot;
use crate::shard::{ShardKind, ShardPartitioner};
use async_trait::async_trait;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Entry point the pipeline uses for the per-record pass
#[async_trait]
pub trait ShardedValidator: Send + Sync {
    async fn validate_sharded(
        &self,
        message: &Message,
        snapshot: &ReferenceSnapshot,
        context: &ValidationRunContext,
        cancellation: &CancellationSignal,
    ) -> WorkerResult<ShardedValidationReport>;
}

/// Merged output of one sharded pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShardedValidationReport {
    pub errors: Vec<ValidationError>,
    pub learner_shards: usize,
    pub destination_and_progression_shards: usize,
    /// Workers whose teardown failed; logged, never fatal
    pub teardown_failures: usize,
}

impl ShardedValidationReport {
    pub fn worker_count(&self) -> usize {
        self.learner_shards + self.destination_and_progression_shards
    }
}

/// Result of one worker task, collected at the fan-in barrier
struct ShardOutcome {
    kind: ShardKind,
    index: usize,
    result: WorkerResult<Vec<ValidationError>>,
    teardown_failed: bool,
}

/// Runs the sharded pass on workers created by a [`WorkerLauncher`]
pub struct ShardCoordinator {
    launcher: Arc<dyn WorkerLauncher>,
    partitioner: ShardPartitioner,
    concurrency_limit: Option<NonZeroUsize>,
    worker_timeout: Option<Duration>,
}

impl ShardCoordinator {
    /// Default partitioning, no concurrency cap, no timeout
    pub fn new(launcher: Arc<dyn WorkerLauncher>) -> Self {
        Self {
            launcher,
            partitioner: ShardPartitioner::default(),
            concurrency_limit: None,
            worker_timeout: None,
        }
    }

    pub fn from_config(launcher: Arc<dyn WorkerLauncher>, config: &ValidationConfig) -> Self {
        Self::new(launcher)
            .with_partitioner(ShardPartitioner::new(config.shard_size()))
            .with_concurrency_limit(config.concurrency_limit())
            .with_worker_timeout(config.worker_timeout())
    }

    pub fn with_partitioner(mut self, partitioner: ShardPartitioner) -> Self {
        self.partitioner = partitioner;
        self
    }

    /// At most `limit` workers alive at once; `None` runs every shard at once
    pub fn with_concurrency_limit(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_worker_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.worker_timeout = timeout;
        self
    }

    pub async fn run(
        &self,
        message: &Message,
        snapshot: &ReferenceSnapshot,
        job_id: &str,
        cancellation: &CancellationSignal,
    ) -> WorkerResult<ShardedValidationReport> {
        let plan = self.partitioner.partition(message);
        let learner_shards = plan.learner_shards.len();
        let destination_and_progression_shards = plan.destination_and_progression_shards.len();

        info!(
            "Job {}: {} learner shards, {} DP shards (shard size {})",
            job_id,
            learner_shards,
            destination_and_progression_shards,
            self.partitioner.shard_size()
        );

        let mut report = ShardedValidationReport {
            learner_shards,
            destination_and_progression_shards,
            ..ShardedValidationReport::default()
        };

        if plan.is_empty() {
            return if cancellation.is_cancelled() {
                Err(WorkerError::Cancelled)
            } else {
                Ok(report)
            };
        }

        let snapshot = SnapshotPayload::encode(snapshot)?;
        debug!("Serialized reference snapshot once ({} bytes)", snapshot.len());

        let semaphore = self
            .concurrency_limit
            .map(|limit| Arc::new(Semaphore::new(limit.get())));

        let mut workers: JoinSet<ShardOutcome> = JoinSet::new();
        let mut first_error: Option<WorkerError> = None;
        let mut outcomes: Vec<ShardOutcome> = Vec::with_capacity(plan.worker_count());

        for shard in plan.into_shards() {
            let permit = match &semaphore {
                Some(semaphore) => match Arc::clone(semaphore).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        first_error = Some(WorkerError::Spawn {
                            worker_id: WorkerId::for_shard(job_id, &shard),
                            reason: e.to_string(),
                        });
                        break;
                    }
                },
                None => None,
            };

            // Pick up workers that already finished so a failure stops dispatch early
            while let Some(joined) = workers.try_join_next() {
                record_outcome(joined, &mut outcomes, &mut first_error);
            }
            if first_error.is_some() {
                break;
            }
            if cancellation.is_cancelled() {
                warn!("Job {}: cancellation requested, no further shards dispatched", job_id);
                break;
            }

            let worker_id = WorkerId::for_shard(job_id, &shard);
            let shard_payload = match ShardPayload::encode(&shard) {
                Ok(payload) => payload,
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            };
            let request = WorkerRequest {
                job_id: job_id.to_string(),
                shard: shard_payload,
                snapshot: snapshot.clone(),
            };
            workers.spawn(run_worker(
                Arc::clone(&self.launcher),
                worker_id,
                (shard.kind, shard.index),
                request,
                self.worker_timeout,
                permit,
            ));
        }

        // Fan-in barrier: every dispatched worker is awaited, whatever happened above
        while let Some(joined) = workers.join_next().await {
            record_outcome(joined, &mut outcomes, &mut first_error);
        }

        report.teardown_failures = outcomes.iter().filter(|o| o.teardown_failed).count();

        if let Some(error) = first_error {
            error!("Job {}: sharded validation failed: {}", job_id, error);
            return Err(error);
        }
        if cancellation.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }

        // Merge strictly after the barrier, in a stable order
        outcomes.sort_by_key(|outcome| (outcome.kind, outcome.index));
        let cache = ValidationErrorCache::new();
        for outcome in outcomes {
            if let Ok(errors) = outcome.result {
                cache.extend(errors);
            }
        }
        report.errors = cache.into_errors();

        info!(
            "Job {}: {} workers finished, {} violations, {} teardown failures",
            job_id,
            report.worker_count(),
            report.errors.len(),
            report.teardown_failures
        );
        Ok(report)
    }
}

#[async_trait]
impl ShardedValidator for ShardCoordinator {
    async fn validate_sharded(
        &self,
        message: &Message,
        snapshot: &ReferenceSnapshot,
        context: &ValidationRunContext,
        cancellation: &CancellationSignal,
    ) -> WorkerResult<ShardedValidationReport> {
        self.run(message, snapshot, &context.job_id, cancellation)
            .await
    }
}

fn record_outcome(
    joined: Result<ShardOutcome, JoinError>,
    outcomes: &mut Vec<ShardOutcome>,
    first_error: &mut Option<WorkerError>,
) {
    match joined {
        Ok(mut outcome) => {
            if outcome.result.is_err() {
                if let Err(e) = std::mem::replace(&mut outcome.result, Ok(Vec::new())) {
                    if first_error.is_none() {
                        *first_error = Some(e);
                    } else {
                        warn!("Additional worker failure: {}", e);
                    }
                }
            }
            outcomes.push(outcome);
        }
        Err(join_err) => {
            warn!("Worker task did not complete: {}", join_err);
            if first_error.is_none() {
                *first_error = Some(WorkerError::Panicked(join_err.to_string()));
            }
        }
    }
}

/// One worker lifetime: spawn, validate, always tear down
///
/// Validation runs as its own task so a panicking worker is still reachable
/// for teardown once the panic has been caught at the join.
async fn run_worker(
    launcher: Arc<dyn WorkerLauncher>,
    worker_id: WorkerId,
    (kind, index): (ShardKind, usize),
    request: WorkerRequest,
    timeout: Option<Duration>,
    _permit: Option<OwnedSemaphorePermit>,
) -> ShardOutcome {
    let worker = match launcher.spawn(worker_id.clone()).await {
        Ok(worker) => Arc::new(Mutex::new(worker)),
        Err(e) => {
            return ShardOutcome {
                kind,
                index,
                result: Err(e),
                teardown_failed: false,
            }
        }
    };
    debug!("Dispatched shard {} to worker {}", request.shard.label(), worker_id);

    let task_worker = Arc::clone(&worker);
    let mut task = tokio::spawn(async move { task_worker.lock().await.validate(request).await });

    let validation = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => flatten_join(&worker_id, joined),
            Err(_) => {
                task.abort();
                let _ = task.await;
                Err(WorkerError::Timeout {
                    worker_id: worker_id.clone(),
                    timeout: limit,
                })
            }
        },
        None => flatten_join(&worker_id, task.await),
    };
    let result = validation.and_then(|payload| decode_errors(&payload));

    let teardown_failed = match worker.lock().await.teardown().await {
        Ok(()) => false,
        Err(e) => {
            warn!("Teardown of worker {} failed: {}", worker_id, e);
            true
        }
    };

    ShardOutcome {
        kind,
        index,
        result,
        teardown_failed,
    }
}

fn flatten_join(
    worker_id: &WorkerId,
    joined: Result<WorkerResult<String>, JoinError>,
) -> WorkerResult<String> {
    match joined {
        Ok(result) => result,
        Err(join_err) => {
            error!("Worker {} did not complete validation: {}", worker_id, join_err);
            Err(WorkerError::Panicked(format!("{}: {}", worker_id, join_err)))
        }
    }
}
