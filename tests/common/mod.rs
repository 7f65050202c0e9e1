//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use ilr_validate::model::{Message, ValidationError, ValidationRunContext};
use ilr_validate::pipeline::{CachePopulator, RunStatus, ValidationOutput, ValidationSummary};
use ilr_validate::reference::ReferenceSnapshot;
use ilr_validate::worker::{
    LocalWorkerLauncher, ShardedValidationReport, ShardedValidator, SnapshotPayload,
    ValidationWorker, WorkerError, WorkerId, WorkerLauncher, WorkerRequest, WorkerResult,
};
use ilr_validate::CancellationSignal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Observable lifecycle counters shared by a launcher and its workers
#[derive(Debug, Default)]
pub struct LifecycleCounters {
    pub spawned: AtomicUsize,
    pub validated: AtomicUsize,
    pub torn_down: AtomicUsize,
    active: AtomicUsize,
    pub peak_active: AtomicUsize,
    /// Snapshot payload seen by each worker
    pub snapshots: Mutex<Vec<SnapshotPayload>>,
}

impl LifecycleCounters {
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn torn_down(&self) -> usize {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }
}

/// Launcher that delegates validation to [`LocalWorkerLauncher`] while
/// injecting failures, delays and cancellation
#[derive(Default)]
pub struct ScriptedLauncher {
    inner: LocalWorkerLauncher,
    pub counters: Arc<LifecycleCounters>,
    fail_shard: Option<String>,
    panic_shard: Option<String>,
    fail_teardown: bool,
    delay: Option<Duration>,
    cancel_after: Option<(usize, CancellationSignal)>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail validation of the shard with this label, e.g. `"learner-1"`
    pub fn failing_on(mut self, shard_label: &str) -> Self {
        self.fail_shard = Some(format!("-{}", shard_label));
        self
    }

    /// Panic while validating the shard with this label
    pub fn panicking_on(mut self, shard_label: &str) -> Self {
        self.panic_shard = Some(format!("-{}", shard_label));
        self
    }

    pub fn failing_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Trip `signal` once `spawns` workers have been spawned
    pub fn cancelling_after(mut self, spawns: usize, signal: CancellationSignal) -> Self {
        self.cancel_after = Some((spawns, signal));
        self
    }
}

#[async_trait]
impl WorkerLauncher for ScriptedLauncher {
    async fn spawn(&self, worker_id: WorkerId) -> WorkerResult<Box<dyn ValidationWorker>> {
        let spawned = self.counters.spawned.fetch_add(1, Ordering::SeqCst) + 1;
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak_active.fetch_max(active, Ordering::SeqCst);

        if let Some((after, signal)) = &self.cancel_after {
            if spawned >= *after {
                signal.cancel();
            }
        }

        let matches = |label: &Option<String>| {
            label
                .as_ref()
                .is_some_and(|suffix| worker_id.as_str().ends_with(suffix.as_str()))
        };
        let fail = matches(&self.fail_shard);
        let panics = matches(&self.panic_shard);

        Ok(Box::new(ScriptedWorker {
            inner: self.inner.spawn(worker_id).await?,
            counters: Arc::clone(&self.counters),
            fail,
            panics,
            fail_teardown: self.fail_teardown,
            delay: self.delay,
        }))
    }
}

struct ScriptedWorker {
    inner: Box<dyn ValidationWorker>,
    counters: Arc<LifecycleCounters>,
    fail: bool,
    panics: bool,
    fail_teardown: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl ValidationWorker for ScriptedWorker {
    fn id(&self) -> &WorkerId {
        self.inner.id()
    }

    async fn validate(&mut self, request: WorkerRequest) -> WorkerResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.counters.validated.fetch_add(1, Ordering::SeqCst);
        self.counters
            .snapshots
            .lock()
            .unwrap()
            .push(request.snapshot.clone());
        if self.panics {
            panic!("worker {} crashed", self.id());
        }
        if self.fail {
            return Err(WorkerError::Dispatch {
                worker_id: self.id().clone(),
                shard: request.shard.label(),
                reason: "scripted failure".to_string(),
            });
        }
        self.inner.validate(request).await
    }

    async fn teardown(&mut self) -> WorkerResult<()> {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.torn_down.fetch_add(1, Ordering::SeqCst);
        self.inner.teardown().await?;
        if self.fail_teardown {
            return Err(WorkerError::Teardown {
                worker_id: self.id().clone(),
                reason: "scripted teardown failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Order-insensitive view of a violation list
pub fn multiset(errors: &[ValidationError]) -> HashMap<ValidationError, usize> {
    let mut counts = HashMap::new();
    for error in errors {
        *counts.entry(error.clone()).or_insert(0) += 1;
    }
    counts
}

/// Records every handoff for later inspection
#[derive(Default)]
pub struct CapturingOutput {
    pub handoffs: Mutex<Vec<(Vec<ValidationError>, ValidationSummary)>>,
}

impl CapturingOutput {
    pub fn statuses(&self) -> Vec<RunStatus> {
        self.handoffs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, summary)| summary.status)
            .collect()
    }

    pub fn last_errors(&self) -> Vec<ValidationError> {
        self.handoffs
            .lock()
            .unwrap()
            .last()
            .map(|(errors, _)| errors.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ValidationOutput for CapturingOutput {
    async fn handoff(
        &self,
        _context: &ValidationRunContext,
        errors: &[ValidationError],
        summary: &ValidationSummary,
    ) -> ilr_validate::Result<()> {
        self.handoffs
            .lock()
            .unwrap()
            .push((errors.to_vec(), summary.clone()));
        Ok(())
    }
}

/// Serves a fixed snapshot
pub struct FixedPopulator(pub ReferenceSnapshot);

#[async_trait]
impl CachePopulator for FixedPopulator {
    async fn populate(
        &self,
        _context: &ValidationRunContext,
    ) -> ilr_validate::Result<ReferenceSnapshot> {
        Ok(self.0.clone())
    }
}

/// Sharded validator that only counts invocations
#[derive(Default)]
pub struct CountingShardedValidator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ShardedValidator for CountingShardedValidator {
    async fn validate_sharded(
        &self,
        _message: &Message,
        _snapshot: &ReferenceSnapshot,
        _context: &ValidationRunContext,
        _cancellation: &CancellationSignal,
    ) -> WorkerResult<ShardedValidationReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ShardedValidationReport::default())
    }
}
