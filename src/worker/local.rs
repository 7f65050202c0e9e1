//! In-process worker launcher backed by tokio blocking tasks

use super::launcher::{ValidationWorker, WorkerLauncher};
use super::payload::{encode_errors, WorkerId, WorkerRequest};
use super::{WorkerError, WorkerResult};
use crate::model::{Learner, LearnerDestinationAndProgression};
use crate::rules::catalog;
use crate::rules::{RuleRegistry, RuleSetOrchestrationService};
use crate::shard::ShardKind;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Compiled per-record registries shared by every local worker
#[derive(Clone)]
pub struct WorkerRuleSets {
    pub learner: Arc<RuleRegistry<Learner>>,
    pub destination_and_progression: Arc<RuleRegistry<LearnerDestinationAndProgression>>,
}

impl WorkerRuleSets {
    pub fn new(
        learner: RuleRegistry<Learner>,
        destination_and_progression: RuleRegistry<LearnerDestinationAndProgression>,
    ) -> Self {
        Self {
            learner: Arc::new(learner),
            destination_and_progression: Arc::new(destination_and_progression),
        }
    }
}

impl Default for WorkerRuleSets {
    /// The shipped catalogue
    fn default() -> Self {
        Self::new(
            catalog::learner_rules(),
            catalog::destination_and_progression_rules(),
        )
    }
}

/// Launches workers that validate shards on the blocking thread pool
///
/// Each worker decodes its own copy of the shard and snapshot, so no state
/// is shared between them beyond the immutable rule registries.
#[derive(Clone, Default)]
pub struct LocalWorkerLauncher {
    rule_sets: WorkerRuleSets,
    active: Arc<AtomicUsize>,
}

impl LocalWorkerLauncher {
    pub fn new(rule_sets: WorkerRuleSets) -> Self {
        Self {
            rule_sets,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Workers spawned and not yet torn down
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerLauncher for LocalWorkerLauncher {
    async fn spawn(&self, worker_id: WorkerId) -> WorkerResult<Box<dyn ValidationWorker>> {
        self.active.fetch_add(1, Ordering::SeqCst);
        trace!("Spawned local worker {}", worker_id);
        Ok(Box::new(LocalWorker {
            id: worker_id,
            rule_sets: self.rule_sets.clone(),
            active: Arc::clone(&self.active),
            torn_down: false,
        }))
    }
}

struct LocalWorker {
    id: WorkerId,
    rule_sets: WorkerRuleSets,
    active: Arc<AtomicUsize>,
    torn_down: bool,
}

#[async_trait]
impl ValidationWorker for LocalWorker {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    async fn validate(&mut self, request: WorkerRequest) -> WorkerResult<String> {
        let rule_sets = self.rule_sets.clone();
        let worker_id = self.id.clone();
        let shard_label = request.shard.label();

        tokio::task::spawn_blocking(move || validate_shard(&rule_sets, &request))
            .await
            .map_err(|e| WorkerError::Dispatch {
                worker_id,
                shard: shard_label,
                reason: e.to_string(),
            })?
    }

    async fn teardown(&mut self) -> WorkerResult<()> {
        if !self.torn_down {
            self.torn_down = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
            trace!("Tore down local worker {}", self.id);
        }
        Ok(())
    }
}

/// Body of one worker: decode private copies, run the shard's rule set
fn validate_shard(rule_sets: &WorkerRuleSets, request: &WorkerRequest) -> WorkerResult<String> {
    let shard = request.shard.decode()?;
    let scope = request.snapshot.decode()?.into_scope();
    let context = scope.context();

    let destination_and_progression = RuleSetOrchestrationService::new(
        Arc::clone(&rule_sets.destination_and_progression),
        scope.toggles.clone(),
    );

    // Learner shards also check the DP records correlated with their learners
    let errors = match shard.kind {
        ShardKind::Learner => {
            let mut errors = RuleSetOrchestrationService::new(
                Arc::clone(&rule_sets.learner),
                scope.toggles.clone(),
            )
            .execute(&shard.message.learners, &context)?;
            errors.extend(
                destination_and_progression
                    .execute(&shard.message.learner_destination_and_progressions, &context)?,
            );
            errors
        }
        ShardKind::DestinationAndProgression => destination_and_progression
            .execute(&shard.message.learner_destination_and_progressions, &context)?,
    };

    debug!(
        "Job {} shard {} produced {} violations",
        request.job_id,
        shard.label(),
        errors.len()
    );
    encode_errors(&errors)
}
