//! Pre-validation pipeline
//!
//! `populate caches -> whole-file rules -> gate -> sharded pass -> handoff`
//!
//! A `Fail` raised by a whole-file rule aborts the run before any shard is
//! cut; the whole-file violations are then the final result. The output
//! handoff runs on every path. Infrastructure errors are handed off with an
//! empty violation set and a `failed` (or `cancelled`) summary, then
//! returned to the caller.

pub mod collaborators;
pub mod stage;
pub mod summary;

pub use collaborators::{
    CachePopulator, FileCachePopulator, JsonFileOutput, StdoutOutput, ValidationOutput,
};
pub use stage::StageOutcome;
pub use summary::{RunStatus, ValidationSummary};

use crate::cancellation::CancellationSignal;
use crate::error::{PipelineError, Result};
use crate::model::{Message, ValidationError, ValidationErrorCache, ValidationRunContext};
use crate::rules::{catalog, RuleRegistry, RuleSetOrchestrationService};
use crate::worker::{ShardedValidationReport, ShardedValidator};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Final result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub errors: Vec<ValidationError>,
    pub summary: ValidationSummary,
}

/// Drives one validation run end to end
pub struct PreValidationPipeline {
    populator: Arc<dyn CachePopulator>,
    message_rules: Arc<RuleRegistry<Message>>,
    sharded: Arc<dyn ShardedValidator>,
    output: Arc<dyn ValidationOutput>,
    cancellation: CancellationSignal,
}

impl PreValidationPipeline {
    /// Pipeline using the shipped whole-file rules
    pub fn new(
        populator: Arc<dyn CachePopulator>,
        sharded: Arc<dyn ShardedValidator>,
        output: Arc<dyn ValidationOutput>,
    ) -> Self {
        Self {
            populator,
            message_rules: Arc::new(catalog::message_rules()),
            sharded,
            output,
            cancellation: CancellationSignal::new(),
        }
    }

    pub fn with_message_rules(mut self, rules: RuleRegistry<Message>) -> Self {
        self.message_rules = Arc::new(rules);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationSignal) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }

    pub async fn execute(
        &self,
        message: &Message,
        context: &ValidationRunContext,
    ) -> Result<PipelineOutcome> {
        let started = Instant::now();
        info!(
            "Job {}: pre-validating {} ({} learners, {} DP records)",
            context.job_id,
            context.file_reference,
            message.learner_count(),
            message.destination_and_progression_count()
        );

        let cache = ValidationErrorCache::new();
        let mut shards: Option<ShardedValidationReport> = None;
        let result = self.run_stages(message, context, &cache, &mut shards).await;

        let (status, errors) = match &result {
            Ok(status) => (*status, cache.into_errors()),
            Err(e) if e.is_cancelled() => (RunStatus::Cancelled, Vec::new()),
            Err(_) => (RunStatus::Failed, Vec::new()),
        };
        let summary =
            ValidationSummary::new(context, status, &errors, shards.as_ref(), started.elapsed());

        let handoff = self.output.handoff(context, &errors, &summary).await;

        match (result, handoff) {
            (Ok(_), Ok(())) => {
                info!(
                    "Job {}: {} with {} violations ({} fail, {} error, {} warning) in {}ms",
                    context.job_id,
                    summary.status,
                    summary.total,
                    summary.fails,
                    summary.errors,
                    summary.warnings,
                    summary.duration_ms
                );
                Ok(PipelineOutcome { errors, summary })
            }
            (Ok(_), Err(handoff_error)) => {
                error!("Job {}: handoff failed: {}", context.job_id, handoff_error);
                Err(handoff_error)
            }
            (Err(run_error), handoff) => {
                if let Err(handoff_error) = handoff {
                    error!("Job {}: handoff failed: {}", context.job_id, handoff_error);
                }
                error!("Job {}: run {}: {}", context.job_id, status, run_error);
                Err(run_error)
            }
        }
    }

    async fn run_stages(
        &self,
        message: &Message,
        context: &ValidationRunContext,
        cache: &ValidationErrorCache,
        shards: &mut Option<ShardedValidationReport>,
    ) -> Result<RunStatus> {
        self.checkpoint("cache population")?;
        let snapshot = self.populator.populate(context).await?;
        debug!("Job {}: reference snapshot populated", context.job_id);

        self.checkpoint("whole-file rules")?;
        let scope = snapshot.clone().into_scope();
        RuleSetOrchestrationService::new(Arc::clone(&self.message_rules), scope.toggles.clone())
            .execute_into(std::slice::from_ref(message), &scope.context(), cache)?;

        if !StageOutcome::gate(cache).should_continue() {
            warn!(
                "Job {}: whole-file rules raised a Fail, skipping record validation",
                context.job_id
            );
            return Ok(RunStatus::Aborted);
        }

        self.checkpoint("sharded validation")?;
        let mut report = self
            .sharded
            .validate_sharded(message, &snapshot, context, &self.cancellation)
            .await?;
        cache.extend(std::mem::take(&mut report.errors));
        *shards = Some(report);

        self.checkpoint("handoff")?;
        Ok(RunStatus::Completed)
    }

    fn checkpoint(&self, stage: &'static str) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled { stage });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceSnapshot;
    use crate::testing::{sample_message, sample_snapshot};
    use crate::worker::WorkerResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedPopulator;

    #[async_trait]
    impl CachePopulator for FixedPopulator {
        async fn populate(&self, _: &ValidationRunContext) -> Result<ReferenceSnapshot> {
            Ok(sample_snapshot())
        }
    }

    #[derive(Default)]
    struct CountingValidator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ShardedValidator for CountingValidator {
        async fn validate_sharded(
            &self,
            _: &Message,
            _: &ReferenceSnapshot,
            _: &ValidationRunContext,
            _: &CancellationSignal,
        ) -> WorkerResult<ShardedValidationReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ShardedValidationReport {
                learner_shards: 1,
                ..ShardedValidationReport::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingOutput {
        statuses: Mutex<Vec<RunStatus>>,
    }

    #[async_trait]
    impl ValidationOutput for RecordingOutput {
        async fn handoff(
            &self,
            _: &ValidationRunContext,
            _: &[ValidationError],
            summary: &ValidationSummary,
        ) -> Result<()> {
            self.statuses.lock().unwrap().push(summary.status);
            Ok(())
        }
    }

    fn context() -> ValidationRunContext {
        ValidationRunContext::new("file.xml", "c", "r", 1)
    }

    #[tokio::test]
    async fn test_fail_aborts_before_sharding() {
        let validator = Arc::new(CountingValidator::default());
        let output = Arc::new(RecordingOutput::default());
        let pipeline = PreValidationPipeline::new(
            Arc::new(FixedPopulator),
            validator.clone(),
            output.clone(),
        );

        let mut message = sample_message(3, 0);
        message.learning_provider.ukprn = 99999999;

        let outcome = pipeline.execute(&message, &context()).await.unwrap();

        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.summary.status, RunStatus::Aborted);
        assert!(outcome.errors.iter().all(ValidationError::is_fail));
        assert!(!outcome.errors.is_empty());
        assert_eq!(*output.statuses.lock().unwrap(), vec![RunStatus::Aborted]);
    }

    #[tokio::test]
    async fn test_clean_header_runs_sharded_pass() {
        let validator = Arc::new(CountingValidator::default());
        let output = Arc::new(RecordingOutput::default());
        let pipeline = PreValidationPipeline::new(
            Arc::new(FixedPopulator),
            validator.clone(),
            output.clone(),
        );

        let outcome = pipeline
            .execute(&sample_message(3, 0), &context())
            .await
            .unwrap();

        assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.summary.status, RunStatus::Completed);
        assert_eq!(outcome.summary.learner_shards, 1);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_custom_message_rules_replace_catalog() {
        let validator = Arc::new(CountingValidator::default());
        let pipeline = PreValidationPipeline::new(
            Arc::new(FixedPopulator),
            validator.clone(),
            Arc::new(RecordingOutput::default()),
        )
        .with_message_rules(RuleRegistry::default());

        let mut message = sample_message(1, 0);
        message.learning_provider.ukprn = 99999999;

        let outcome = pipeline.execute(&message, &context()).await.unwrap();

        assert_eq!(outcome.summary.status, RunStatus::Completed);
        assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_still_hands_off() {
        let validator = Arc::new(CountingValidator::default());
        let output = Arc::new(RecordingOutput::default());
        let cancellation = CancellationSignal::new();
        cancellation.cancel();
        let pipeline =
            PreValidationPipeline::new(Arc::new(FixedPopulator), validator.clone(), output.clone())
                .with_cancellation(cancellation);

        let err = pipeline
            .execute(&sample_message(1, 0), &context())
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*output.statuses.lock().unwrap(), vec![RunStatus::Cancelled]);
    }
}
