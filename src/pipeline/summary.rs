//! Run summary handed to the output alongside the violations

use crate::model::{Severity, ValidationError, ValidationRunContext};
use crate::worker::ShardedValidationReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every stage ran
    Completed,
    /// A whole-file `Fail` stopped the run before the sharded pass
    Aborted,
    Failed,
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub job_id: String,
    pub file_reference: String,
    pub status: RunStatus,
    pub total: usize,
    pub fails: usize,
    pub errors: usize,
    pub warnings: usize,
    pub by_rule: BTreeMap<String, usize>,
    pub learner_shards: usize,
    pub destination_and_progression_shards: usize,
    pub teardown_failures: usize,
    pub duration_ms: u64,
}

impl ValidationSummary {
    pub fn new(
        context: &ValidationRunContext,
        status: RunStatus,
        errors: &[ValidationError],
        shards: Option<&ShardedValidationReport>,
        duration: Duration,
    ) -> Self {
        let count = |severity: Severity| errors.iter().filter(|e| e.severity == severity).count();

        let mut by_rule = BTreeMap::new();
        for error in errors {
            *by_rule.entry(error.rule_name.clone()).or_insert(0) += 1;
        }

        Self {
            job_id: context.job_id.clone(),
            file_reference: context.file_reference.clone(),
            status,
            total: errors.len(),
            fails: count(Severity::Fail),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            by_rule,
            learner_shards: shards.map_or(0, |s| s.learner_shards),
            destination_and_progression_shards: shards
                .map_or(0, |s| s.destination_and_progression_shards),
            teardown_failures: shards.map_or(0, |s| s.teardown_failures),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
