//! Stage gating

use crate::model::ValidationErrorCache;

/// Whether the pipeline proceeds past a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    /// Stop before the sharded pass; the current results are final
    Abort,
}

impl StageOutcome {
    /// A single `Fail` in the whole-file results aborts the run
    pub fn gate(errors: &ValidationErrorCache) -> Self {
        if errors.has_fail() {
            StageOutcome::Abort
        } else {
            StageOutcome::Continue
        }
    }

    pub fn should_continue(self) -> bool {
        self == StageOutcome::Continue
    }
}
