//! Run-scoped identifiers for one validation job

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiers shared by every stage of a validation run
///
/// Created once when the run starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRunContext {
    pub job_id: String,
    pub file_reference: String,
    pub container: String,
    pub reference_data_key: String,
    pub return_period: u32,
}

impl ValidationRunContext {
    /// Create a context with a freshly generated job id
    pub fn new(
        file_reference: impl Into<String>,
        container: impl Into<String>,
        reference_data_key: impl Into<String>,
        return_period: u32,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            file_reference: file_reference.into(),
            container: container.into(),
            reference_data_key: reference_data_key.into(),
            return_period,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }
}
