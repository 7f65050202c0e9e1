//! Wire payloads exchanged with workers

use super::WorkerResult;
use crate::model::ValidationError;
use crate::reference::ReferenceSnapshot;
use crate::shard::{Shard, ShardKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of one ephemeral worker, unique within a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `<job id>-<shard kind>-<shard index>`
    pub fn for_shard(job_id: &str, shard: &Shard) -> Self {
        Self(format!("{}-{}", job_id, shard.label()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The reference snapshot, serialized once per run
///
/// Clones share the same buffer; every worker decodes its own copy.
#[derive(Debug, Clone)]
pub struct SnapshotPayload(Arc<str>);

impl SnapshotPayload {
    pub fn encode(snapshot: &ReferenceSnapshot) -> WorkerResult<Self> {
        Ok(Self(Arc::from(serde_json::to_string(snapshot)?)))
    }

    /// Wrap JSON produced elsewhere
    pub fn from_serialized(json: impl Into<Arc<str>>) -> Self {
        Self(json.into())
    }

    pub fn decode(&self) -> WorkerResult<ReferenceSnapshot> {
        Ok(serde_json::from_str(&self.0)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both payloads are the same serialization, not merely equal
    pub fn shares_buffer_with(&self, other: &SnapshotPayload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One serialized shard
#[derive(Debug, Clone)]
pub struct ShardPayload {
    pub kind: ShardKind,
    pub index: usize,
    body: String,
}

impl ShardPayload {
    pub fn encode(shard: &Shard) -> WorkerResult<Self> {
        Ok(Self {
            kind: shard.kind,
            index: shard.index,
            body: serde_json::to_string(shard)?,
        })
    }

    pub fn decode(&self) -> WorkerResult<Shard> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.kind, self.index)
    }
}

/// Everything a worker needs to validate one shard
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub job_id: String,
    pub shard: ShardPayload,
    pub snapshot: SnapshotPayload,
}

/// Serialize a worker's violations for the trip back to the coordinator
pub fn encode_errors(errors: &[ValidationError]) -> WorkerResult<String> {
    Ok(serde_json::to_string(errors)?)
}

pub fn decode_errors(payload: &str) -> WorkerResult<Vec<ValidationError>> {
    Ok(serde_json::from_str(payload)?)
}
