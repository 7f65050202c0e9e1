//! Pipeline collaborators: where reference data comes from and where
//! results go

use super::summary::ValidationSummary;
use crate::error::{PipelineError, Result};
use crate::model::{ValidationError, ValidationRunContext};
use crate::reference::ReferenceSnapshot;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Produces the reference snapshot for a run
#[async_trait]
pub trait CachePopulator: Send + Sync {
    async fn populate(&self, context: &ValidationRunContext) -> Result<ReferenceSnapshot>;
}

/// Receives the final violation set. Called once per run, on every path.
#[async_trait]
pub trait ValidationOutput: Send + Sync {
    async fn handoff(
        &self,
        context: &ValidationRunContext,
        errors: &[ValidationError],
        summary: &ValidationSummary,
    ) -> Result<()>;
}

/// Reads a JSON-encoded [`ReferenceSnapshot`] from disk
#[derive(Debug, Clone)]
pub struct FileCachePopulator {
    path: PathBuf,
}

impl FileCachePopulator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CachePopulator for FileCachePopulator {
    async fn populate(&self, context: &ValidationRunContext) -> Result<ReferenceSnapshot> {
        debug!(
            "Job {}: loading reference snapshot from {}",
            context.job_id,
            self.path.display()
        );
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::CachePopulation(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            PipelineError::CachePopulation(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[derive(Serialize)]
struct OutputDocument<'a> {
    summary: &'a ValidationSummary,
    errors: &'a [ValidationError],
}

fn render(errors: &[ValidationError], summary: &ValidationSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(&OutputDocument { summary, errors })?)
}

/// Writes `{ "summary": ..., "errors": [...] }` to a file
#[derive(Debug, Clone)]
pub struct JsonFileOutput {
    path: PathBuf,
}

impl JsonFileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ValidationOutput for JsonFileOutput {
    async fn handoff(
        &self,
        _context: &ValidationRunContext,
        errors: &[ValidationError],
        summary: &ValidationSummary,
    ) -> Result<()> {
        let document = render(errors, summary)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::Output(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(&self.path, document)
            .await
            .map_err(|e| PipelineError::Output(format!("{}: {}", self.path.display(), e)))
    }
}

/// Writes the same document as [`JsonFileOutput`] to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutput;

#[async_trait]
impl ValidationOutput for StdoutOutput {
    async fn handoff(
        &self,
        _context: &ValidationRunContext,
        errors: &[ValidationError],
        summary: &ValidationSummary,
    ) -> Result<()> {
        let mut document = render(errors, summary)?;
        document.push('\n');
        let mut stdout = tokio::io::stdout();
        stdout.write_all(document.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::summary::RunStatus;
    use crate::testing::sample_snapshot;
    use std::time::Duration;
    use tempfile::TempDir;

    fn context() -> ValidationRunContext {
        ValidationRunContext::new("file.xml", "c", "r", 1)
    }

    #[tokio::test]
    async fn test_file_cache_populator_reads_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, serde_json::to_string(&sample_snapshot()).unwrap()).unwrap();

        let snapshot = FileCachePopulator::new(&path)
            .populate(&context())
            .await
            .unwrap();
        assert_eq!(snapshot, sample_snapshot());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_cache_population_error() {
        let dir = TempDir::new().unwrap();
        let result = FileCachePopulator::new(dir.path().join("absent.json"))
            .populate(&context())
            .await;
        assert!(matches!(result, Err(PipelineError::CachePopulation(_))));
    }

    #[tokio::test]
    async fn test_json_file_output_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let output = JsonFileOutput::new(dir.path().join("nested/out/result.json"));
        let context = context();
        let summary =
            ValidationSummary::new(&context, RunStatus::Completed, &[], None, Duration::ZERO);

        output.handoff(&context, &[], &summary).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap()).unwrap();
        assert_eq!(written["summary"]["status"], "completed");
        assert_eq!(written["errors"].as_array().unwrap().len(), 0);
    }
}
