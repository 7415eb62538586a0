//! Persistence for completed run artifacts

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;

use super::artifacts::RunArtifacts;

/// Receives the artifacts of every successful run
#[async_trait]
pub trait RunArtifactRepository: Send + Sync {
    async fn save(&self, artifacts: &RunArtifacts) -> Result<()>;
}

/// Keeps saved runs in memory, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryRunArtifactRepository {
    runs: Mutex<Vec<RunArtifacts>>,
}

impl InMemoryRunArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every saved run, oldest first
    pub fn runs(&self) -> Vec<RunArtifacts> {
        self.runs
            .lock()
            .map(|runs| runs.clone())
            .unwrap_or_default()
    }

    pub fn latest(&self) -> Option<RunArtifacts> {
        self.runs.lock().ok().and_then(|runs| runs.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.runs.lock().map(|runs| runs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RunArtifactRepository for InMemoryRunArtifactRepository {
    async fn save(&self, artifacts: &RunArtifacts) -> Result<()> {
        self.runs
            .lock()
            .map_err(|_| anyhow::anyhow!("run artifact store poisoned"))?
            .push(artifacts.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFormat {
    #[default]
    Yaml,
    Json,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Writes one file per run into a directory
///
/// Files are named `run_artifacts_{YYYYmmdd_HHMMSS}_{run_id}.{ext}` after the
/// run's start time.
#[derive(Debug, Clone)]
pub struct FileRunArtifactRepository {
    dir: PathBuf,
    format: ArtifactFormat,
}

impl FileRunArtifactRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: ArtifactFormat::Yaml,
        }
    }

    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = format;
        self
    }

    /// Path the artifacts of `artifacts` are written to
    pub fn path_for(&self, artifacts: &RunArtifacts) -> PathBuf {
        let timestamp = artifacts.started_at.format("%Y%m%d_%H%M%S");
        self.dir.join(format!(
            "run_artifacts_{}_{}.{}",
            timestamp,
            artifacts.run_id,
            self.format.extension()
        ))
    }

    fn serialize(&self, artifacts: &RunArtifacts) -> Result<String> {
        match self.format {
            ArtifactFormat::Yaml => {
                serde_yaml::to_string(artifacts).context("Failed to serialize run artifacts to YAML")
            }
            ArtifactFormat::Json => serde_json::to_string_pretty(artifacts)
                .context("Failed to serialize run artifacts to JSON"),
        }
    }
}

#[async_trait]
impl RunArtifactRepository for FileRunArtifactRepository {
    async fn save(&self, artifacts: &RunArtifacts) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create artifacts directory: {}", self.dir.display()))?;

        let path = self.path_for(artifacts);
        let content = self.serialize(artifacts)?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write run artifacts: {}", path.display()))?;

        tracing::debug!(path = %path.display(), run_id = %artifacts.run_id, "saved run artifacts");
        Ok(())
    }
}
