//! Run journal: what a run created and how far it got.
//!
//! The journal is rewritten after every step. A successful run removes it;
//! a failed run leaves it behind with the failing step and error, so the
//! next run (or a human) can see what was left on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::JournalError;

pub const JOURNAL_FILE_NAME: &str = ".volume-push.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Archive,
    Clone,
    Copy,
    Stage,
    Commit,
    RenameBranch,
    Push,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Archive => "archive",
            Step::Clone => "clone",
            Step::Copy => "copy",
            Step::Stage => "stage",
            Step::Commit => "commit",
            Step::RenameBranch => "rename_branch",
            Step::Push => "push",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Failed,
}

/// Something on disk that this run created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    ArchiveVolume { path: PathBuf },
    CloneDir { path: PathBuf },
    CopiedVolume { path: PathBuf, sha256: String },
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::ArchiveVolume { path }
            | Artifact::CloneDir { path }
            | Artifact::CopiedVolume { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub step: Step,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJournal {
    pub run_id: String,
    pub source_dir: PathBuf,
    pub target_repo: String,
    pub status: RunStatus,
    #[serde(default)]
    pub completed: Vec<Step>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub failure: Option<Failure>,
    #[serde(default)]
    pub cleaned_up: bool,
    #[serde(default)]
    pub cleanup_errors: Vec<String>,
}

impl RunJournal {
    pub fn start(config: &PipelineConfig) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            source_dir: config.source_dir.clone(),
            target_repo: config.target_repo.clone(),
            status: RunStatus::Running,
            completed: Vec::new(),
            artifacts: Vec::new(),
            failure: None,
            cleaned_up: false,
            cleanup_errors: Vec::new(),
        }
    }

    pub fn path(workdir: &Path) -> PathBuf {
        workdir.join(JOURNAL_FILE_NAME)
    }

    pub fn complete(&mut self, step: Step, artifacts: impl IntoIterator<Item = Artifact>) {
        self.completed.push(step);
        self.artifacts.extend(artifacts);
        debug!(run_id = %self.run_id, %step, "Step recorded in journal");
    }

    pub fn fail(&mut self, step: Step, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure = Some(Failure {
            step,
            message: message.into(),
        });
    }

    pub async fn load(workdir: &Path) -> Result<Option<Self>, JournalError> {
        let path = Self::path(workdir);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(JournalError::Io { path, source }),
        }
    }

    pub async fn save(&self, workdir: &Path) -> Result<(), JournalError> {
        let path = Self::path(workdir);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| JournalError::Io { path, source })
    }

    pub async fn remove(workdir: &Path) -> Result<(), JournalError> {
        let path = Self::path(workdir);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(JournalError::Io { path, source }),
        }
    }

    /// Best-effort removal of archive volumes and the clone directory this
    /// run created. Copied volumes live inside the clone and go with it.
    /// Errors are collected, not returned.
    pub async fn clean_up(&mut self) {
        for artifact in self.artifacts.iter().rev() {
            let result = match artifact {
                Artifact::CloneDir { path } => tokio::fs::remove_dir_all(path).await,
                Artifact::ArchiveVolume { path } => tokio::fs::remove_file(path).await,
                Artifact::CopiedVolume { .. } => continue,
            };
            match result {
                Ok(()) => info!(path = %artifact.path().display(), "Removed run artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(error = ?e, path = %artifact.path().display(), "Failed to remove run artifact");
                    self.cleanup_errors
                        .push(format!("{}: {e}", artifact.path().display()));
                }
            }
        }
        self.cleaned_up = true;
    }
}
