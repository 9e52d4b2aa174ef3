//! Error types for volume-push-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::journal::Step;

/// A required configuration value was absent or empty.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required argument: {0}")]
    Missing(&'static str),
}

/// An external tool could not be started or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {program} {subcommand}: {source}")]
    Launch {
        program: String,
        subcommand: String,
        #[source]
        source: std::io::Error,
    },

    /// `code` is `None` when the process was terminated by a signal.
    #[error("{program} {subcommand} exited with code {code:?}: {output}")]
    Failed {
        program: String,
        subcommand: String,
        code: Option<i32>,
        output: String,
    },
}

/// Errors from discovering or copying archive volumes.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no archive volumes found for {0}")]
    NoVolumes(PathBuf),
}

/// Errors from the archiver capability: either the tool failed or its
/// output could not be collected.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Errors from reading or writing the run journal.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("journal JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A fatal pipeline failure, tagged with the step that produced it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("archive step failed: {0}")]
    Archive(#[source] ArchiveError),

    #[error("clone step failed: {0}")]
    Clone(#[source] ToolError),

    #[error("copy step failed: {0}")]
    Copy(#[source] VolumeError),

    #[error("publish step {step} failed: {source}")]
    Publish {
        step: Step,
        #[source]
        source: ToolError,
    },
}

impl PipelineError {
    /// The step that failed, or `None` for errors raised before any step ran.
    pub fn step(&self) -> Option<Step> {
        match self {
            PipelineError::Config(_) => None,
            PipelineError::Archive(_) => Some(Step::Archive),
            PipelineError::Clone(_) => Some(Step::Clone),
            PipelineError::Copy(_) => Some(Step::Copy),
            PipelineError::Publish { step, .. } => Some(*step),
        }
    }
}

/// Convenience constructor for [`VolumeError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> VolumeError {
    VolumeError::Io {
        path: path.into(),
        source,
    }
}
