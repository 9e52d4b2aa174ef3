//! # contract: capability interfaces for the external tools
//!
//! The pipeline never spawns a process directly. It talks to the archiver
//! through [`Archiver`] and to the version-control client through
//! [`VersionControl`]. Production code uses the process-backed
//! implementations in [`crate::archive`] and [`crate::vcs`]; tests plug in
//! the `mockall` mocks generated here (exported under the
//! `test-export-mocks` feature so integration tests can reach them).

use async_trait::async_trait;
use std::path::Path;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{ArchiveError, ToolError};
use crate::url::CloneUrl;
use crate::volumes::ArchiveVolume;

/// Produces a multi-volume archive of a directory.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archive `source` into volumes of at most `volume_size` each and
    /// return them in ascending index order.
    async fn create_volumes(
        &self,
        source: &Path,
        volume_size: &str,
    ) -> Result<Vec<ArchiveVolume>, ArchiveError>;
}

/// The version-control operations the pipeline needs, one method per
/// subcommand. Every method is a single blocking step; the caller decides
/// the order.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into `dest`, which must not exist yet.
    async fn clone_repo(&self, url: &CloneUrl, dest: &Path) -> Result<(), ToolError>;

    /// Stage every change in the working tree at `repo`.
    async fn stage_all(&self, repo: &Path) -> Result<(), ToolError>;

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), ToolError>;

    /// Force-rename the current branch to `branch`.
    async fn rename_branch(&self, repo: &Path, branch: &str) -> Result<(), ToolError>;

    /// Push `branch` to `remote` and set it as upstream.
    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), ToolError>;
}
