//! Process-backed [`Archiver`] for 7-Zip compatible command lines.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{DiscoveryPolicy, PipelineConfig};
use crate::contract::Archiver;
use crate::error::{ArchiveError, VolumeError};
use crate::process::{self, Invocation};
use crate::volumes::{archive_path, discover_volumes, ArchiveVolume};

/// Runs `<archiver> a <source>.zip <source> -v<size>` and collects the
/// numbered volumes it leaves next to the source directory.
pub struct SevenZipArchiver {
    program: PathBuf,
    workdir: PathBuf,
    discovery: DiscoveryPolicy,
}

impl SevenZipArchiver {
    pub fn new(program: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
            discovery: DiscoveryPolicy::default(),
        }
    }

    pub fn with_discovery(mut self, discovery: DiscoveryPolicy) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.tools.archiver, &config.workdir).with_discovery(config.discovery)
    }

    /// Anchors a relative source at the workdir, itself anchored at the
    /// process's current directory, so the archiver and volume discovery
    /// see the same files.
    fn resolve_source(&self, source: &Path) -> Result<PathBuf, VolumeError> {
        if source.is_absolute() {
            return Ok(source.to_path_buf());
        }
        let workdir = if self.workdir.is_absolute() {
            self.workdir.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| VolumeError::Io {
                    path: self.workdir.clone(),
                    source: e,
                })?
                .join(&self.workdir)
        };
        Ok(workdir.join(source))
    }
}

#[async_trait]
impl Archiver for SevenZipArchiver {
    async fn create_volumes(
        &self,
        source: &Path,
        volume_size: &str,
    ) -> Result<Vec<ArchiveVolume>, ArchiveError> {
        let resolved = self.resolve_source(source)?;
        let source = resolved.as_path();
        let archive = archive_path(source);
        process::run(Invocation {
            program: &self.program,
            subcommand: "a",
            args: vec![
                archive.clone().into_os_string(),
                source.as_os_str().to_owned(),
                format!("-v{volume_size}").into(),
            ],
            cwd: &self.workdir,
            secret: None,
            env: &[],
        })
        .await?;
        info!(
            source = %source.display(),
            archive = %archive.display(),
            volume_size,
            "Archive created"
        );

        let volumes = discover_volumes(source, self.discovery)?;
        if volumes.is_empty() {
            return Err(VolumeError::NoVolumes(archive).into());
        }
        Ok(volumes)
    }
}
