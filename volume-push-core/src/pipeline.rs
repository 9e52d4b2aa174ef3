//! High-level pipeline: archive → clone → copy → publish.
//!
//! The pipeline is strictly sequential and fail-fast. Each step either
//! succeeds and is recorded in the [`RunJournal`], or returns a
//! [`PipelineError`] and nothing after it runs.
//!
//! # Steps
//! 1. Validate the [`PipelineConfig`] (before any side effect).
//! 2. Archive the source directory into volumes via [`Archiver`].
//! 3. Clone the target repository via [`VersionControl::clone_repo`].
//! 4. Copy the volumes into the clone, in ascending index order.
//! 5. Stage, commit, rename the branch and push.
//!
//! # Failure
//! Completed steps are not rolled back. The journal is left in the working
//! directory with the failing step; with `cleanup_on_failure` the run's
//! archive volumes and clone are removed first.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::contract::{Archiver, VersionControl};
use crate::error::PipelineError;
use crate::journal::{Artifact, RunJournal, RunStatus, Step};
use crate::volumes::{copy_volume, CopiedVolume};

/// Milestones reported to the caller while the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Archived,
    Cloned,
    VolumeFound(PathBuf),
    Published,
}

/// Renders the literal progress markers printed by the CLI.
impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Archived => f.write_str("zip DONE"),
            ProgressEvent::Cloned => f.write_str("git clone DONE"),
            ProgressEvent::VolumeFound(path) => write!(f, "{} exists", path.display()),
            ProgressEvent::Published => f.write_str("DONE"),
        }
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: String,
    pub clone_dir: PathBuf,
    pub branch: String,
    pub volumes: Vec<CopiedVolume>,
}

pub async fn run_pipeline<A, V, F>(
    config: &PipelineConfig,
    archiver: &A,
    vcs: &V,
    mut progress: F,
) -> Result<PipelineReport, PipelineError>
where
    A: Archiver + ?Sized,
    V: VersionControl + ?Sized,
    F: FnMut(ProgressEvent),
{
    config.validate()?;
    config.trace_loaded();

    report_previous_run(&config.workdir).await;

    let mut journal = RunJournal::start(config);
    info!(run_id = %journal.run_id, "Starting volume-push pipeline");
    save_journal(&journal, &config.workdir).await;

    match execute(config, archiver, vcs, &mut journal, &mut progress).await {
        Ok(report) => {
            if let Err(e) = RunJournal::remove(&config.workdir).await {
                warn!(error = %e, "Failed to remove run journal after success");
            }
            info!(
                run_id = %report.run_id,
                volumes = report.volumes.len(),
                clone_dir = %report.clone_dir.display(),
                "Pipeline complete"
            );
            Ok(report)
        }
        Err(err) => {
            // Every error raised inside `execute` belongs to a step.
            let step = err.step().unwrap_or(Step::Archive);
            error!(run_id = %journal.run_id, %step, error = %err, "Pipeline failed");
            journal.fail(step, err.to_string());
            if config.cleanup_on_failure {
                journal.clean_up().await;
            }
            save_journal(&journal, &config.workdir).await;
            Err(err)
        }
    }
}

async fn execute<A, V, F>(
    config: &PipelineConfig,
    archiver: &A,
    vcs: &V,
    journal: &mut RunJournal,
    progress: &mut F,
) -> Result<PipelineReport, PipelineError>
where
    A: Archiver + ?Sized,
    V: VersionControl + ?Sized,
    F: FnMut(ProgressEvent),
{
    let workdir = &config.workdir;

    // --- Archive ---
    let volumes = archiver
        .create_volumes(&config.source_dir, &config.volume_size)
        .await
        .map_err(PipelineError::Archive)?;
    journal.complete(
        Step::Archive,
        volumes.iter().map(|v| Artifact::ArchiveVolume {
            path: v.path.clone(),
        }),
    );
    save_journal(journal, workdir).await;
    progress(ProgressEvent::Archived);

    // --- Clone ---
    let clone_dir = config.clone_dir();
    let url = config.clone_url();
    info!(url = %url, dest = %clone_dir.display(), "Cloning target repository");
    vcs.clone_repo(&url, &clone_dir)
        .await
        .map_err(PipelineError::Clone)?;
    journal.complete(
        Step::Clone,
        [Artifact::CloneDir {
            path: clone_dir.clone(),
        }],
    );
    save_journal(journal, workdir).await;
    progress(ProgressEvent::Cloned);

    // --- Copy ---
    let mut copied = Vec::with_capacity(volumes.len());
    for volume in &volumes {
        progress(ProgressEvent::VolumeFound(volume.path.clone()));
        let volume = copy_volume(volume, &clone_dir)
            .await
            .map_err(PipelineError::Copy)?;
        copied.push(volume);
    }
    journal.complete(
        Step::Copy,
        copied.iter().map(|c| Artifact::CopiedVolume {
            path: c.destination.clone(),
            sha256: c.sha256.clone(),
        }),
    );
    save_journal(journal, workdir).await;

    // --- Publish ---
    let publish = &config.publish;
    publish_step(journal, workdir, Step::Stage, vcs.stage_all(&clone_dir)).await?;
    publish_step(
        journal,
        workdir,
        Step::Commit,
        vcs.commit(&clone_dir, &publish.commit_message),
    )
    .await?;
    publish_step(
        journal,
        workdir,
        Step::RenameBranch,
        vcs.rename_branch(&clone_dir, &publish.branch),
    )
    .await?;
    publish_step(
        journal,
        workdir,
        Step::Push,
        vcs.push(&clone_dir, &publish.remote_name, &publish.branch),
    )
    .await?;
    progress(ProgressEvent::Published);

    Ok(PipelineReport {
        run_id: journal.run_id.clone(),
        clone_dir,
        branch: publish.branch.clone(),
        volumes: copied,
    })
}

async fn publish_step<Fut>(
    journal: &mut RunJournal,
    workdir: &Path,
    step: Step,
    action: Fut,
) -> Result<(), PipelineError>
where
    Fut: std::future::Future<Output = Result<(), crate::error::ToolError>>,
{
    action
        .await
        .map_err(|source| PipelineError::Publish { step, source })?;
    journal.complete(step, std::iter::empty());
    save_journal(journal, workdir).await;
    Ok(())
}

/// Journal writes are best-effort: a failure to record progress never
/// stops the pipeline.
async fn save_journal(journal: &RunJournal, workdir: &Path) {
    if let Err(e) = journal.save(workdir).await {
        warn!(error = %e, workdir = %workdir.display(), "Failed to write run journal");
    }
}

async fn report_previous_run(workdir: &Path) {
    match RunJournal::load(workdir).await {
        Ok(Some(previous)) if previous.status == RunStatus::Failed => {
            let failed_at = previous
                .failure
                .as_ref()
                .map(|f| f.step.to_string())
                .unwrap_or_default();
            warn!(
                run_id = %previous.run_id,
                failed_at = %failed_at,
                artifacts = previous.artifacts.len(),
                cleaned_up = previous.cleaned_up,
                "A previous run failed and may have left files behind; its journal will be replaced"
            );
        }
        Ok(Some(previous)) => {
            warn!(run_id = %previous.run_id, "A previous run did not finish; its journal will be replaced");
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Could not read previous run journal"),
    }
}
