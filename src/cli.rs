//!
//! This module implements the CLI interface for volume-push: argument
//! parsing, wiring the process-backed tools into the core pipeline, and
//! printing the progress markers.
//!
//! All pipeline logic lives in the [`volume_push_core`] crate. This module is
//! strictly glue: flags and environment in, a [`PipelineConfig`] out, and the
//! pipeline's result surfaced as an `anyhow` error.
//!
//! ## Configuration sources
//! Every value is resolved, highest priority first, from a command-line flag,
//! its environment variable (where one is listed), the YAML file passed with
//! `--config`, and finally the built-in default. See [`crate::load_config`].
//!
//! [`PipelineConfig`]: volume_push_core::config::PipelineConfig

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use volume_push_core::archive::SevenZipArchiver;
use volume_push_core::config::DiscoveryPolicy;
use volume_push_core::pipeline::run_pipeline;
use volume_push_core::vcs::GitClient;

use crate::load_config::{load_config, resolve, FileConfig};

/// CLI for volume-push: archive a directory and publish its volumes to git.
#[derive(Parser)]
#[clap(
    name = "volume-push",
    version,
    about = "Compress a directory into split archive volumes and push them to a git repository"
)]
pub struct Cli {
    /// Absolute path of the source directory
    #[clap(long)]
    pub source: Option<PathBuf>,

    /// Target repository name (the part after the user in the URL)
    #[clap(long)]
    pub target: Option<String>,

    /// Git user name
    #[clap(long, env = "GIT_USERNAME")]
    pub username: Option<String>,

    /// Git password or access token
    #[clap(long, env = "GIT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Path to the git executable
    #[clap(long, env = "GitFullPath")]
    pub git_path: Option<PathBuf>,

    /// Path to the archiver executable (7-Zip compatible)
    #[clap(long, env = "ZipFullPath")]
    pub zip_path: Option<PathBuf>,

    /// Maximum size of each archive volume, e.g. 100m
    #[clap(long)]
    pub volume_size: Option<String>,

    /// How to find archive volumes: contiguous or scan
    #[clap(long)]
    pub discovery: Option<DiscoveryPolicy>,

    /// Directory to clone into (defaults to the current directory)
    #[clap(long)]
    pub workdir: Option<PathBuf>,

    /// Remove this run's archive volumes and clone if a step fails
    #[clap(long)]
    pub cleanup_on_failure: bool,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let cwd = std::env::current_dir()?;
    let config = resolve(cli, file, cwd);

    let archiver = SevenZipArchiver::from_config(&config);
    let git = GitClient::new(&config.tools.git);

    match run_pipeline(&config, &archiver, &git, |event| println!("{event}")).await {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                volumes = report.volumes.len(),
                branch = %report.branch,
                "Upload complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Upload failed");
            Err(anyhow::Error::new(e))
        }
    }
}
