/// `load_config` module: loads the optional YAML config file and layers it
/// under the command line into the core [`PipelineConfig`].
///
/// # Responsibilities
/// - Parse the YAML file into [`FileConfig`], rejecting unknown keys
/// - Merge flags (and their environment variables, resolved by clap) over
///   file values over built-in defaults
///
/// The password is deliberately not a file key: it comes from `--password`
/// or `GIT_PASSWORD` only. A `password:` entry fails to parse.
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI
/// boundary. Missing required values are not an error here; the pipeline
/// validates them before doing anything.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use volume_push_core::config::{Credentials, DiscoveryPolicy, PipelineConfig};

use crate::cli::Cli;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub target: Option<String>,
    pub username: Option<String>,
    pub git_path: Option<PathBuf>,
    pub zip_path: Option<PathBuf>,
    pub volume_size: Option<String>,
    pub discovery: Option<DiscoveryPolicy>,
    pub workdir: Option<PathBuf>,
    pub cleanup_on_failure: Option<bool>,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub commit_message: Option<String>,
    pub branch: Option<String>,
    pub remote_name: Option<String>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Flag (or its env var) wins over the file, the file wins over the default.
///
/// A relative workdir is taken from `cwd`, and a relative source from the
/// workdir, so every step and the journal see one absolute source path.
pub fn resolve(cli: Cli, file: FileConfig, cwd: PathBuf) -> PipelineConfig {
    let credentials = Credentials::new(
        cli.username.or(file.username).unwrap_or_default(),
        cli.password.unwrap_or_default(),
    );
    let workdir = match cli.workdir.or(file.workdir) {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    let source = cli
        .source
        .or(file.source)
        .filter(|s| !s.as_os_str().is_empty())
        .map(|s| workdir.join(s))
        .unwrap_or_default();
    let mut config = PipelineConfig::new(
        source,
        cli.target.or(file.target).unwrap_or_default(),
        credentials,
        workdir,
    );

    if let Some(git) = cli.git_path.or(file.git_path) {
        config.tools.git = git;
    }
    if let Some(archiver) = cli.zip_path.or(file.zip_path) {
        config.tools.archiver = archiver;
    }
    if let Some(size) = cli.volume_size.or(file.volume_size) {
        config.volume_size = size;
    }
    if let Some(discovery) = cli.discovery.or(file.discovery) {
        config.discovery = discovery;
    }
    config.cleanup_on_failure = cli.cleanup_on_failure || file.cleanup_on_failure.unwrap_or(false);

    if let Some(scheme) = file.scheme {
        config.remote.scheme = scheme;
    }
    if let Some(host) = file.host {
        config.remote.host = host;
    }
    if let Some(message) = file.commit_message {
        config.publish.commit_message = message;
    }
    if let Some(branch) = file.branch {
        config.publish.branch = branch;
    }
    if let Some(remote_name) = file.remote_name {
        config.publish.remote_name = remote_name;
    }
    config
}
