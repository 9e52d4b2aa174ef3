use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::url::CloneUrl;

pub const DEFAULT_GIT_PROGRAM: &str = "git";
pub const DEFAULT_ARCHIVER_PROGRAM: &str = "7z";
pub const DEFAULT_VOLUME_SIZE: &str = "100m";
pub const DEFAULT_COMMIT_MESSAGE: &str = "- upload files";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_REMOTE_NAME: &str = "origin";
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "github.com";

/// Everything one run needs. Built once at startup and passed by reference
/// to every step.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    pub target_repo: String,
    pub credentials: Credentials,
    pub tools: ToolPaths,
    pub remote: RemoteConfig,
    pub publish: PublishConfig,
    /// Archiver volume cap, in the archiver's `-v` syntax (e.g. `100m`).
    pub volume_size: String,
    pub discovery: DiscoveryPolicy,
    /// Directory the clone is created in.
    pub workdir: PathBuf,
    pub cleanup_on_failure: bool,
}

impl PipelineConfig {
    /// A config with every optional setting at its default.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_repo: impl Into<String>,
        credentials: Credentials,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_repo: target_repo.into(),
            credentials,
            tools: ToolPaths::default(),
            remote: RemoteConfig::default(),
            publish: PublishConfig::default(),
            volume_size: DEFAULT_VOLUME_SIZE.to_string(),
            discovery: DiscoveryPolicy::default(),
            workdir: workdir.into(),
            cleanup_on_failure: false,
        }
    }

    /// Checks the four required inputs. Reports the first one that is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("source"));
        }
        if self.target_repo.is_empty() {
            return Err(ConfigError::Missing("target"));
        }
        if self.credentials.username.is_empty() {
            return Err(ConfigError::Missing("username"));
        }
        if self.credentials.password.is_empty() {
            return Err(ConfigError::Missing("password"));
        }
        Ok(())
    }

    /// Where the target repository is cloned to.
    pub fn clone_dir(&self) -> PathBuf {
        self.workdir.join(&self.target_repo)
    }

    pub fn clone_url(&self) -> CloneUrl {
        CloneUrl::new(&self.remote, &self.credentials, &self.target_repo)
    }

    pub fn trace_loaded(&self) {
        info!(
            source_dir = %self.source_dir.display(),
            target_repo = %self.target_repo,
            username = %self.credentials.username,
            workdir = %self.workdir.display(),
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

/// Username and password (or token) embedded in the clone URL.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    pub git: PathBuf,
    pub archiver: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            git: PathBuf::from(DEFAULT_GIT_PROGRAM),
            archiver: PathBuf::from(DEFAULT_ARCHIVER_PROGRAM),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub scheme: String,
    pub host: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub commit_message: String,
    pub branch: String,
    pub remote_name: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            remote_name: DEFAULT_REMOTE_NAME.to_string(),
        }
    }
}

/// How archive volumes are found after the archiver has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryPolicy {
    /// Probe `.zip.001`, `.zip.002`, ... and stop at the first missing index.
    /// Volumes after a gap are not collected.
    #[default]
    Contiguous,
    /// List the source's parent directory and take every numbered volume,
    /// sorted by index.
    Scan,
}

impl FromStr for DiscoveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contiguous" => Ok(DiscoveryPolicy::Contiguous),
            "scan" => Ok(DiscoveryPolicy::Scan),
            other => Err(format!(
                "unknown discovery policy '{other}', expected 'contiguous' or 'scan'"
            )),
        }
    }
}
