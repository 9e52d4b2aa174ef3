//! Archive volume discovery and copy.
//!
//! Volumes are named `<source>.zip.NNN`, 1-indexed and zero padded to three
//! digits. Discovery is a pure function of which of those files exist; the
//! [`DiscoveryPolicy`] decides what happens at a gap.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::DiscoveryPolicy;
use crate::error::{io_err, VolumeError};

/// Permission bits for copied volumes.
pub const VOLUME_FILE_MODE: u32 = 0o644;

/// One numbered volume of a split archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveVolume {
    pub index: u32,
    pub path: PathBuf,
}

/// A volume after it has been copied into the clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedVolume {
    pub index: u32,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

/// `<source>.zip`, the archive name handed to the archiver. Trailing
/// separators on `source` are dropped.
pub fn archive_path(source: &Path) -> PathBuf {
    with_suffix(source, ".zip")
}

/// `<source>.zip.<index:03>`
pub fn volume_path(source: &Path, index: u32) -> PathBuf {
    with_suffix(source, &format!(".zip.{index:03}"))
}

fn with_suffix(source: &Path, suffix: &str) -> PathBuf {
    let normalized: PathBuf = source.components().collect();
    let mut name: OsString = normalized.into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Final component of `path`, splitting on both `/` and `\` so that
/// Windows-style paths are handled on every platform.
pub fn volume_file_name(path: &Path) -> String {
    let raw = path.to_string_lossy();
    raw.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn discover_volumes(
    source: &Path,
    policy: DiscoveryPolicy,
) -> Result<Vec<ArchiveVolume>, VolumeError> {
    let volumes = match policy {
        DiscoveryPolicy::Contiguous => discover_contiguous(source),
        DiscoveryPolicy::Scan => discover_by_scan(source)?,
    };
    info!(
        source = %source.display(),
        ?policy,
        count = volumes.len(),
        "Discovered archive volumes"
    );
    Ok(volumes)
}

fn discover_contiguous(source: &Path) -> Vec<ArchiveVolume> {
    let mut volumes = Vec::new();
    for index in 1.. {
        let path = volume_path(source, index);
        if !path.is_file() {
            debug!(path = %path.display(), "Volume missing, discovery stops here");
            break;
        }
        volumes.push(ArchiveVolume { index, path });
    }
    volumes
}

fn volume_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+)\.zip\.(\d{3,})$").expect("volume pattern is valid"))
}

fn discover_by_scan(source: &Path) -> Result<Vec<ArchiveVolume>, VolumeError> {
    let normalized: PathBuf = source.components().collect();
    let Some(stem) = normalized.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(Vec::new());
    };
    let parent = match normalized.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let entries = std::fs::read_dir(&parent).map_err(|e| io_err(&parent, e))?;
    let mut volumes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&parent, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(caps) = volume_name_pattern().captures(&name) else {
            continue;
        };
        if caps[1] != *stem {
            continue;
        }
        let Ok(index) = caps[2].parse::<u32>() else {
            continue;
        };
        let path = entry.path();
        if index == 0 || !path.is_file() {
            continue;
        }
        volumes.push(ArchiveVolume { index, path });
    }
    volumes.sort_by_key(|v| v.index);

    for (expected, volume) in (1..).zip(&volumes) {
        if volume.index != expected {
            warn!(
                missing = expected,
                next = volume.index,
                "Gap in archive volume numbering"
            );
            break;
        }
    }
    Ok(volumes)
}

/// Copies one volume into `dest_dir` under its base file name.
pub async fn copy_volume(
    volume: &ArchiveVolume,
    dest_dir: &Path,
) -> Result<CopiedVolume, VolumeError> {
    let destination = dest_dir.join(volume_file_name(&volume.path));
    let bytes = tokio::fs::read(&volume.path)
        .await
        .map_err(|e| io_err(&volume.path, e))?;
    tokio::fs::write(&destination, &bytes)
        .await
        .map_err(|e| io_err(&destination, e))?;
    set_volume_mode(&destination).await?;

    let copied = CopiedVolume {
        index: volume.index,
        source: volume.path.clone(),
        destination,
        bytes: bytes.len() as u64,
        sha256: format!("{:x}", Sha256::digest(&bytes)),
    };
    info!(
        index = copied.index,
        destination = %copied.destination.display(),
        bytes = copied.bytes,
        "Copied archive volume"
    );
    Ok(copied)
}

#[cfg(unix)]
async fn set_volume_mode(path: &Path) -> Result<(), VolumeError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(VOLUME_FILE_MODE))
        .await
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
async fn set_volume_mode(_path: &Path) -> Result<(), VolumeError> {
    Ok(())
}

/// Copies volumes one at a time in the order given. The first failure
/// aborts the rest.
pub async fn copy_volumes(
    volumes: &[ArchiveVolume],
    dest_dir: &Path,
) -> Result<Vec<CopiedVolume>, VolumeError> {
    let mut copied = Vec::with_capacity(volumes.len());
    for volume in volumes {
        copied.push(copy_volume(volume, dest_dir).await?);
    }
    Ok(copied)
}
