use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::FetchError;

/// Suffix of a file still being downloaded.
pub const PART_SUFFIX: &str = ".part";

/// A downloaded file in the staging folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Catalog id of the asset this file came from, when known.
    ///
    /// Files found by a staging sweep have no recorded source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_asset_id: Option<String>,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>, source_asset_id: Option<String>) -> Self {
        Self {
            path: path.into(),
            source_asset_id,
        }
    }

    /// File name component, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// Incremental download progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadProgress {
    pub bytes_done: u64,
    /// `None` when the size could not be resolved.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Completion percentage, if the total is known.
    pub fn percent(&self) -> Option<u8> {
        match self.total_bytes {
            Some(0) => Some(100),
            Some(total) => Some(((self.bytes_done.min(total) * 100) / total) as u8),
            None => None,
        }
    }
}

/// Final path of `name` inside `dir`, rejecting names with directory parts.
pub(crate) fn staged_path(dir: &Path, name: &str) -> Result<PathBuf, FetchError> {
    let file_name = Path::new(name)
        .file_name()
        .filter(|n| n.to_string_lossy() == name)
        .ok_or_else(|| FetchError::InvalidName(name.to_string()))?;
    Ok(dir.join(file_name))
}

/// Temporary path used while `path` downloads.
pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}
