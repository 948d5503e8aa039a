//! JSON rendering of resolution results for scripting.

use serde::Serialize;
use std::path::PathBuf;

use crate::duplicates::{DirectoryGroup, DuplicateGroup, ResolutionResult};
use crate::scanner::{DirectoryEntity, FileEntity};

/// A file member of a duplicate group.
#[derive(Debug, Serialize)]
pub struct FileDto {
    /// Absolute path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Depth below the scan root
    pub depth: usize,
}

impl From<&FileEntity> for FileDto {
    fn from(file: &FileEntity) -> Self {
        Self {
            path: file.path.clone(),
            size: file.size,
            depth: file.depth,
        }
    }
}

/// A directory member of a duplicate group.
#[derive(Debug, Serialize)]
pub struct DirectoryDto {
    /// Absolute path
    pub path: PathBuf,
    /// Subtree size in bytes
    pub size: u64,
    /// Files in the subtree
    pub file_count: u64,
    /// Depth relative to the scan root
    pub depth: usize,
}

impl From<&DirectoryEntity> for DirectoryDto {
    fn from(dir: &DirectoryEntity) -> Self {
        Self {
            path: dir.path.clone(),
            size: dir.size,
            file_count: dir.file_count,
            depth: dir.depth,
        }
    }
}

/// A resolved file group.
#[derive(Debug, Serialize)]
pub struct FileGroupDto {
    /// Shared fingerprint
    pub fingerprint: String,
    /// Combined size of all members
    pub total_size: u64,
    /// Bytes freed by removing the non-kept members
    pub reclaimable: u64,
    /// The canonical copy
    pub keep: FileDto,
    /// Members to remove
    pub remove: Vec<FileDto>,
}

impl From<&DuplicateGroup> for FileGroupDto {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            fingerprint: group.fingerprint.clone(),
            total_size: group.total_size,
            reclaimable: group.reclaimable(),
            keep: FileDto::from(&group.keep),
            remove: group.remove.iter().map(FileDto::from).collect(),
        }
    }
}

/// A resolved directory group.
#[derive(Debug, Serialize)]
pub struct DirectoryGroupDto {
    /// Shared fingerprint
    pub fingerprint: String,
    /// Combined subtree size of all members
    pub total_size: u64,
    /// Total files across member subtrees
    pub total_files: u64,
    /// Bytes freed by removing the non-kept members
    pub reclaimable: u64,
    /// The canonical subtree
    pub keep: DirectoryDto,
    /// Subtrees to remove
    pub remove: Vec<DirectoryDto>,
}

impl From<&DirectoryGroup> for DirectoryGroupDto {
    fn from(group: &DirectoryGroup) -> Self {
        Self {
            fingerprint: group.fingerprint.clone(),
            total_size: group.total_size,
            total_files: group.total_files,
            reclaimable: group.reclaimable(),
            keep: DirectoryDto::from(&group.keep),
            remove: group.remove.iter().map(DirectoryDto::from).collect(),
        }
    }
}

/// A recorded per-item failure.
#[derive(Debug, Serialize)]
pub struct ErrorDto {
    /// Path the failure is about
    pub path: PathBuf,
    /// Failure description
    pub message: String,
}

/// The full machine-readable report.
#[derive(Debug, Serialize)]
pub struct ReportDto {
    /// File groups, ranked by reclaimable space
    pub file_groups: Vec<FileGroupDto>,
    /// Directory groups, ranked by reclaimable space
    pub directory_groups: Vec<DirectoryGroupDto>,
    /// Total files marked for removal
    pub files_to_remove: usize,
    /// Total directories marked for removal
    pub directories_to_remove: usize,
    /// Total reclaimable bytes
    pub reclaimable_bytes: u64,
    /// Every failure recorded during scanning and fingerprinting
    pub errors: Vec<ErrorDto>,
}

impl From<&ResolutionResult> for ReportDto {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            file_groups: result.file_groups.iter().map(FileGroupDto::from).collect(),
            directory_groups: result
                .directory_groups
                .iter()
                .map(DirectoryGroupDto::from)
                .collect(),
            files_to_remove: result.files_to_remove,
            directories_to_remove: result.directories_to_remove,
            reclaimable_bytes: result.reclaimable_bytes,
            errors: result
                .errors
                .iter()
                .map(|(path, message)| ErrorDto {
                    path: path.clone(),
                    message: message.clone(),
                })
                .collect(),
        }
    }
}

/// Render a resolution result as pretty-printed JSON.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails.
pub fn render_json(result: &ResolutionResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ReportDto::from(result))
}
