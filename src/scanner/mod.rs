//! Scanner module for file discovery and content fingerprinting.
//!
//! This module provides functionality for:
//! - Flat file discovery with filtering ([`walker`])
//! - Streaming BLAKE3 content hashing with cache support ([`hasher`])
//! - Bottom-up directory tree fingerprinting ([`tree`])
//!
//! # Example
//!
//! ```no_run
//! use treedupe::scanner::{FileScanner, ScanOptions};
//! use std::path::Path;
//!
//! let scanner = FileScanner::new(ScanOptions::default());
//! let scan = scanner.scan(Path::new("/home/user/Downloads")).unwrap();
//! for file in &scan.files {
//!     println!("{}: {} bytes (depth {})", file.path.display(), file.size, file.depth);
//! }
//! ```

pub mod hasher;
pub mod tree;
pub mod walker;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

pub use hasher::Hasher;
pub use tree::{DirectoryEntity, DirectoryScanner};
pub use walker::{FileScan, FileScanner};

use hasher::HashError;

/// A discovered file with lazily computed content fingerprint.
///
/// The fingerprint is populated exactly once per entity via
/// [`FileEntity::ensure_fingerprint`]; repeated calls return the memoized
/// value without touching the filesystem again.
#[derive(Debug)]
pub struct FileEntity {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Number of directory segments between the scan root and the file.
    /// A file directly under the root has depth 0.
    pub depth: usize,
    fingerprint: OnceLock<String>,
}

impl FileEntity {
    /// Create a new file entity with no fingerprint yet.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime, depth: usize) -> Self {
        Self {
            path,
            size,
            modified,
            depth,
            fingerprint: OnceLock::new(),
        }
    }

    /// The fingerprint, if it has been computed.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.get().map(String::as_str)
    }

    /// Return the content fingerprint, computing and memoizing it on first
    /// call.
    ///
    /// The hasher consults its cache before reading file content, so a
    /// valid cache hit never opens the file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read. The error is not
    /// memoized; a later call retries.
    pub fn ensure_fingerprint(&self, hasher: &Hasher) -> Result<&str, HashError> {
        if let Some(fp) = self.fingerprint.get() {
            return Ok(fp.as_str());
        }
        let computed = hasher.hash_file_cached(&self.path, self.size, self.modified)?;
        Ok(self.fingerprint.get_or_init(|| computed).as_str())
    }
}

impl Clone for FileEntity {
    fn clone(&self) -> Self {
        let fingerprint = OnceLock::new();
        if let Some(fp) = self.fingerprint.get() {
            let _ = fingerprint.set(fp.clone());
        }
        Self {
            path: self.path.clone(),
            size: self.size,
            modified: self.modified,
            depth: self.depth,
            fingerprint,
        }
    }
}

/// Filtering options applied during file discovery.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Extension allow-list. `None` means all files are included. Entries
    /// are matched case-insensitively and carry a leading dot.
    pub extensions: Option<HashSet<String>>,
    /// Minimum file size in bytes; smaller files are skipped.
    pub min_size: u64,
}

impl ScanOptions {
    /// Build options from raw CLI-style inputs.
    ///
    /// Extension entries are normalized: trimmed, lowercased, and given a
    /// leading dot when missing. Empty entries are dropped.
    #[must_use]
    pub fn new(extensions: Option<&[String]>, min_size: u64) -> Self {
        let extensions = extensions.map(normalize_extensions);
        Self {
            extensions,
            min_size,
        }
    }
}

/// Normalize an extension allow-list to lowercase dot-prefixed entries.
#[must_use]
pub fn normalize_extensions(raw: &[String]) -> HashSet<String> {
    raw.iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty() && *e != ".")
        .map(|e| {
            if e.starts_with('.') {
                e
            } else {
                format!(".{}", e)
            }
        })
        .collect()
}

/// Errors that can occur during scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Build a scan error from an I/O error at a known path.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path this error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

/// Verify that a scan root exists and is a directory.
///
/// This is the only fatal precondition in the scanning layer; everything
/// after it degrades to per-item error records.
///
/// # Errors
///
/// [`ScanError::NotFound`] or [`ScanError::NotADirectory`].
pub fn check_scan_root(root: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| ScanError::from_io(root, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Depth of a file below the scan root, in directory segments.
///
/// A file directly under the root has depth 0.
#[must_use]
pub fn file_depth(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count().saturating_sub(1))
        .unwrap_or(0)
}

/// Depth of a directory relative to the scan root, in path segments.
///
/// The root itself has depth 0.
#[must_use]
pub fn directory_depth(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count())
        .unwrap_or(0)
}
