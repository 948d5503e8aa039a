//! Mutation executor: remove duplicates, optionally leaving symlinks.
//!
//! # Overview
//!
//! The executor walks a [`ResolutionResult`] and, for every removal
//! candidate, deletes the item and creates a symbolic link at the same
//! path pointing at the group's keep item. Directory subtrees are removed
//! recursively and replaced by a single link, not per-file links.
//!
//! Each item's delete+link pair is a best-effort unit: a failure at
//! either step is recorded as `(path, message)` and processing moves to
//! the next item. When a delete succeeds but the link cannot be created,
//! the item stays deleted with no replacement; that is a recorded
//! failure, not something silently repaired.
//!
//! Dry-run mode reports exactly the set of paths apply mode would touch
//! while leaving the filesystem untouched.

use std::io;
use std::path::{Path, PathBuf};

use crate::duplicates::ResolutionResult;

/// Errors for a single executor item.
#[derive(thiserror::Error, Debug)]
pub enum ExecuteError {
    /// The item could not be removed.
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// Path being removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The item was removed but the replacement link failed; the path is
    /// left with neither file nor link.
    #[error("removed {path} but failed to create link to {target}: {source}")]
    Link {
        /// Path where the link should exist
        path: PathBuf,
        /// Link target (the keep item)
        target: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Configuration for an executor run.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
    /// Report what would happen without mutating the filesystem.
    pub dry_run: bool,
    /// Create a symlink to the keep item after each removal. When false
    /// the duplicates are removed outright.
    pub replace_with_links: bool,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            replace_with_links: true,
        }
    }
}

impl ExecuteConfig {
    /// Config for a reporting-only pass.
    #[must_use]
    pub fn dry_run() -> Self {
        Self::default()
    }

    /// Config that mutates the filesystem.
    #[must_use]
    pub fn apply() -> Self {
        Self {
            dry_run: false,
            replace_with_links: true,
        }
    }

    /// Enable or disable symlink replacement.
    #[must_use]
    pub fn with_links(mut self, replace_with_links: bool) -> Self {
        self.replace_with_links = replace_with_links;
        self
    }
}

/// Outcome of an executor run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// File paths processed successfully, in group-rank order.
    pub processed_files: Vec<PathBuf>,
    /// Directory paths processed successfully, in group-rank order.
    pub processed_directories: Vec<PathBuf>,
    /// Per-item failures; the batch continued past every one of them.
    pub failures: Vec<(PathBuf, String)>,
    /// Bytes freed by successful removals (counted in dry-run as well,
    /// as the bytes that would be freed).
    pub bytes_freed: u64,
}

impl ExecutionOutcome {
    /// Number of successfully processed items of both kinds.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed_files.len() + self.processed_directories.len()
    }

    /// Whether every item was processed without failure.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Processed {} file(s) and {} directorie(s), freed {} bytes",
                self.processed_files.len(),
                self.processed_directories.len(),
                self.bytes_freed
            )
        } else {
            format!(
                "Processed {} file(s) and {} directorie(s), {} failed, freed {} bytes",
                self.processed_files.len(),
                self.processed_directories.len(),
                self.failures.len(),
                self.bytes_freed
            )
        }
    }
}

/// Apply the keep/remove decisions of a resolution.
///
/// Iterates groups in their ranked order and removal items in selection
/// order, so the returned path sequences are reproducible. Never returns
/// an error: every failure is isolated into the outcome's failure list.
#[must_use]
pub fn execute(result: &ResolutionResult, config: &ExecuteConfig) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for group in &result.file_groups {
        for item in &group.remove {
            if config.dry_run {
                outcome.processed_files.push(item.path.clone());
                outcome.bytes_freed += item.size;
                continue;
            }
            match replace_item(&item.path, &group.keep.path, false, config) {
                Ok(()) => {
                    outcome.processed_files.push(item.path.clone());
                    outcome.bytes_freed += item.size;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    // A failed link still freed the bytes of the removal.
                    if matches!(e, ExecuteError::Link { .. }) {
                        outcome.bytes_freed += item.size;
                    }
                    outcome.failures.push((item.path.clone(), e.to_string()));
                }
            }
        }
    }

    for group in &result.directory_groups {
        for item in &group.remove {
            if config.dry_run {
                outcome.processed_directories.push(item.path.clone());
                outcome.bytes_freed += item.size;
                continue;
            }
            match replace_item(&item.path, &group.keep.path, true, config) {
                Ok(()) => {
                    outcome.processed_directories.push(item.path.clone());
                    outcome.bytes_freed += item.size;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    if matches!(e, ExecuteError::Link { .. }) {
                        outcome.bytes_freed += item.size;
                    }
                    outcome.failures.push((item.path.clone(), e.to_string()));
                }
            }
        }
    }

    log::info!("{}", outcome.summary());

    outcome
}

/// Remove one item and optionally link it to the keep path.
fn replace_item(
    path: &Path,
    keep: &Path,
    is_dir: bool,
    config: &ExecuteConfig,
) -> Result<(), ExecuteError> {
    let removal = if is_dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removal.map_err(|e| ExecuteError::Remove {
        path: path.to_path_buf(),
        source: e,
    })?;

    log::debug!("Removed {}", path.display());

    if config.replace_with_links {
        create_symlink(keep, path, is_dir).map_err(|e| ExecuteError::Link {
            path: path.to_path_buf(),
            target: keep.to_path_buf(),
            source: e,
        })?;
        log::debug!("Linked {} -> {}", path.display(), keep.display());
    }

    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path, _is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
