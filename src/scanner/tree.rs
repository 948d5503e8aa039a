//! Bottom-up directory tree fingerprinting.
//!
//! # Overview
//!
//! Every directory in a tree receives a content fingerprint derived from
//! its immediate entries: a descriptor line per entry, sorted
//! case-insensitively by name, joined with newlines and hashed. File
//! entries contribute `F:<name>:<size>:<hash>`, subdirectories contribute
//! `D:<name>:<hash>`, and unreadable entries contribute `ERROR:<name>` so
//! the parent fingerprint stays deterministic.
//!
//! A subdirectory's descriptor requires its own fingerprint, so the
//! traversal is a strict post-order: a directory is finalized only after
//! every child directory has been. The recursion of the naive formulation
//! is restated as an explicit enter/exit stack over a session memo, which
//! makes the bottom-up dependency auditable and keeps deep trees off the
//! call stack.
//!
//! Two fingerprints are equal exactly when the subtrees have identical
//! structure and identical file bytes. Renaming an entry changes the
//! parent's fingerprint; listing order never does.
//!
//! # Error Handling
//!
//! An unlistable directory receives a sentinel fingerprint derived from
//! its path and zero aggregates; an unreadable entry inside a listable
//! directory degrades to an `ERROR` descriptor. Both are recorded and
//! neither aborts the scan.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::hasher::{hash_str, sentinel_fingerprint};
use super::{check_scan_root, directory_depth, Hasher, ScanError};

/// A fingerprinted directory with subtree aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntity {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Content fingerprint of the whole subtree.
    pub fingerprint: String,
    /// Total size in bytes of every file in the subtree.
    pub size: u64,
    /// Total number of files in the subtree.
    pub file_count: u64,
    /// Path segments relative to the scan root (root itself is 0).
    pub depth: usize,
}

/// Finalized per-directory state held in the session memo.
#[derive(Debug, Clone)]
struct DirNode {
    fingerprint: String,
    size: u64,
    file_count: u64,
}

/// One immediate entry of a directory, as listed.
#[derive(Debug)]
struct EntryInfo {
    name: OsString,
    is_dir: bool,
}

/// Traversal step for the explicit post-order walk.
enum Visit {
    Enter(PathBuf),
    Exit(PathBuf),
}

/// Scans directory trees and computes per-directory fingerprints.
///
/// All state is session-scoped: each directory is fingerprinted exactly
/// once per scanner instance and memoized by path, which also backs the
/// diagnostic lookup APIs.
#[derive(Debug)]
pub struct DirectoryScanner {
    hasher: Hasher,
    memo: HashMap<PathBuf, DirNode>,
    errors: Vec<ScanError>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl DirectoryScanner {
    /// Create a scanner using the given hasher for leaf files.
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self {
            hasher,
            memo: HashMap::new(),
            errors: Vec::new(),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// The flag is checked between directories; a set flag stops the
    /// traversal at the next boundary.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Errors recorded so far in this session.
    #[must_use]
    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// Move the recorded errors out of the scanner.
    pub fn take_errors(&mut self) -> Vec<ScanError> {
        std::mem::take(&mut self.errors)
    }

    /// Fingerprint of a directory computed earlier in this session.
    #[must_use]
    pub fn fingerprint_of(&self, path: &Path) -> Option<&str> {
        self.memo.get(path).map(|node| node.fingerprint.as_str())
    }

    /// Scan the tree below `root` and return candidate directories.
    ///
    /// Every directory in the tree is fingerprinted; only those whose
    /// subtree holds at least `min_files` files are returned as duplicate
    /// candidates. The returned entities are sorted by path so downstream
    /// grouping sees a deterministic order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`]
    /// when the root precondition fails; everything else is recorded per
    /// item and the scan continues.
    pub fn scan(&mut self, root: &Path, min_files: u64) -> Result<Vec<DirectoryEntity>, ScanError> {
        check_scan_root(root)?;

        self.fingerprint_tree(root);

        let mut candidates: Vec<DirectoryEntity> = self
            .memo
            .iter()
            .filter(|(path, _)| path.starts_with(root))
            .filter(|(_, node)| node.file_count >= min_files)
            .map(|(path, node)| DirectoryEntity {
                path: path.clone(),
                fingerprint: node.fingerprint.clone(),
                size: node.size,
                file_count: node.file_count,
                depth: directory_depth(root, path),
            })
            .collect();
        candidates.sort_by(|a, b| a.path.cmp(&b.path));

        log::debug!(
            "Tree scan of {} fingerprinted {} directorie(s), {} candidate(s) with >= {} file(s)",
            root.display(),
            self.memo.len(),
            candidates.len(),
            min_files
        );

        Ok(candidates)
    }

    /// Fingerprint every directory below `root` in strict post-order.
    fn fingerprint_tree(&mut self, root: &Path) {
        let mut stack = vec![Visit::Enter(root.to_path_buf())];
        let mut pending: HashMap<PathBuf, Vec<EntryInfo>> = HashMap::new();

        while let Some(visit) = stack.pop() {
            if self.is_shutdown_requested() {
                log::debug!("Tree scan: shutdown requested, stopping traversal");
                break;
            }

            match visit {
                Visit::Enter(dir) => {
                    if self.memo.contains_key(&dir) {
                        continue;
                    }
                    match list_entries_sorted(&dir) {
                        Ok(entries) => {
                            // Children are pushed in reverse so they pop in
                            // sorted order, each fully finalized before the
                            // parent's Exit runs.
                            stack.push(Visit::Exit(dir.clone()));
                            for entry in entries.iter().rev().filter(|e| e.is_dir) {
                                stack.push(Visit::Enter(dir.join(&entry.name)));
                            }
                            pending.insert(dir, entries);
                        }
                        Err(e) => {
                            log::warn!("Failed to list {}: {}", dir.display(), e);
                            self.errors.push(ScanError::from_io(&dir, e));
                            self.memo.insert(
                                dir.clone(),
                                DirNode {
                                    fingerprint: sentinel_fingerprint(&dir),
                                    size: 0,
                                    file_count: 0,
                                },
                            );
                        }
                    }
                }
                Visit::Exit(dir) => {
                    let entries = pending.remove(&dir).unwrap_or_default();
                    let node = self.finalize_directory(&dir, &entries);
                    self.memo.insert(dir, node);
                }
            }
        }
    }

    /// Build a directory's descriptors and digest them.
    ///
    /// Precondition: every child directory of `dir` already has a memo
    /// entry (guaranteed by the post-order traversal).
    fn finalize_directory(&mut self, dir: &Path, entries: &[EntryInfo]) -> DirNode {
        let mut descriptors = Vec::with_capacity(entries.len());
        let mut size: u64 = 0;
        let mut file_count: u64 = 0;

        for entry in entries {
            let name = entry.name.to_string_lossy();
            let child = dir.join(&entry.name);

            if entry.is_dir {
                match self.memo.get(&child) {
                    Some(node) => {
                        descriptors.push(format!("D:{}:{}", name, node.fingerprint));
                        size += node.size;
                        file_count += node.file_count;
                    }
                    // Interrupted traversal can leave a child unfinished.
                    None => descriptors.push(format!("ERROR:{}", name)),
                }
            } else {
                match self.hasher.stat_and_hash(&child) {
                    Ok((file_size, fingerprint)) => {
                        descriptors.push(format!("F:{}:{}:{}", name, file_size, fingerprint));
                        size += file_size;
                        file_count += 1;
                    }
                    Err(e) => {
                        log::warn!("Failed to fingerprint {}: {}", child.display(), e);
                        self.errors.push(ScanError::Io {
                            path: child.clone(),
                            source: std::io::Error::other(e.to_string()),
                        });
                        descriptors.push(format!("ERROR:{}", name));
                    }
                }
            }
        }

        DirNode {
            fingerprint: hash_str(&descriptors.join("\n")),
            size,
            file_count,
        }
    }

    /// Rebuild the descriptor listing of an already-scanned directory.
    ///
    /// Diagnostic helper: re-lists the directory and renders the same
    /// descriptor lines that produced its fingerprint, using memoized
    /// child fingerprints. Returns `None` when the directory was never
    /// fingerprinted in this session or can no longer be listed.
    #[must_use]
    pub fn descriptor_listing(&self, path: &Path) -> Option<String> {
        if !self.memo.contains_key(path) {
            return None;
        }
        let entries = list_entries_sorted(path).ok()?;

        let mut descriptors = Vec::with_capacity(entries.len());
        for entry in &entries {
            let name = entry.name.to_string_lossy();
            let child = path.join(&entry.name);
            if entry.is_dir {
                match self.memo.get(&child) {
                    Some(node) => descriptors.push(format!("D:{}:{}", name, node.fingerprint)),
                    None => descriptors.push(format!("ERROR:{}", name)),
                }
            } else {
                match self.hasher.stat_and_hash(&child) {
                    Ok((file_size, fingerprint)) => {
                        descriptors.push(format!("F:{}:{}:{}", name, file_size, fingerprint));
                    }
                    Err(_) => descriptors.push(format!("ERROR:{}", name)),
                }
            }
        }

        Some(descriptors.join("\n"))
    }
}

/// List a directory's immediate entries, sorted case-insensitively by
/// name (raw name as tie-break, so ordering is total).
fn list_entries_sorted(dir: &Path) -> std::io::Result<Vec<EntryInfo>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        entries.push(EntryInfo {
            name: entry.file_name(),
            // Symlinks are never classified as directories, so cycles
            // cannot pull the traversal back up the tree.
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| {
        let a_key = a.name.to_string_lossy().to_lowercase();
        let b_key = b.name.to_string_lossy().to_lowercase();
        a_key.cmp(&b_key).then_with(|| a.name.cmp(&b.name))
    });
    Ok(entries)
}
