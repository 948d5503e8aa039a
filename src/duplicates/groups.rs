//! Duplicate grouping by content fingerprint.
//!
//! # Overview
//!
//! Grouping partitions fingerprinted entities into buckets sharing an
//! identical fingerprint and keeps only buckets with two or more members.
//! Files and directories are grouped independently; a directory never
//! lands in a file group.
//!
//! Leaf fingerprints for the flat file set are computed here with rayon
//! before grouping, since a file's fingerprint is first needed at this
//! point. Per-file failures are collected, not propagated: one unreadable
//! file costs one group member, never the scan.
//!
//! Group order is first-seen order over the (deterministic) input
//! sequence, so downstream ranking ties break reproducibly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::scanner::{DirectoryEntity, FileEntity, Hasher};

/// A fingerprint bucket with at least two members.
#[derive(Debug, Clone)]
pub struct FingerprintGroup<T> {
    /// Shared content fingerprint.
    pub fingerprint: String,
    /// Entities carrying that fingerprint, in discovery order.
    pub members: Vec<T>,
}

/// Outcome of fingerprinting and grouping the flat file set.
#[derive(Debug)]
pub struct FileGroups {
    /// Groups of identical files, first-seen order.
    pub groups: Vec<FingerprintGroup<FileEntity>>,
    /// Files that could not be fingerprinted.
    pub errors: Vec<(PathBuf, String)>,
}

/// Summary counters for a grouping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Entities examined.
    pub total: usize,
    /// Groups with two or more members.
    pub groups: usize,
    /// Entities sitting in some duplicate group.
    pub duplicates: usize,
}

/// Fingerprint all files in parallel, then group identical ones.
///
/// Files whose fingerprint computation fails are reported in
/// `errors` and excluded from grouping. When `shutdown` is set the
/// remaining unfingerprinted files are skipped.
#[must_use]
pub fn group_files(
    files: Vec<FileEntity>,
    hasher: &Hasher,
    shutdown: Option<Arc<AtomicBool>>,
) -> FileGroups {
    let errors: Vec<(PathBuf, String)> = files
        .par_iter()
        .filter_map(|file| {
            if let Some(flag) = &shutdown {
                if flag.load(Ordering::SeqCst) {
                    return None;
                }
            }
            file.ensure_fingerprint(hasher)
                .err()
                .map(|e| (file.path.clone(), e.to_string()))
        })
        .collect();

    if !errors.is_empty() {
        log::warn!("{} file(s) could not be fingerprinted", errors.len());
    }

    let groups = group_by_fingerprint(files, |file| file.fingerprint().map(str::to_string));

    FileGroups { groups, errors }
}

/// Group directory entities by their precomputed fingerprints.
#[must_use]
pub fn group_directories(
    directories: Vec<DirectoryEntity>,
) -> Vec<FingerprintGroup<DirectoryEntity>> {
    group_by_fingerprint(directories, |dir| Some(dir.fingerprint.clone()))
}

/// Partition entities into fingerprint buckets, keeping only buckets with
/// two or more members. Bucket order follows the first occurrence of each
/// fingerprint in the input; entities without a fingerprint are dropped.
fn group_by_fingerprint<T, F>(items: Vec<T>, fingerprint_of: F) -> Vec<FingerprintGroup<T>>
where
    F: Fn(&T) -> Option<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<FingerprintGroup<T>> = Vec::new();

    for item in items {
        let Some(fingerprint) = fingerprint_of(&item) else {
            continue;
        };
        match index.get(&fingerprint) {
            Some(&i) => buckets[i].members.push(item),
            None => {
                index.insert(fingerprint.clone(), buckets.len());
                buckets.push(FingerprintGroup {
                    fingerprint,
                    members: vec![item],
                });
            }
        }
    }

    buckets.retain(|b| b.members.len() >= 2);
    buckets
}

/// Summarize a grouping pass.
#[must_use]
pub fn grouping_stats<T>(total: usize, groups: &[FingerprintGroup<T>]) -> GroupingStats {
    GroupingStats {
        total,
        groups: groups.len(),
        duplicates: groups.iter().map(|g| g.members.len()).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn entity(dir: &Path, name: &str, content: &[u8], depth: usize) -> FileEntity {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        FileEntity::new(path, metadata.len(), metadata.modified().unwrap(), depth)
    }

    fn dir_entity(path: &str, fingerprint: &str) -> DirectoryEntity {
        DirectoryEntity {
            path: PathBuf::from(path),
            fingerprint: fingerprint.to_string(),
            size: 10,
            file_count: 2,
            depth: 1,
        }
    }

    #[test]
    fn test_group_files_pairs_identical_content() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            entity(dir.path(), "a.txt", b"same", 0),
            entity(dir.path(), "b.txt", b"same", 0),
            entity(dir.path(), "c.txt", b"different", 0),
        ];

        let result = group_files(files, &Hasher::new(), None);

        assert!(result.errors.is_empty());
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].members.len(), 2);
    }

    #[test]
    fn test_group_files_discards_singletons() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            entity(dir.path(), "a.txt", b"unique one", 0),
            entity(dir.path(), "b.txt", b"unique two", 0),
        ];

        let result = group_files(files, &Hasher::new(), None);

        assert!(result.groups.is_empty());
    }

    #[test]
    fn test_group_files_records_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let good_a = entity(dir.path(), "a.txt", b"same", 0);
        let good_b = entity(dir.path(), "b.txt", b"same", 0);

        let vanished = FileEntity::new(
            dir.path().join("vanished.txt"),
            4,
            SystemTime::now(),
            0,
        );

        let result = group_files(vec![good_a, good_b, vanished], &Hasher::new(), None);

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].0.ends_with("vanished.txt"));
        // The readable pair still groups.
        assert_eq!(result.groups.len(), 1);
    }

    #[test]
    fn test_group_files_preserves_first_seen_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            entity(dir.path(), "x1.txt", b"group x", 0),
            entity(dir.path(), "y1.txt", b"group y!", 0),
            entity(dir.path(), "x2.txt", b"group x", 0),
            entity(dir.path(), "y2.txt", b"group y!", 0),
        ];

        let result = group_files(files, &Hasher::new(), None);

        assert_eq!(result.groups.len(), 2);
        assert!(result.groups[0].members[0].path.ends_with("x1.txt"));
        assert!(result.groups[1].members[0].path.ends_with("y1.txt"));
    }

    #[test]
    fn test_group_directories_by_fingerprint() {
        let dirs = vec![
            dir_entity("/a", "fp-1"),
            dir_entity("/b", "fp-1"),
            dir_entity("/c", "fp-2"),
        ];

        let groups = group_directories(dirs);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fingerprint, "fp-1");
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn test_group_directories_empty_input() {
        assert!(group_directories(Vec::new()).is_empty());
    }

    #[test]
    fn test_grouping_stats() {
        let groups = vec![FingerprintGroup {
            fingerprint: "fp".to_string(),
            members: vec![dir_entity("/a", "fp"), dir_entity("/b", "fp")],
        }];

        let stats = grouping_stats(5, &groups);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.duplicates, 2);
    }
}
