//! Canonical-copy selection and group ranking.
//!
//! # Overview
//!
//! Within each duplicate group exactly one member is kept and the rest
//! become removal candidates. Selection is a total order over three keys,
//! ascending:
//!
//! 1. Undesirable-path flag: paths containing "new folder" or "recycle"
//!    (case-insensitive) sort after clean paths.
//! 2. Depth: shallower entities win.
//! 3. Full path string: the final, case-sensitive tie-break.
//!
//! The minimum under that order is the keep item. Groups are then ranked
//! for output by descending reclaimable space (the bytes freed by
//! removing the non-kept members); the sort is stable so equal groups
//! keep their discovery order.

use std::path::{Path, PathBuf};

use crate::scanner::{DirectoryEntity, FileEntity};

use super::groups::FingerprintGroup;

/// Path substrings that mark a location as a poor canonical copy.
const UNDESIRABLE_MARKERS: [&str; 2] = ["new folder", "recycle"];

/// A resolved group of duplicate files.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Shared content fingerprint.
    pub fingerprint: String,
    /// The canonical copy that stays on disk.
    pub keep: FileEntity,
    /// Members to be removed or replaced with links, in selection order.
    pub remove: Vec<FileEntity>,
    /// Combined size of all members.
    pub total_size: u64,
}

impl DuplicateGroup {
    /// Bytes freed by removing the non-kept members.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.remove.iter().map(|f| f.size).sum()
    }
}

/// A resolved group of duplicate directory subtrees.
#[derive(Debug, Clone)]
pub struct DirectoryGroup {
    /// Shared subtree fingerprint.
    pub fingerprint: String,
    /// The canonical subtree that stays on disk.
    pub keep: DirectoryEntity,
    /// Subtrees to be removed or replaced with links.
    pub remove: Vec<DirectoryEntity>,
    /// Combined subtree size of all members.
    pub total_size: u64,
    /// Total files across all member subtrees.
    pub total_files: u64,
}

impl DirectoryGroup {
    /// Bytes freed by removing the non-kept subtrees.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.remove.iter().map(|d| d.size).sum()
    }
}

/// Full outcome of duplicate resolution.
///
/// Plain data: the reporting and mutation layers consume this without any
/// further filesystem access.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    /// File groups, ranked by descending reclaimable space.
    pub file_groups: Vec<DuplicateGroup>,
    /// Directory groups, ranked by descending reclaimable space.
    pub directory_groups: Vec<DirectoryGroup>,
    /// Total files marked for removal.
    pub files_to_remove: usize,
    /// Total directories marked for removal.
    pub directories_to_remove: usize,
    /// Total bytes reclaimable across both kinds of group.
    pub reclaimable_bytes: u64,
    /// Errors accumulated during the fingerprinting phases.
    pub errors: Vec<(PathBuf, String)>,
}

impl ResolutionResult {
    /// Whether any duplicate group was found at all.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.file_groups.is_empty() || !self.directory_groups.is_empty()
    }
}

/// Whether a path looks like an auto-generated or recycle location.
#[must_use]
pub fn is_undesirable_path(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_lowercase();
    UNDESIRABLE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// The three-part selection key; lower sorts first.
fn preference_key(path: &Path, depth: usize) -> (u8, usize, String) {
    let flag = u8::from(is_undesirable_path(path));
    (flag, depth, path.to_string_lossy().into_owned())
}

/// Resolve file and directory groups into keep/remove decisions.
///
/// `errors` carries the failures gathered during scanning and
/// fingerprinting; they pass through into the result untouched so the
/// reporting layer sees every recorded failure.
#[must_use]
pub fn resolve(
    file_groups: Vec<FingerprintGroup<FileEntity>>,
    directory_groups: Vec<FingerprintGroup<DirectoryEntity>>,
    errors: Vec<(PathBuf, String)>,
) -> ResolutionResult {
    let mut resolved_files: Vec<DuplicateGroup> = file_groups
        .into_iter()
        .filter(|g| g.members.len() >= 2)
        .map(|group| {
            let total_size = group.members.iter().map(|f| f.size).sum();
            let mut members = group.members;
            members.sort_by(|a, b| {
                preference_key(&a.path, a.depth).cmp(&preference_key(&b.path, b.depth))
            });
            let keep = members.remove(0);
            DuplicateGroup {
                fingerprint: group.fingerprint,
                keep,
                remove: members,
                total_size,
            }
        })
        .collect();

    let mut resolved_dirs: Vec<DirectoryGroup> = directory_groups
        .into_iter()
        .filter(|g| g.members.len() >= 2)
        .map(|group| {
            let total_size = group.members.iter().map(|d| d.size).sum();
            let total_files = group.members.iter().map(|d| d.file_count).sum();
            let mut members = group.members;
            members.sort_by(|a, b| {
                preference_key(&a.path, a.depth).cmp(&preference_key(&b.path, b.depth))
            });
            let keep = members.remove(0);
            DirectoryGroup {
                fingerprint: group.fingerprint,
                keep,
                remove: members,
                total_size,
                total_files,
            }
        })
        .collect();

    // Largest savings first; stable, so equal groups keep discovery order.
    resolved_files.sort_by(|a, b| b.reclaimable().cmp(&a.reclaimable()));
    resolved_dirs.sort_by(|a, b| b.reclaimable().cmp(&a.reclaimable()));

    let files_to_remove = resolved_files.iter().map(|g| g.remove.len()).sum();
    let directories_to_remove = resolved_dirs.iter().map(|g| g.remove.len()).sum();
    let reclaimable_bytes = resolved_files
        .iter()
        .map(DuplicateGroup::reclaimable)
        .sum::<u64>()
        + resolved_dirs
            .iter()
            .map(DirectoryGroup::reclaimable)
            .sum::<u64>();

    log::debug!(
        "Resolved {} file group(s) and {} directory group(s), {} byte(s) reclaimable",
        resolved_files.len(),
        resolved_dirs.len(),
        reclaimable_bytes
    );

    ResolutionResult {
        file_groups: resolved_files,
        directory_groups: resolved_dirs,
        files_to_remove,
        directories_to_remove,
        reclaimable_bytes,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn file(path: &str, size: u64, depth: usize) -> FileEntity {
        FileEntity::new(PathBuf::from(path), size, SystemTime::UNIX_EPOCH, depth)
    }

    fn file_group(fingerprint: &str, members: Vec<FileEntity>) -> FingerprintGroup<FileEntity> {
        FingerprintGroup {
            fingerprint: fingerprint.to_string(),
            members,
        }
    }

    fn dir(path: &str, size: u64, depth: usize) -> DirectoryEntity {
        DirectoryEntity {
            path: PathBuf::from(path),
            fingerprint: "fp".to_string(),
            size,
            file_count: 3,
            depth,
        }
    }

    #[test]
    fn test_is_undesirable_path() {
        assert!(is_undesirable_path(Path::new("/New Folder/a.txt")));
        assert!(is_undesirable_path(Path::new("/drive/$RECYCLE.BIN/a.txt")));
        assert!(is_undesirable_path(Path::new("/tmp/new folder (2)/b")));
        assert!(!is_undesirable_path(Path::new("/documents/a.txt")));
    }

    #[test]
    fn test_keep_prefers_clean_paths_over_undesirable() {
        let group = file_group(
            "fp",
            vec![
                file("/New Folder/a.txt", 10, 1),
                file("/documents/a.txt", 10, 1),
                file("/backup/a.txt", 10, 1),
            ],
        );

        let result = resolve(vec![group], Vec::new(), Vec::new());

        let resolved = &result.file_groups[0];
        assert_eq!(resolved.keep.path, PathBuf::from("/backup/a.txt"));
        assert_eq!(resolved.remove.len(), 2);
    }

    #[test]
    fn test_keep_prefers_shallower_depth() {
        let group = file_group(
            "fp",
            vec![
                file("/deep/nested/a.txt", 10, 2),
                file("/a.txt", 10, 0),
            ],
        );

        let result = resolve(vec![group], Vec::new(), Vec::new());

        assert_eq!(result.file_groups[0].keep.path, PathBuf::from("/a.txt"));
    }

    #[test]
    fn test_keep_breaks_ties_alphabetically() {
        let group = file_group(
            "fp",
            vec![file("/b/a.txt", 10, 1), file("/a/a.txt", 10, 1)],
        );

        let result = resolve(vec![group], Vec::new(), Vec::new());

        assert_eq!(result.file_groups[0].keep.path, PathBuf::from("/a/a.txt"));
    }

    #[test]
    fn test_undesirable_flag_outranks_depth() {
        // A deep clean path beats a shallow recycle path.
        let group = file_group(
            "fp",
            vec![
                file("/recycle/a.txt", 10, 0),
                file("/keep/deep/nested/a.txt", 10, 2),
            ],
        );

        let result = resolve(vec![group], Vec::new(), Vec::new());

        assert_eq!(
            result.file_groups[0].keep.path,
            PathBuf::from("/keep/deep/nested/a.txt")
        );
    }

    #[test]
    fn test_groups_ranked_by_reclaimable_space() {
        let small = file_group(
            "fp-small",
            vec![file("/s1.bin", 10, 0), file("/s2.bin", 10, 0)],
        );
        let large = file_group(
            "fp-large",
            vec![file("/l1.bin", 10_000, 0), file("/l2.bin", 10_000, 0)],
        );

        let result = resolve(vec![small, large], Vec::new(), Vec::new());

        assert_eq!(result.file_groups[0].fingerprint, "fp-large");
        assert_eq!(result.file_groups[1].fingerprint, "fp-small");
    }

    #[test]
    fn test_totals_accumulate() {
        let group_a = file_group(
            "fp-a",
            vec![
                file("/a1.bin", 100, 0),
                file("/a2.bin", 100, 0),
                file("/a3.bin", 100, 0),
            ],
        );
        let group_b = file_group(
            "fp-b",
            vec![file("/b1.bin", 50, 0), file("/b2.bin", 50, 0)],
        );

        let result = resolve(vec![group_a, group_b], Vec::new(), Vec::new());

        assert_eq!(result.files_to_remove, 3);
        assert_eq!(result.reclaimable_bytes, 250);
        assert_eq!(result.file_groups[0].total_size, 300);
    }

    #[test]
    fn test_directory_groups_resolve_independently() {
        let dirs = FingerprintGroup {
            fingerprint: "fp-dir".to_string(),
            members: vec![dir("/copies/backup", 500, 1), dir("/originals", 500, 0)],
        };

        let result = resolve(Vec::new(), vec![dirs], Vec::new());

        assert!(result.file_groups.is_empty());
        let group = &result.directory_groups[0];
        assert_eq!(group.keep.path, PathBuf::from("/originals"));
        assert_eq!(result.directories_to_remove, 1);
        assert_eq!(result.reclaimable_bytes, 500);
        assert_eq!(group.total_files, 6);
    }

    #[test]
    fn test_errors_pass_through() {
        let errors = vec![(PathBuf::from("/bad.txt"), "permission denied".to_string())];

        let result = resolve(Vec::new(), Vec::new(), errors);

        assert_eq!(result.errors.len(), 1);
        assert!(!result.has_duplicates());
    }

    #[test]
    fn test_undersized_groups_are_dropped() {
        let singleton = file_group("fp", vec![file("/only.txt", 10, 0)]);

        let result = resolve(vec![singleton], Vec::new(), Vec::new());

        assert!(result.file_groups.is_empty());
    }
}
