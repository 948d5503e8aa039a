//! Duplicate detection: grouping by fingerprint and keep/remove
//! resolution.
//!
//! The pipeline runs in two single-threaded reductions once fingerprints
//! are available: [`groups`] buckets entities by identical fingerprint,
//! [`resolver`] picks the canonical copy per bucket and ranks the buckets
//! by reclaimable space.

pub mod groups;
pub mod resolver;

pub use groups::{
    group_directories, group_files, grouping_stats, FileGroups, FingerprintGroup, GroupingStats,
};
pub use resolver::{
    is_undesirable_path, resolve, DirectoryGroup, DuplicateGroup, ResolutionResult,
};
