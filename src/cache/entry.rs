//! Cache entry definitions and validation.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A single file record in the checksum cache.
///
/// The path is the primary key. A stored fingerprint is only valid while
/// both `size` and `modified_ns` match the file's current state exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Absolute path of the cached file.
    pub path: PathBuf,
    /// File size in bytes at the time of hashing.
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch.
    pub modified_ns: i64,
    /// Hex-encoded content fingerprint.
    pub fingerprint: String,
}

impl CacheEntry {
    /// Create a new cache entry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified_ns: i64, fingerprint: String) -> Self {
        Self {
            path,
            size,
            modified_ns,
            fingerprint,
        }
    }

    /// Check whether this entry is still valid for the given file state.
    ///
    /// Validity requires exact equality of both size and modification time.
    /// Any mismatch means the file changed and the fingerprint is stale.
    #[must_use]
    pub fn matches(&self, size: u64, modified_ns: i64) -> bool {
        self.size == size && self.modified_ns == modified_ns
    }
}

/// Convert a [`SystemTime`] to whole nanoseconds since the Unix epoch.
///
/// Times before the epoch map to negative values. This is the canonical
/// representation used for cache validation and age-based cleanup.
#[must_use]
pub fn system_time_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_nanos()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_nanos()).unwrap_or(i64::MAX),
    }
}

/// Convert nanoseconds since the Unix epoch back to a [`SystemTime`].
#[must_use]
pub fn nanos_to_system_time(nanos: i64) -> SystemTime {
    if nanos >= 0 {
        UNIX_EPOCH + Duration::from_nanos(nanos.unsigned_abs())
    } else {
        UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs())
    }
}
