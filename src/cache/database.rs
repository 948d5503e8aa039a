//! SQLite-backed checksum cache.
//!
//! # Overview
//!
//! The cache maps `(path, size, mtime)` to a previously computed content
//! fingerprint so that unchanged files are never re-read on later scans.
//! Lookups hit only when both size and modification time match the stored
//! record exactly; any drift is a miss, never a stale result.
//!
//! The store uses SQLite in WAL mode for durability across process crashes.
//! A single connection behind a mutex serializes writes, which keeps
//! concurrent fingerprinting workers from losing updates.
//!
//! # Failure Mode
//!
//! The cache is an accelerator, not a dependency. Callers that cannot open
//! the store run uncached, and individual get/put failures are surfaced as
//! [`CacheError`] so callers can log them and fall back to recomputing.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::{system_time_nanos, CacheEntry};

/// Errors raised by cache operations.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The default cache location could not be determined.
    #[error("could not determine a cache directory for this platform")]
    NoCacheDir,

    /// Creating the cache directory failed.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An underlying SQLite operation failed.
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Aggregate statistics about the cache contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of cached records.
    pub total_entries: u64,
    /// Number of distinct fingerprints among the records.
    pub unique_fingerprints: u64,
}

/// Persistent checksum cache backed by SQLite.
pub struct ChecksumCache {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for ChecksumCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumCache").finish_non_exhaustive()
    }
}

impl ChecksumCache {
    /// Open (or create) the cache database at the given path.
    ///
    /// Parent directories are created as needed. The schema is applied
    /// idempotently and WAL mode is enabled for crash durability.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or the
    /// database cannot be opened. Callers are expected to degrade to
    /// uncached operation rather than abort.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        log::debug!("Opened checksum cache at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the cache at the platform-specific default location.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NoCacheDir`] when no user cache directory can
    /// be resolved, or any error from [`ChecksumCache::open`].
    pub fn open_default() -> CacheResult<Self> {
        Self::open(&Self::default_path()?)
    }

    /// An in-memory cache with the same schema, for tests and ephemeral use.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if SQLite cannot create the in-memory store.
    pub fn in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Platform-specific default path of the cache database.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NoCacheDir`] when the user cache directory
    /// cannot be determined.
    pub fn default_path() -> CacheResult<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "treedupe", "treedupe")
            .ok_or(CacheError::NoCacheDir)?;
        Ok(dirs.cache_dir().join("checksums.db"))
    }

    fn init_schema(conn: &Connection) -> CacheResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS file_cache (
                file_path   TEXT PRIMARY KEY,
                file_size   INTEGER NOT NULL,
                modified_ns INTEGER NOT NULL,
                fingerprint TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_modified_ns
                ON file_cache(modified_ns);",
        )?;
        Ok(())
    }

    /// Look up the cached fingerprint for a file.
    ///
    /// Returns `Some(fingerprint)` only when a record exists for `path`
    /// whose stored size and modification time equal the supplied values
    /// exactly. A record with any mismatch is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure; callers should treat
    /// this as a miss.
    pub fn get(&self, path: &Path, size: u64, modified: SystemTime) -> CacheResult<Option<String>> {
        let modified_ns = system_time_nanos(modified);
        Ok(self
            .get_entry(path)?
            .filter(|entry| entry.matches(size, modified_ns))
            .map(|entry| entry.fingerprint))
    }

    /// Load the stored record for a path, regardless of validity.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn get_entry(&self, path: &Path) -> CacheResult<Option<CacheEntry>> {
        let key = path.to_string_lossy();
        let conn = self.conn.lock().expect("cache mutex poisoned");

        let entry = conn
            .query_row(
                "SELECT file_size, modified_ns, fingerprint FROM file_cache
                 WHERE file_path = ?1",
                params![key.as_ref()],
                |row| {
                    Ok(CacheEntry::new(
                        path.to_path_buf(),
                        row.get::<_, i64>(0)? as u64,
                        row.get(1)?,
                        row.get(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(entry)
    }

    /// Insert or overwrite the record for a file path.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure; the fingerprint is
    /// simply not cached in that case.
    pub fn put(
        &self,
        path: &Path,
        size: u64,
        modified: SystemTime,
        fingerprint: &str,
    ) -> CacheResult<()> {
        let modified_ns = system_time_nanos(modified);
        let key = path.to_string_lossy();
        let conn = self.conn.lock().expect("cache mutex poisoned");

        conn.execute(
            "INSERT OR REPLACE INTO file_cache (file_path, file_size, modified_ns, fingerprint)
             VALUES (?1, ?2, ?3, ?4)",
            params![key.as_ref(), size as i64, modified_ns, fingerprint],
        )?;

        Ok(())
    }

    /// Delete records for files whose modification time is older than
    /// `max_age_days` days before now, returning the number removed.
    ///
    /// The comparison is against the cached file's own mtime, not the time
    /// the record was written. An entry for a file untouched for years is
    /// pruned even while it is still valid and frequently hit.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn cleanup(&self, max_age_days: u64) -> CacheResult<usize> {
        let now_ns = system_time_nanos(SystemTime::now());
        let age_ns = i64::try_from(max_age_days.saturating_mul(86_400))
            .unwrap_or(i64::MAX)
            .saturating_mul(1_000_000_000);
        let cutoff_ns = now_ns.saturating_sub(age_ns);

        let conn = self.conn.lock().expect("cache mutex poisoned");
        let removed = conn.execute(
            "DELETE FROM file_cache WHERE modified_ns < ?1",
            params![cutoff_ns],
        )?;

        log::debug!(
            "Cache cleanup removed {} record(s) older than {} day(s)",
            removed,
            max_age_days
        );

        Ok(removed)
    }

    /// Aggregate statistics for reporting.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let conn = self.conn.lock().expect("cache mutex poisoned");

        let total_entries: u64 =
            conn.query_row("SELECT COUNT(*) FROM file_cache", [], |row| row.get(0))?;
        let unique_fingerprints: u64 = conn.query_row(
            "SELECT COUNT(DISTINCT fingerprint) FROM file_cache",
            [],
            |row| row.get(0),
        )?;

        Ok(CacheStats {
            total_entries,
            unique_fingerprints,
        })
    }

    /// Remove every record from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn clear(&self) -> CacheResult<()> {
        let conn = self.conn.lock().expect("cache mutex poisoned");
        conn.execute("DELETE FROM file_cache", [])?;
        Ok(())
    }
}
