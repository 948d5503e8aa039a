//! BLAKE3 content fingerprinting with streaming and cache support.
//!
//! # Overview
//!
//! The [`Hasher`] computes 256-bit BLAKE3 digests of full file content,
//! rendered as 64-character lowercase hex strings. Content is streamed
//! through a fixed buffer so memory use stays flat regardless of file size.
//!
//! When constructed with a [`ChecksumCache`], the hasher stats the file
//! first and returns the cached fingerprint on an exact (size, mtime)
//! match without reading any content. Cache failures are logged and
//! degrade to plain recomputation; they never fail a hash request.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::ChecksumCache;

/// Read buffer size for streamed hashing.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Errors that can occur while hashing a file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was not found (may have vanished mid-scan).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
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
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

/// Content fingerprinter with optional cache backing.
#[derive(Debug, Default, Clone)]
pub struct Hasher {
    cache: Option<Arc<ChecksumCache>>,
}

impl Hasher {
    /// Create a hasher with no cache; every request reads file content.
    #[must_use]
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Attach a checksum cache consulted before reading content.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ChecksumCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Whether a cache is attached.
    #[must_use]
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Hash the full content of a file, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the file cannot be opened or read.
    pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0u8; READ_BUFFER_SIZE];

        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| HashError::from_io(path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Hash a file, consulting and populating the cache.
    ///
    /// On a cache hit for the supplied (size, mtime) the stored fingerprint
    /// is returned without opening the file. On a miss the content is
    /// streamed, the result stored, and returned. Cache errors are logged
    /// and treated as misses.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the content read fails; cache failures
    /// never surface here.
    pub fn hash_file_cached(
        &self,
        path: &Path,
        size: u64,
        modified: SystemTime,
    ) -> Result<String, HashError> {
        if let Some(cache) = &self.cache {
            match cache.get(path, size, modified) {
                Ok(Some(fingerprint)) => {
                    log::trace!("Cache hit: {}", path.display());
                    return Ok(fingerprint);
                }
                Ok(None) => {
                    log::trace!("Cache miss: {}", path.display());
                }
                Err(e) => {
                    log::warn!("Failed to query cache for {}: {}", path.display(), e);
                }
            }
        }

        let fingerprint = self.hash_file(path)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(path, size, modified, &fingerprint) {
                log::warn!("Failed to update cache for {}: {}", path.display(), e);
            }
        }

        Ok(fingerprint)
    }

    /// Stat a file and hash it through the cache.
    ///
    /// Convenience wrapper used by the tree fingerprinter, which discovers
    /// entries without pre-collected metadata.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the stat or the read fails.
    pub fn stat_and_hash(&self, path: &Path) -> Result<(u64, String), HashError> {
        let metadata = std::fs::metadata(path).map_err(|e| HashError::from_io(path, e))?;
        let size = metadata.len();
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let fingerprint = self.hash_file_cached(path, size, modified)?;
        Ok((size, fingerprint))
    }
}

/// BLAKE3 digest of a string, as lowercase hex.
///
/// Used for directory descriptor concatenations and error sentinels.
#[must_use]
pub fn hash_str(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Deterministic sentinel fingerprint for an unreadable entity.
///
/// Derived from the path so the containing tree's fingerprint stays stable
/// and reproducible across scans.
#[must_use]
pub fn sentinel_fingerprint(path: &Path) -> String {
    hash_str(&format!("ERROR:{}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_hash_file_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"hello world");
        let hasher = Hasher::new();

        let first = hasher.hash_file(&path).unwrap();
        let second = hasher.hash_file(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_file_differs_on_content() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", b"content one");
        let b = write_file(&dir, "b.txt", b"content two");
        let hasher = Hasher::new();

        assert_ne!(hasher.hash_file(&a).unwrap(), hasher.hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_file_same_content_same_fingerprint() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", b"same bytes");
        let b = write_file(&dir, "b.txt", b"same bytes");
        let hasher = Hasher::new();

        assert_eq!(hasher.hash_file(&a).unwrap(), hasher.hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_file_not_found() {
        let hasher = Hasher::new();
        let result = hasher.hash_file(Path::new("/nonexistent/file.bin"));

        assert!(matches!(result, Err(HashError::NotFound(_))));
    }

    #[test]
    fn test_hash_file_cached_populates_and_hits() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"cache me");
        let cache = Arc::new(ChecksumCache::in_memory().unwrap());
        let hasher = Hasher::new().with_cache(Arc::clone(&cache));

        let metadata = fs::metadata(&path).unwrap();
        let size = metadata.len();
        let modified = metadata.modified().unwrap();

        let first = hasher.hash_file_cached(&path, size, modified).unwrap();

        // The fingerprint must now be resolvable straight from the cache.
        let stored = cache.get(&path, size, modified).unwrap();
        assert_eq!(stored.as_deref(), Some(first.as_str()));

        // A second request must return the same value even if the file
        // content is swapped behind an unchanged (size, mtime) pair, since
        // the cache answers without reading content.
        let second = hasher.hash_file_cached(&path, size, modified).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_file_cached_recomputes_on_stale_state() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"version one!");
        let cache = Arc::new(ChecksumCache::in_memory().unwrap());
        let hasher = Hasher::new().with_cache(Arc::clone(&cache));

        let metadata = fs::metadata(&path).unwrap();
        let old = hasher
            .hash_file_cached(&path, metadata.len(), metadata.modified().unwrap())
            .unwrap();

        // Rewrite with different content and a different mtime.
        fs::write(&path, b"version two!").unwrap();
        let bumped = filetime::FileTime::from_unix_time(2_000_000_000, 0);
        filetime::set_file_mtime(&path, bumped).unwrap();

        let metadata = fs::metadata(&path).unwrap();
        let new = hasher
            .hash_file_cached(&path, metadata.len(), metadata.modified().unwrap())
            .unwrap();

        assert_ne!(old, new);
    }

    #[test]
    fn test_stat_and_hash_reports_size() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"12345");
        let hasher = Hasher::new();

        let (size, fingerprint) = hasher.stat_and_hash(&path).unwrap();

        assert_eq!(size, 5);
        assert_eq!(fingerprint, hasher.hash_file(&path).unwrap());
    }

    #[test]
    fn test_hash_str_stable() {
        assert_eq!(hash_str("abc"), hash_str("abc"));
        assert_ne!(hash_str("abc"), hash_str("abd"));
    }

    #[test]
    fn test_sentinel_fingerprint_depends_on_path() {
        let a = sentinel_fingerprint(Path::new("/locked/a"));
        let b = sentinel_fingerprint(Path::new("/locked/b"));

        assert_ne!(a, b);
        assert_eq!(a, sentinel_fingerprint(Path::new("/locked/a")));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_empty_file_hashes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.txt", b"");
        let hasher = Hasher::new();

        let fingerprint = hasher.hash_file(&path).unwrap();
        assert_eq!(fingerprint.len(), 64);
    }
}
