//! Flat file discovery using jwalk for parallel traversal.
//!
//! # Overview
//!
//! The [`FileScanner`] walks a directory tree and collects one
//! [`FileEntity`] per regular file, applying the extension allow-list and
//! minimum-size filter from [`ScanOptions`]. Children are sorted during
//! the walk so output order is deterministic.
//!
//! Per-item failures (permission denied, files vanishing mid-walk) are
//! recorded in the scan result and never abort the traversal. The only
//! fatal condition is a scan root that does not exist or is not a
//! directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::WalkDir;

use super::{check_scan_root, file_depth, FileEntity, ScanError, ScanOptions};

/// Result of a flat file scan.
#[derive(Debug, Default)]
pub struct FileScan {
    /// Discovered files that passed all filters.
    pub files: Vec<FileEntity>,
    /// Per-item failures encountered during the walk.
    pub errors: Vec<ScanError>,
}

impl FileScan {
    /// Total bytes across all discovered files.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Directory walker producing file entities for duplicate detection.
#[derive(Debug)]
pub struct FileScanner {
    options: ScanOptions,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl FileScanner {
    /// Create a scanner with the given filtering options.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag turns `true` the walk stops at the next file
    /// boundary and returns what was collected so far.
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

    /// Check a file name against the extension allow-list.
    fn passes_extension_filter(&self, path: &Path) -> bool {
        let Some(allowed) = &self.options.extensions else {
            return true;
        };
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| format!(".{}", s.to_lowercase()));
        match extension {
            Some(ext) => allowed.contains(&ext),
            None => false,
        }
    }

    /// Walk the tree below `root`, collecting file entities.
    ///
    /// Symbolic links are not followed; the link itself is skipped so a
    /// previously deduplicated tree is not re-reported. Directories
    /// contribute nothing here; tree-level duplicate detection is handled
    /// by [`super::DirectoryScanner`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`]
    /// when the root precondition fails. All other failures are recorded
    /// per item inside the returned [`FileScan`].
    pub fn scan(&self, root: &Path) -> Result<FileScan, ScanError> {
        check_scan_root(root)?;

        let mut scan = FileScan::default();

        let walk_dir = WalkDir::new(root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        for entry_result in walk_dir {
            if self.is_shutdown_requested() {
                log::debug!("File scan: shutdown requested, stopping walk");
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.to_path_buf(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walk error for {}: {}", path.display(), e);
                    scan.errors.push(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    });
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }

            let path = entry.path();
            if !self.passes_extension_filter(&path) {
                continue;
            }

            match std::fs::symlink_metadata(&path) {
                Ok(metadata) => {
                    let size = metadata.len();
                    if size < self.options.min_size {
                        log::trace!(
                            "Skipping file below size threshold ({}): {}",
                            size,
                            path.display()
                        );
                        continue;
                    }
                    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    let depth = file_depth(root, &path);
                    scan.files.push(FileEntity::new(path, size, modified, depth));
                }
                Err(e) => {
                    log::warn!("Failed to stat {}: {}", path.display(), e);
                    scan.errors.push(ScanError::from_io(&path, e));
                }
            }
        }

        log::debug!(
            "File scan of {} found {} file(s), {} error(s)",
            root.display(),
            scan.files.len(),
            scan.errors.len()
        );

        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::normalize_extensions;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a test directory with some files.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        let mut f = File::create(dir.path().join("file1.txt")).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let mut f = File::create(dir.path().join("file2.md")).unwrap();
        writeln!(f, "Another file").unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        let mut f = File::create(subdir.join("nested.txt")).unwrap();
        writeln!(f, "Nested file content").unwrap();

        dir
    }

    #[test]
    fn test_scan_finds_all_files() {
        let dir = create_test_dir();
        let scanner = FileScanner::new(ScanOptions::default());

        let scan = scanner.scan(dir.path()).unwrap();

        assert_eq!(scan.files.len(), 3);
        assert!(scan.errors.is_empty());
    }

    #[test]
    fn test_scan_depth_assignment() {
        let dir = create_test_dir();
        let scanner = FileScanner::new(ScanOptions::default());

        let scan = scanner.scan(dir.path()).unwrap();

        for file in &scan.files {
            let name = file.path.file_name().unwrap().to_str().unwrap();
            let expected = if name == "nested.txt" { 1 } else { 0 };
            assert_eq!(file.depth, expected, "wrong depth for {}", name);
        }
    }

    #[test]
    fn test_scan_extension_filter() {
        let dir = create_test_dir();
        let extensions = normalize_extensions(&["txt".to_string()]);
        let scanner = FileScanner::new(ScanOptions {
            extensions: Some(extensions),
            min_size: 0,
        });

        let scan = scanner.scan(dir.path()).unwrap();

        assert_eq!(scan.files.len(), 2);
        for file in &scan.files {
            assert_eq!(file.path.extension().unwrap(), "txt");
        }
    }

    #[test]
    fn test_scan_extension_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("photo.JPG"), b"image bytes").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();

        let extensions = normalize_extensions(&[".jpg".to_string()]);
        let scanner = FileScanner::new(ScanOptions {
            extensions: Some(extensions),
            min_size: 0,
        });

        let scan = scanner.scan(dir.path()).unwrap();

        assert_eq!(scan.files.len(), 1);
        assert_eq!(scan.files[0].path.file_name().unwrap(), "photo.JPG");
    }

    #[test]
    fn test_scan_min_size_filter() {
        let dir = create_test_dir();
        let mut f = File::create(dir.path().join("tiny.bin")).unwrap();
        f.write_all(b"X").unwrap();

        let scanner = FileScanner::new(ScanOptions {
            extensions: None,
            min_size: 10,
        });

        let scan = scanner.scan(dir.path()).unwrap();

        for file in &scan.files {
            assert!(file.size >= 10, "{} is too small", file.path.display());
        }
    }

    #[test]
    fn test_scan_rejects_missing_root() {
        let scanner = FileScanner::new(ScanOptions::default());

        let result = scanner.scan(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(ScanError::NotFound(_))));
    }

    #[test]
    fn test_scan_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"content").unwrap();
        let scanner = FileScanner::new(ScanOptions::default());

        let result = scanner.scan(&file);

        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_scan_skips_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        symlink(
            dir.path().join("file1.txt"),
            dir.path().join("link-to-file1"),
        )
        .unwrap();

        let scanner = FileScanner::new(ScanOptions::default());
        let scan = scanner.scan(dir.path()).unwrap();

        assert_eq!(scan.files.len(), 3);
        assert!(scan
            .files
            .iter()
            .all(|f| f.path.file_name().unwrap() != "link-to-file1"));
    }

    #[test]
    fn test_scan_shutdown_flag_stops_early() {
        let dir = create_test_dir();
        for i in 0..10 {
            fs::write(dir.path().join(format!("extra{}.txt", i)), b"content").unwrap();
        }

        let shutdown = Arc::new(AtomicBool::new(true));
        let scanner =
            FileScanner::new(ScanOptions::default()).with_shutdown_flag(Arc::clone(&shutdown));

        let scan = scanner.scan(dir.path()).unwrap();

        assert!(scan.files.is_empty());
    }

    #[test]
    fn test_scan_includes_empty_files() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("empty.txt")).unwrap();

        let scanner = FileScanner::new(ScanOptions::default());
        let scan = scanner.scan(dir.path()).unwrap();

        assert_eq!(scan.files.len(), 1);
        assert_eq!(scan.files[0].size, 0);
    }

    #[test]
    fn test_total_bytes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("b.bin"), vec![0u8; 50]).unwrap();

        let scanner = FileScanner::new(ScanOptions::default());
        let scan = scanner.scan(dir.path()).unwrap();

        assert_eq!(scan.total_bytes(), 150);
    }
}
