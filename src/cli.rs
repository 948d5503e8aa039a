//! Command-line interface definitions for treedupe.
//!
//! A single flat command: scan a directory, report duplicate files and
//! directory trees, and optionally delete or link them. Dry-run is the
//! default; nothing is mutated without `--delete`.
//!
//! # Example
//!
//! ```bash
//! # Dry-run report over a directory
//! treedupe ~/Downloads
//!
//! # Only consider text-ish files of at least 1 KiB
//! treedupe ~/Downloads --extensions .txt,.md --min-size 1024
//!
//! # Actually delete duplicates, replacing them with symlinks
//! treedupe ~/Downloads --delete --link
//!
//! # Cache maintenance
//! treedupe --cache-stats
//! treedupe --cleanup-cache 30
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Duplicate file and directory-tree finder.
///
/// Finds duplicate files and duplicate directory subtrees by content
/// fingerprint (BLAKE3), keeps the best-placed copy of each, and can
/// replace the rest with symbolic links.
#[derive(Debug, Parser)]
#[command(name = "treedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(
        value_name = "DIRECTORY",
        required_unless_present_any = ["cache_stats", "clear_cache", "cleanup_cache"]
    )]
    pub directory: Option<PathBuf>,

    /// Delete duplicates (default is a dry-run report)
    #[arg(long)]
    pub delete: bool,

    /// Replace each removed duplicate with a symlink to the kept copy
    #[arg(long)]
    pub link: bool,

    /// Comma-separated list of file extensions to include (e.g. '.txt,.md')
    ///
    /// Entries are case-insensitive and normalized to a leading dot.
    #[arg(long, value_name = "EXTS")]
    pub extensions: Option<String>,

    /// Minimum file size in bytes to consider
    #[arg(long, value_name = "BYTES")]
    pub min_size: Option<u64>,

    /// Minimum files in a directory subtree for directory deduplication
    #[arg(long, value_name = "N")]
    pub min_files: Option<u64>,

    /// Minimum directory subtree size in bytes to consider
    #[arg(long, value_name = "BYTES")]
    pub min_dir_size: Option<u64>,

    /// Output format (text report or JSON for scripting)
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to the checksum cache database
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Disable checksum caching
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Show cache statistics and exit
    #[arg(long)]
    pub cache_stats: bool,

    /// Remove all cache records and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Remove cache records for files not modified in DAYS days, then exit
    ///
    /// Without a value, the configured default age is used.
    #[arg(long, value_name = "DAYS", num_args = 0..=1)]
    pub cleanup_cache: Option<Option<u64>>,

    /// Skip the confirmation prompt before deleting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Emit fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// The raw extension entries, split on commas.
    #[must_use]
    pub fn extension_list(&self) -> Option<Vec<String>> {
        self.extensions
            .as_deref()
            .map(|raw| raw.split(',').map(str::to_string).collect())
    }

    /// Whether this invocation only performs cache maintenance.
    #[must_use]
    pub fn is_cache_maintenance(&self) -> bool {
        self.cache_stats || self.clear_cache || self.cleanup_cache.is_some()
    }
}

/// Output format for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored report
    Text,
    /// Machine-readable JSON
    Json,
}
