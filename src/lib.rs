//! Treedupe - Duplicate File and Directory-Tree Finder
//!
//! A cross-platform Rust CLI that finds duplicate files and duplicate
//! directory subtrees using content fingerprints (BLAKE3), keeps the
//! best-placed copy of each duplicate set, and can replace the rest with
//! symbolic links. A persistent checksum cache makes repeated scans fast.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::actions::ExecuteConfig;
use crate::cache::ChecksumCache;
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{group_directories, group_files, resolve, FileGroups};
use crate::error::ExitCode;
use crate::output::report::{self, ScanTotals};
use crate::scanner::{DirectoryScanner, FileScanner, Hasher, ScanOptions};

/// Run the application logic and return the process exit code.
///
/// # Errors
///
/// Returns an error only for fatal conditions: a scan root that does not
/// exist or is not a directory, an unusable terminal, or a failed signal
/// handler installation. Per-item scan and mutation failures are
/// accumulated and reported, mapping to [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load();
    let cache = open_cache(&cli);

    if cli.is_cache_maintenance() {
        return run_cache_maintenance(&cli, &config, cache.as_deref());
    }

    let root = cli
        .directory
        .clone()
        .context("a directory to scan is required")?;

    let handler = signal::install_handler()?;
    let shutdown = handler.get_flag();

    let hasher = match &cache {
        Some(cache) => Hasher::new().with_cache(Arc::clone(cache)),
        None => Hasher::new(),
    };

    // Phase 1: flat file discovery.
    let options = ScanOptions::new(
        cli.extension_list().as_deref(),
        cli.min_size.unwrap_or(config.min_file_size),
    );
    let spinner = scan_spinner(&cli, "Scanning files...");
    let file_scan = FileScanner::new(options)
        .with_shutdown_flag(Arc::clone(&shutdown))
        .scan(&root)?;
    finish_spinner(spinner, format!("Found {} file(s)", file_scan.files.len()));

    // Phase 2: directory tree fingerprinting.
    let min_files = cli.min_files.unwrap_or(config.min_dir_files);
    let spinner = scan_spinner(&cli, "Scanning directory trees...");
    let mut dir_scanner =
        DirectoryScanner::new(hasher.clone()).with_shutdown_flag(Arc::clone(&shutdown));
    let mut directories = dir_scanner.scan(&root, min_files)?;
    let min_dir_size = cli.min_dir_size.unwrap_or(config.min_dir_size);
    if min_dir_size > 0 {
        directories.retain(|d| d.size >= min_dir_size);
    }
    finish_spinner(spinner, format!("Found {} directorie(s)", directories.len()));

    if handler.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }

    let totals = ScanTotals {
        files_scanned: file_scan.files.len(),
        directories_scanned: directories.len(),
        bytes_scanned: file_scan.total_bytes(),
    };

    let mut errors: Vec<(PathBuf, String)> = file_scan
        .errors
        .iter()
        .map(|e| (e.path().to_path_buf(), e.to_string()))
        .collect();

    // Phase 3: fingerprint files and group both kinds of entity.
    let spinner = scan_spinner(&cli, "Finding duplicates...");
    let FileGroups {
        groups: file_groups,
        errors: hash_errors,
    } = group_files(file_scan.files, &hasher, Some(Arc::clone(&shutdown)));
    let directory_groups = group_directories(directories);
    log::debug!(
        "File grouping: {:?}",
        duplicates::grouping_stats(totals.files_scanned, &file_groups)
    );
    finish_spinner(
        spinner,
        format!(
            "Found {} file group(s), {} directory group(s)",
            file_groups.len(),
            directory_groups.len()
        ),
    );

    if handler.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }

    errors.extend(
        dir_scanner
            .take_errors()
            .iter()
            .map(|e| (e.path().to_path_buf(), e.to_string())),
    );
    errors.extend(hash_errors);

    // Phase 4: keep/remove resolution and ranking.
    let result = resolve(file_groups, directory_groups, errors);

    if cli.output == OutputFormat::Json {
        println!("{}", output::render_json(&result)?);
    } else {
        report::print_banner(&root, cli.delete, cli.link);
        if !result.has_duplicates() {
            println!("No duplicate files or directories found.");
            return Ok(ExitCode::NoDuplicates);
        }
        report::print_summary(&result);
        report::print_detailed_report(&result);
        report::print_errors(&result);
    }

    if !result.has_duplicates() {
        return Ok(ExitCode::NoDuplicates);
    }

    // Phase 5: execution (or its dry-run mirror).
    let exit = if cli.delete {
        let total_items = result.files_to_remove + result.directories_to_remove;
        if !cli.yes && !confirm(&format!("Really delete {} item(s)?", total_items))? {
            println!("Aborted.");
            return Ok(ExitCode::Success);
        }
        let outcome = actions::execute(&result, &ExecuteConfig::apply().with_links(cli.link));
        if cli.output == OutputFormat::Text {
            report::print_execution_outcome(&outcome);
        }
        if outcome.all_succeeded() && result.errors.is_empty() {
            ExitCode::Success
        } else {
            ExitCode::PartialSuccess
        }
    } else {
        let outcome = actions::execute(&result, &ExecuteConfig::dry_run().with_links(cli.link));
        log::debug!(
            "Dry run would affect {} item(s)",
            outcome.processed_count()
        );
        if cli.output == OutputFormat::Text {
            report::print_dry_run_summary(&result, totals);
        }
        if result.errors.is_empty() {
            ExitCode::Success
        } else {
            ExitCode::PartialSuccess
        }
    };

    Ok(exit)
}

/// Open the checksum cache, degrading to uncached operation on failure.
fn open_cache(cli: &Cli) -> Option<Arc<ChecksumCache>> {
    if cli.no_cache {
        log::debug!("Checksum caching disabled");
        return None;
    }
    let result = match &cli.cache {
        Some(path) => ChecksumCache::open(path),
        None => ChecksumCache::open_default(),
    };
    match result {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            log::warn!("Checksum cache unavailable, continuing without it: {}", e);
            None
        }
    }
}

/// Handle the cache-maintenance-only flags.
fn run_cache_maintenance(
    cli: &Cli,
    config: &Config,
    cache: Option<&ChecksumCache>,
) -> Result<ExitCode> {
    let cache = cache.context("checksum cache is unavailable")?;

    if let Some(days) = cli.cleanup_cache {
        let days = days.unwrap_or(config.cache_max_age_days);
        let removed = cache.cleanup(days)?;
        println!("Removed {} stale cache record(s).", removed);
    }
    if cli.clear_cache {
        cache.clear()?;
        println!("Cache cleared.");
    }
    if cli.cache_stats {
        let stats = cache.stats()?;
        println!("Cache entries: {}", stats.total_entries);
        println!("Unique fingerprints: {}", stats.unique_fingerprints);
    }

    Ok(ExitCode::Success)
}

/// Spinner shown while a scan phase runs, in interactive text mode only.
fn scan_spinner(cli: &Cli, message: &str) -> Option<ProgressBar> {
    if cli.quiet || cli.output != OutputFormat::Text {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(message.to_string());
    Some(spinner)
}

fn finish_spinner(spinner: Option<ProgressBar>, message: String) {
    if let Some(spinner) = spinner {
        spinner.finish_with_message(message);
    }
}

/// Ask the user a yes/no question on stdout, defaulting to no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
