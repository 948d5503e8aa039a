//! Terminal report rendering for resolution results.
//!
//! Plain text with yansi coloring: a summary block, one table per
//! duplicate group marking KEEP and REMOVE members, an error listing,
//! and a closing dry-run or execution summary. All output goes to
//! stdout; diagnostics stay on the logger.

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::ExecutionOutcome;
use crate::duplicates::ResolutionResult;

/// Counts from the scan phase, for the closing summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanTotals {
    /// Files discovered by the flat scan.
    pub files_scanned: usize,
    /// Directory candidates discovered by the tree scan.
    pub directories_scanned: usize,
    /// Combined bytes across scanned files.
    pub bytes_scanned: u64,
}

/// Print the run banner with the active mode and filters.
pub fn print_banner(directory: &std::path::Path, apply: bool, link: bool) {
    let mode = if apply { "DELETE".red().bold() } else { "DRY RUN".yellow().bold() };
    println!("{} {}", "treedupe".bold(), mode);
    println!("  Directory: {}", directory.display());
    if apply && link {
        println!("  Removed duplicates will be replaced with symlinks");
    }
    println!();
}

/// Print the top-level duplicate summary.
pub fn print_summary(result: &ResolutionResult) {
    println!("{}", "Summary:".bold());
    if !result.file_groups.is_empty() {
        println!("  Duplicate file groups: {}", result.file_groups.len());
        println!("  Files to remove: {}", result.files_to_remove);
    }
    if !result.directory_groups.is_empty() {
        println!("  Duplicate directory groups: {}", result.directory_groups.len());
        println!("  Directories to remove: {}", result.directories_to_remove);
    }
    println!(
        "  Space to free: {}",
        ByteSize(result.reclaimable_bytes).to_string().green()
    );
    if !result.errors.is_empty() {
        println!(
            "  Errors encountered: {}",
            result.errors.len().to_string().red()
        );
    }
    println!();
}

/// Print one table per duplicate group, largest savings first.
pub fn print_detailed_report(result: &ResolutionResult) {
    if result.has_duplicates() {
        println!("{}", "Detailed report:".bold());
    }

    for (i, group) in result.file_groups.iter().enumerate() {
        println!(
            "File group {}: {}... ({} total)",
            i + 1,
            &group.fingerprint[..16.min(group.fingerprint.len())],
            ByteSize(group.total_size)
        );
        println!(
            "  {}  depth {:>2}  {:>10}  {}",
            "KEEP  ".green().bold(),
            group.keep.depth,
            ByteSize(group.keep.size).to_string(),
            group.keep.path.display()
        );
        for file in &group.remove {
            println!(
                "  {}  depth {:>2}  {:>10}  {}",
                "REMOVE".red(),
                file.depth,
                ByteSize(file.size).to_string(),
                file.path.display()
            );
        }
        println!();
    }

    for (i, group) in result.directory_groups.iter().enumerate() {
        println!(
            "Directory group {}: {}... ({} total, {} files)",
            i + 1,
            &group.fingerprint[..16.min(group.fingerprint.len())],
            ByteSize(group.total_size),
            group.total_files
        );
        println!(
            "  {}  depth {:>2}  {:>10}  {:>6} files  {}",
            "KEEP  ".green().bold(),
            group.keep.depth,
            ByteSize(group.keep.size).to_string(),
            group.keep.file_count,
            group.keep.path.display()
        );
        for dir in &group.remove {
            println!(
                "  {}  depth {:>2}  {:>10}  {:>6} files  {}",
                "REMOVE".red(),
                dir.depth,
                ByteSize(dir.size).to_string(),
                dir.file_count,
                dir.path.display()
            );
        }
        println!();
    }
}

/// Print the recorded error list, if any.
pub fn print_errors(result: &ResolutionResult) {
    if result.errors.is_empty() {
        return;
    }
    println!("{}", "Errors:".red().bold());
    for (path, message) in &result.errors {
        println!("  {}: {}", path.display(), message);
    }
    println!();
}

/// Print the closing summary for a dry run.
pub fn print_dry_run_summary(result: &ResolutionResult, totals: ScanTotals) {
    let unique_files = totals.files_scanned.saturating_sub(result.files_to_remove);
    let after_cleanup = totals.bytes_scanned.saturating_sub(result.reclaimable_bytes);

    println!("{}", "Dry run complete".yellow().bold());
    println!("  Files scanned: {}", totals.files_scanned);
    println!("  Unique files: {}", unique_files);
    println!("  Directory candidates: {}", totals.directories_scanned);
    println!(
        "  Space scanned: {}  after cleanup: {}",
        ByteSize(totals.bytes_scanned),
        ByteSize(after_cleanup)
    );
    println!(
        "  Space to be freed: {}",
        ByteSize(result.reclaimable_bytes).to_string().green()
    );
    println!();
    println!(
        "{}",
        "No files or directories were modified. Use --delete to apply.".yellow()
    );
}

/// Print the outcome of an apply run.
pub fn print_execution_outcome(outcome: &ExecutionOutcome) {
    if outcome.processed_count() > 0 {
        println!(
            "{} Removed {} file(s) and {} directorie(s), freed {}",
            "OK".green().bold(),
            outcome.processed_files.len(),
            outcome.processed_directories.len(),
            ByteSize(outcome.bytes_freed)
        );
    } else {
        println!("Nothing to remove.");
    }

    if !outcome.failures.is_empty() {
        println!(
            "{} {} item(s) failed:",
            "WARN".red().bold(),
            outcome.failures.len()
        );
        for (path, message) in &outcome.failures {
            println!("  {}: {}", path.display(), message);
        }
    }
}
