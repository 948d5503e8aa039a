//! Signal handling for graceful shutdown.
//!
//! Centralized Ctrl+C handling built on an `AtomicBool` flag shared with
//! worker code. Scanning and fingerprinting loops check the flag between
//! files and directories, so a long scan stops at the next item boundary
//! instead of being killed mid-write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit code for SIGINT (Ctrl+C) interruption.
/// Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shutdown coordinator for graceful application termination.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with the flag initially unset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the flag for passing to worker code.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a Ctrl+C handler and return the shutdown coordinator.
///
/// # Errors
///
/// Returns an error when the process-wide signal handler cannot be
/// installed (for instance if one was already registered).
pub fn install_handler() -> anyhow::Result<ShutdownHandler> {
    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            // Second interrupt: the user really wants out.
            eprintln!("\nForced exit.");
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        eprintln!("\nInterrupted. Finishing current item...");
    })?;

    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_starts_unset() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_request_shutdown_sets_flag() {
        let handler = ShutdownHandler::new();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let handler = ShutdownHandler::new();
        let clone = handler.clone();

        handler.request_shutdown();

        assert!(clone.is_shutdown_requested());
        assert!(clone.get_flag().load(Ordering::SeqCst));
    }
}
