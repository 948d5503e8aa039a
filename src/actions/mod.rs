//! Filesystem mutation actions for resolved duplicates.

pub mod executor;

pub use executor::{execute, ExecuteConfig, ExecuteError, ExecutionOutcome};
