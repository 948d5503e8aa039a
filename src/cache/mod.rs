//! Checksum caching module for treedupe.
//!
//! This module provides persistent storage for file fingerprints to speed
//! up subsequent scans by avoiding re-hashing of unchanged files.
//!
//! # Architecture
//!
//! The caching system is split into two components:
//!
//! * [`database`]: SQLite-based persistence, schema management, and the
//!   get/put/cleanup/stats operations.
//! * [`entry`]: The record model stored in the cache and its validation
//!   logic.
//!
//! # Cache Invalidation
//!
//! A record is keyed by file path and validated against:
//! * File size
//! * Modification time (nanosecond precision)
//!
//! Both must match exactly for a lookup to hit. Any mismatch is a miss and
//! the file is re-hashed on the next scan.

pub mod database;
pub mod entry;

pub use database::{CacheError, CacheResult, CacheStats, ChecksumCache};
pub use entry::{nanos_to_system_time, system_time_nanos, CacheEntry};
