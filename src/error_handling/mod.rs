//! Error types and gate statistics.
//!
//! This module provides:
//! - Error type definitions for construction, database loading and lookups
//! - Per-outcome counters for requests and database refreshes
//!
//! Construction errors are fatal and stop the gate from being created.
//! Lookup errors never leave the request path; they become a denial.

mod stats;
mod types;

// Re-export public API
pub use stats::{GateStats, Outcome};
pub use types::{ConfigError, DatabaseOpenError, InitializationError, LookupError};
