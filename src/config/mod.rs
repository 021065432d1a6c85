//! Gate configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, limits)
//! - Client IP header name constants
//! - The gate configuration type and CLI options
//! - Validation of the raw configuration into a policy

mod constants;
mod headers;
mod types;
mod validation;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{FilterMode, GateConfig, LogFormat, LogLevel, Opt};
pub use validation::parse_update_interval;
