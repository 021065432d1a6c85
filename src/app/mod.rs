//! Binary housekeeping.
//!
//! Periodic statistics logging, the final statistics summary and graceful
//! shutdown used by `main`.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::{log_progress, spawn_stats_logger};
pub use shutdown::shutdown_gracefully;
pub use statistics::print_final_statistics;
