//! Configuration constants.
//!
//! Defaults mirror the documented option table of the gate. Anything not
//! exposed as an option lives here as a fixed operational parameter.

use std::time::Duration;

/// Default filesystem path of the GeoIP database
pub const DEFAULT_DB_PATH: &str = "/etc/geo/geo.mmdb";
/// Default filter mode
pub const DEFAULT_MODE: &str = "blacklist";
/// Default refresh period, as a duration string
pub const DEFAULT_UPDATE_INTERVAL: &str = "24h";

/// Default listen address for the gate binary
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

// Upstream forwarding limits
/// Timeout for a single forwarded request (connect + response)
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);
/// Maximum request body size forwarded upstream (16MB)
/// Larger bodies are rejected with 413 before they reach the upstream
pub const MAX_FORWARD_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Interval between periodic gate statistics log lines
pub const STATS_LOGGING_INTERVAL_SECS: u64 = 300;
