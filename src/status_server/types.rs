//! Status server data structures.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::gate::GeoGate;
use crate::geoip::DatabaseInfo;

/// Shared state for the status server
#[derive(Clone)]
pub struct StatusState {
    /// Gate whose policy and counters are reported
    pub gate: Arc<GeoGate>,
    /// When the status server state was created, for uptime
    pub start_time: Arc<Instant>,
}

impl StatusState {
    /// State for `gate`, with uptime counted from now.
    pub fn new(gate: Arc<GeoGate>) -> Self {
        StatusState {
            gate,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// JSON response for `/status` endpoint
#[derive(Serialize)]
pub struct StatusResponse {
    /// `blacklist` or `whitelist`
    pub mode: String,
    /// Number of configured country codes
    pub country_count: usize,
    /// Whether proxy headers are trusted
    pub trust_headers: bool,
    /// Refresh period
    pub update_interval_seconds: u64,
    /// Whether the refresh task is alive
    pub refresh_running: bool,
    /// Seconds since the status server started
    pub uptime_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Active database, if readable
    pub database: Option<DatabaseStatus>,
    /// Request totals
    pub requests: RequestCounts,
    /// Every counter by its snake_case name
    pub counters: BTreeMap<&'static str, usize>,
}

/// Active database as reported by `/status`
#[derive(Serialize)]
pub struct DatabaseStatus {
    /// Path the database was read from
    pub source: String,
    /// Build identifier
    pub version: String,
    /// Unix timestamp (seconds) at which the database became active
    pub loaded_at: u64,
}

impl From<DatabaseInfo> for DatabaseStatus {
    fn from(info: DatabaseInfo) -> Self {
        DatabaseStatus {
            loaded_at: info
                .loaded_at
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            source: info.source,
            version: info.version,
        }
    }
}

/// Request totals as reported by `/status`
#[derive(Serialize)]
pub struct RequestCounts {
    /// Requests evaluated
    pub total: usize,
    /// Requests passed on
    pub forwarded: usize,
    /// Requests denied for any reason
    pub denied: usize,
}
