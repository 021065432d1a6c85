//! GeoIP data structures.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Metadata about the active GeoIP database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Path the database was read from
    pub source: String,
    /// Database build version (e.g. `build_1718236800`)
    pub version: String,
    /// When this instance became active
    pub loaded_at: SystemTime,
}
