//! GeoIP country lookups with hot reload.
//!
//! A [`DatabaseManager`] owns the active database behind a reader/writer lock
//! and is the only way to query it. A [`RefreshTimer`] re-reads the database
//! file on a fixed period. Databases are opened through a [`DatabaseOpener`],
//! [`MaxMindOpener`] for MaxMind `.mmdb` files.

mod manager;
mod provider;
mod refresh;
mod types;

// Re-export public API
pub use manager::DatabaseManager;
pub use provider::{CountryLookup, DatabaseOpener, MaxMindCountryDb, MaxMindOpener};
pub use refresh::RefreshTimer;
pub use types::DatabaseInfo;
