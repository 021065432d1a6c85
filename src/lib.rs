//! geo_gate library: allow or drop HTTP requests by client country
//!
//! This library provides an axum middleware that resolves the client IP of
//! every request, looks up its ISO country code in a local GeoIP database
//! that is refreshed in the background, and either passes the request on
//! untouched or terminates the connection without a response.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{routing::get, Router};
//! use geo_gate::{serve_with_hijack, with_geo_gate, GateConfig, GeoGate};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GateConfig {
//!     db_path: "/etc/geo/geo.mmdb".into(),
//!     mode: "whitelist".into(),
//!     countries: vec!["US".into(), "CA".into()],
//!     ..Default::default()
//! };
//! let gate = Arc::new(GeoGate::new(config)?);
//!
//! let app = with_geo_gate(Router::new().route("/", get(|| async { "hi" })), gate);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! serve_with_hijack(listener, app, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime: building a [`GeoGate`] spawns the
//! database refresh task.

#![warn(missing_docs)]

pub mod app;
mod client_ip;
pub mod config;
mod error_handling;
mod filter;
mod gate;
mod geoip;
pub mod initialization;
mod status_server;
pub mod upstream;

// Re-export public API
pub use client_ip::resolve_client_ip;
pub use config::{FilterMode, GateConfig, LogFormat, LogLevel, Opt};
pub use error_handling::{
    ConfigError, DatabaseOpenError, GateStats, InitializationError, LookupError, Outcome,
};
pub use filter::{decide, CountrySet, Decision};
pub use gate::{
    forbidden_response, geo_gate_middleware, serve_with_hijack, with_geo_gate, ConnectionHandle,
    DenyReason, GeoGate, Verdict,
};
pub use geoip::{
    CountryLookup, DatabaseInfo, DatabaseManager, DatabaseOpener, MaxMindCountryDb, MaxMindOpener,
    RefreshTimer,
};
pub use status_server::{start_status_server, status_router, StatusState};
