//! Configuration types and CLI options.
//!
//! This module defines the gate configuration (deserialised from JSON with the
//! same option names the gate has always used) and the command-line options of
//! the `geo_gate` binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::constants::{
    DEFAULT_DB_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_MODE, DEFAULT_UPDATE_INTERVAL,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the configured country set is applied.
///
/// Parsing is exact: only the lowercase names `blacklist` and `whitelist`
/// are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FilterMode {
    /// Deny requests whose country is in the set
    Blacklist,
    /// Allow only requests whose country is in the set
    Whitelist,
}

/// Gate configuration.
///
/// Field names on the wire are camelCase (`apiKey`, `dbPath`, `mode`,
/// `countries`, `updateInterval`, `trustHeaders`). Missing fields take the
/// documented defaults, except `countries`, which must be supplied.
///
/// The struct holds the configuration as written; [`GateConfig::validate_policy`]
/// and [`crate::config::parse_update_interval`] turn it into typed values when
/// the gate is constructed.
///
/// # Examples
///
/// ```
/// use geo_gate::GateConfig;
///
/// let config = GateConfig::from_json_str(
///     r#"{"mode": "whitelist", "countries": ["US", "CA"], "updateInterval": "12h"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.db_path, "/etc/geo/geo.mmdb");
/// assert!(!config.trust_headers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateConfig {
    /// Reserved; not used by the lookup path
    pub api_key: String,

    /// Filesystem path of the MaxMind-format GeoIP database
    pub db_path: String,

    /// `blacklist` or `whitelist`
    pub mode: String,

    /// ISO country codes governing the policy (case-sensitive, non-empty)
    pub countries: Vec<String>,

    /// Refresh period for re-reading `db_path`, e.g. `24h`, `90m`, `1h30m`
    pub update_interval: String,

    /// Resolve the client IP from `CF-Connecting-IP`, `X-Real-IP` and
    /// `X-Forwarded-For` before falling back to the socket address.
    ///
    /// SECURITY: these headers are set by the client unless a trusted
    /// reverse proxy overwrites them. Enabling this without such a proxy in
    /// front of the gate lets any client choose the country it is judged by.
    pub trust_headers: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            db_path: DEFAULT_DB_PATH.to_string(),
            mode: DEFAULT_MODE.to_string(),
            countries: Vec::new(),
            update_interval: DEFAULT_UPDATE_INTERVAL.to_string(),
            trust_headers: false,
        }
    }
}

/// Command-line options for the `geo_gate` binary.
///
/// # Examples
///
/// ```bash
/// # Gate an upstream on port 3000
/// geo_gate --config gate.json --upstream http://127.0.0.1:3000
///
/// # Expose /metrics and /status on 127.0.0.1:9100
/// geo_gate --config gate.json --upstream http://127.0.0.1:3000 --status-port 9100
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "geo_gate",
    about = "Allows or drops HTTP connections based on the client's GeoIP country."
)]
pub struct Opt {
    /// JSON gate configuration file
    #[arg(long, value_parser)]
    pub config: PathBuf,

    /// Address to accept client connections on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// Base URL of the upstream service allowed requests are forwarded to
    #[arg(long)]
    pub upstream: String,

    /// HTTP status server port on 127.0.0.1 (disabled by default)
    #[arg(long)]
    pub status_port: Option<u16>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}
