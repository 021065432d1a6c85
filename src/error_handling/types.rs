//! Error type definitions.

use std::path::PathBuf;

use log::SetLoggerError;
use thiserror::Error;

/// Errors that prevent the gate from being constructed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No country codes were configured.
    #[error("countries list cannot be empty")]
    EmptyCountries,

    /// The mode is neither `blacklist` nor `whitelist`.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// The update interval is not a duration string.
    #[error("invalid update interval: {0}")]
    InvalidInterval(String),

    /// The update interval parsed to zero.
    #[error("invalid update interval: must be greater than zero")]
    NonPositiveInterval,

    /// The initial database load failed.
    #[error(transparent)]
    Database(#[from] DatabaseOpenError),

    /// The configuration document could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Errors opening a GeoIP database or installing it as the active one.
#[derive(Error, Debug)]
pub enum DatabaseOpenError {
    /// The database file could not be read.
    #[error("error opening database {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a usable database.
    #[error("error opening database {path}: {reason}")]
    Format {
        /// Path that was read
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The active-database lock was poisoned by a panicking holder.
    #[error("active database lock poisoned")]
    LockPoisoned,

    /// The background load task panicked or was cancelled.
    #[error("database load task failed: {0}")]
    Interrupted(String),
}

/// Reasons a lookup could not produce a country code.
///
/// Every variant is treated as a denial by the gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The database has no record for the address.
    #[error("no record found for address")]
    NotFound,

    /// A record exists but carries no ISO country code.
    #[error("record has no country code")]
    NoCountryCode,

    /// The provider failed (corrupt data, address family mismatch, ...).
    #[error("provider error: {0}")]
    Provider(String),
}

/// Error types for process initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::EmptyCountries.to_string(),
            "countries list cannot be empty"
        );
        assert_eq!(
            ConfigError::InvalidMode("graylist".into()).to_string(),
            "invalid mode: graylist"
        );
        assert!(ConfigError::NonPositiveInterval
            .to_string()
            .contains("greater than zero"));
    }

    #[test]
    fn test_database_error_is_transparent_in_config_error() {
        let db_err = DatabaseOpenError::Format {
            path: PathBuf::from("/etc/geo/geo.mmdb"),
            reason: "bad metadata".to_string(),
        };
        let expected = db_err.to_string();
        let config_err = ConfigError::from(db_err);
        assert_eq!(config_err.to_string(), expected);
        assert!(expected.contains("/etc/geo/geo.mmdb"));
        assert!(expected.contains("bad metadata"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;
        let err = DatabaseOpenError::Io {
            path: PathBuf::from("missing.mmdb"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing.mmdb"));
    }
}
