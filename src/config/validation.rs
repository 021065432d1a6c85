//! Configuration loading and validation.
//!
//! Validation is split so the gate can check the policy, open the database and
//! parse the refresh interval in that order.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::types::{FilterMode, GateConfig};
use crate::error_handling::ConfigError;
use crate::filter::CountrySet;

impl GateConfig {
    /// Parses a gate configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a JSON gate configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Validates the country list and mode.
    ///
    /// The country list is checked before the mode.
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptyCountries` if no country codes are configured
    /// - `ConfigError::InvalidMode` if `mode` is not `blacklist` or `whitelist`
    pub fn validate_policy(&self) -> Result<(FilterMode, CountrySet), ConfigError> {
        if self.countries.is_empty() {
            return Err(ConfigError::EmptyCountries);
        }

        let mode = FilterMode::from_str(&self.mode)
            .map_err(|_| ConfigError::InvalidMode(self.mode.clone()))?;

        Ok((mode, CountrySet::from_codes(&self.countries)))
    }
}

/// Longest accepted refresh interval: `i64::MAX` nanoseconds, about 292 years.
const MAX_UPDATE_INTERVAL: Duration = Duration::from_nanos(i64::MAX as u64);

/// Parses a refresh interval such as `24h`, `90m`, `1h30m` or `500ms`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidInterval` if the string is not a duration or
/// exceeds about 292 years, and `ConfigError::NonPositiveInterval` if it
/// parses to zero.
pub fn parse_update_interval(value: &str) -> Result<Duration, ConfigError> {
    let interval = humantime::parse_duration(value.trim())
        .map_err(|e| ConfigError::InvalidInterval(format!("{:?}: {}", value, e)))?;

    if interval.is_zero() {
        return Err(ConfigError::NonPositiveInterval);
    }
    if interval > MAX_UPDATE_INTERVAL {
        return Err(ConfigError::InvalidInterval(format!(
            "{:?}: longer than {}",
            value,
            humantime::format_duration(MAX_UPDATE_INTERVAL)
        )));
    }

    Ok(interval)
}
