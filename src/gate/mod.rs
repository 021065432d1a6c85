//! The country gate.
//!
//! [`GeoGate`] ties the pieces together for one request:
//!
//! 1. resolve the client IP (unresolvable: deny)
//! 2. look up its country in the active database (lookup error: deny)
//! 3. apply the blacklist/whitelist policy
//!
//! Denied requests are terminated by the middleware, preferably by dropping
//! the connection without any response. Every failure along the way is a
//! denial; nothing is ever allowed through by default.

mod connection;
mod middleware;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;

use crate::client_ip::resolve_client_ip;
use crate::config::{parse_update_interval, FilterMode, GateConfig};
use crate::error_handling::{ConfigError, DatabaseOpenError, GateStats, Outcome};
use crate::filter::{decide, CountrySet};
use crate::geoip::{DatabaseInfo, DatabaseManager, DatabaseOpener, MaxMindOpener, RefreshTimer};

pub use connection::ConnectionHandle;
pub use middleware::{forbidden_response, geo_gate_middleware, with_geo_gate};
pub use server::serve_with_hijack;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No usable client address
    IpUnresolvable,
    /// The database could not classify the address
    LookupFailed,
    /// The country policy rejected the address
    Policy,
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the request to the next stage untouched
    Forward,
    /// Terminate the connection
    Deny(DenyReason),
}

/// A configured gate with its database and refresh task.
///
/// Construction validates the configuration and loads the database
/// synchronously, so a `GeoGate` always has a database to query. The refresh
/// task is stopped by [`GeoGate::shutdown`] or when the gate is dropped.
pub struct GeoGate {
    config: GateConfig,
    mode: FilterMode,
    countries: CountrySet,
    manager: Arc<DatabaseManager>,
    refresh: RefreshTimer,
    stats: Arc<GateStats>,
}

impl GeoGate {
    /// Builds a gate reading MaxMind databases.
    ///
    /// Must be called inside a Tokio runtime (the refresh task is spawned).
    ///
    /// # Errors
    ///
    /// Fails on an empty country list, an unknown mode, a database that cannot
    /// be opened, or an update interval that is not a positive duration,
    /// checked in that order.
    pub fn new(config: GateConfig) -> Result<Self, ConfigError> {
        Self::with_opener(config, Arc::new(MaxMindOpener))
    }

    /// Builds a gate with a custom database opener.
    pub fn with_opener(
        config: GateConfig,
        opener: Arc<dyn DatabaseOpener>,
    ) -> Result<Self, ConfigError> {
        let (mode, countries) = config.validate_policy()?;
        let manager = Arc::new(DatabaseManager::open(&config.db_path, opener)?);
        let interval = parse_update_interval(&config.update_interval)?;

        if config.trust_headers {
            log::warn!(
                "trustHeaders is enabled: client IPs are taken from CF-Connecting-IP, \
                 X-Real-IP and X-Forwarded-For. Any client can forge these unless a \
                 trusted reverse proxy in front of the gate overwrites them."
            );
        }

        let stats = Arc::new(GateStats::new());
        let refresh = RefreshTimer::start(Arc::clone(&manager), Arc::clone(&stats), interval);

        log::info!(
            "GeoIP gate ready: mode={}, {} countries, refresh every {}, trust headers: {}",
            mode,
            countries.len(),
            humantime::format_duration(interval),
            config.trust_headers
        );

        Ok(GeoGate {
            config,
            mode,
            countries,
            manager,
            refresh,
            stats,
        })
    }

    /// Decides whether a request with these headers and peer address passes.
    pub fn evaluate(&self, headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> Verdict {
        let verdict = self.evaluate_inner(headers, remote_addr);
        self.stats.increment(match verdict {
            Verdict::Forward => Outcome::Forwarded,
            Verdict::Deny(DenyReason::IpUnresolvable) => Outcome::DeniedIpUnresolvable,
            Verdict::Deny(DenyReason::LookupFailed) => Outcome::DeniedLookupFailed,
            Verdict::Deny(DenyReason::Policy) => Outcome::DeniedPolicy,
        });
        verdict
    }

    fn evaluate_inner(&self, headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> Verdict {
        let Some(ip) = resolve_client_ip(headers, remote_addr, self.config.trust_headers) else {
            log::debug!("Denying request: no resolvable client IP (peer {:?})", remote_addr);
            return Verdict::Deny(DenyReason::IpUnresolvable);
        };

        let country = match self.manager.lookup_country(ip) {
            Ok(country) => country,
            Err(e) => {
                log::debug!("Denying request from {}: lookup failed: {}", ip, e);
                return Verdict::Deny(DenyReason::LookupFailed);
            }
        };

        if decide(&country, self.mode, &self.countries).is_allow() {
            Verdict::Forward
        } else {
            log::debug!("Denying request from {} ({}) by {} policy", ip, country, self.mode);
            Verdict::Deny(DenyReason::Policy)
        }
    }

    /// Reloads the database now, outside the refresh schedule.
    ///
    /// A failure leaves the current database in place.
    pub async fn reload(&self) -> Result<DatabaseInfo, DatabaseOpenError> {
        let manager = Arc::clone(&self.manager);
        let result = match tokio::task::spawn_blocking(move || manager.load_database()).await {
            Ok(result) => result,
            Err(e) => Err(DatabaseOpenError::Interrupted(e.to_string())),
        };
        if let Err(e) = &result {
            log::warn!("Manual database reload failed: {}", e);
        }
        self.stats.increment(if result.is_ok() {
            Outcome::RefreshSuccess
        } else {
            Outcome::RefreshFailure
        });
        result
    }

    /// Stops the refresh task and waits for it to finish.
    pub async fn shutdown(&self) {
        self.refresh.shutdown().await;
    }

    /// Whether the refresh task is still running.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_running()
    }

    /// Validated filter mode.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Configured country codes.
    pub fn countries(&self) -> &CountrySet {
        &self.countries
    }

    /// Whether client IPs are taken from proxy headers.
    pub fn trusts_headers(&self) -> bool {
        self.config.trust_headers
    }

    /// Period of the background refresh.
    pub fn update_interval(&self) -> Duration {
        self.refresh.period()
    }

    /// Metadata of the database currently answering lookups.
    pub fn database_info(&self) -> Option<DatabaseInfo> {
        self.manager.info()
    }

    /// Request and refresh counters.
    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    /// Shared handle to the counters, for tasks that outlive a borrow.
    pub fn shared_stats(&self) -> Arc<GateStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::LookupError;
    use crate::geoip::CountryLookup;
    use axum::http::HeaderValue;
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::path::Path;

    /// Fixed table, shared by every "open"; opening fails when the path is `missing`.
    struct StaticOpener(HashMap<IpAddr, String>);

    struct StaticDb(HashMap<IpAddr, String>);

    impl CountryLookup for StaticDb {
        fn country_of(&self, ip: IpAddr) -> Result<String, LookupError> {
            self.0.get(&ip).cloned().ok_or(LookupError::NotFound)
        }
    }

    impl DatabaseOpener for StaticOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn CountryLookup>, DatabaseOpenError> {
            if path == Path::new("missing") {
                return Err(DatabaseOpenError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(Box::new(StaticDb(self.0.clone())))
        }
    }

    fn opener() -> Arc<StaticOpener> {
        let mut table = HashMap::new();
        table.insert("1.0.0.1".parse().unwrap(), "CN".to_string());
        table.insert("2.0.0.2".parse().unwrap(), "US".to_string());
        table.insert("3.0.0.3".parse().unwrap(), String::new());
        Arc::new(StaticOpener(table))
    }

    fn config(mode: &str, countries: &[&str]) -> GateConfig {
        GateConfig {
            db_path: "test.db".to_string(),
            mode: mode.to_string(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn peer(ip: &str) -> Option<SocketAddr> {
        Some(SocketAddr::new(ip.parse().unwrap(), 40000))
    }

    #[tokio::test]
    async fn test_blacklist_denies_listed_country() {
        let gate = GeoGate::with_opener(config("blacklist", &["CN", "RU"]), opener()).unwrap();
        assert_eq!(
            gate.evaluate(&HeaderMap::new(), peer("1.0.0.1")),
            Verdict::Deny(DenyReason::Policy)
        );
        assert_eq!(gate.evaluate(&HeaderMap::new(), peer("2.0.0.2")), Verdict::Forward);
    }

    #[tokio::test]
    async fn test_whitelist_forwards_listed_country() {
        let gate = GeoGate::with_opener(config("whitelist", &["US"]), opener()).unwrap();
        assert_eq!(gate.evaluate(&HeaderMap::new(), peer("2.0.0.2")), Verdict::Forward);
        assert_eq!(
            gate.evaluate(&HeaderMap::new(), peer("1.0.0.1")),
            Verdict::Deny(DenyReason::Policy)
        );
    }

    #[tokio::test]
    async fn test_unknown_ip_is_denied() {
        let gate = GeoGate::with_opener(config("whitelist", &["US"]), opener()).unwrap();
        assert_eq!(
            gate.evaluate(&HeaderMap::new(), peer("9.9.9.9")),
            Verdict::Deny(DenyReason::LookupFailed)
        );

        let gate = GeoGate::with_opener(config("blacklist", &["CN"]), opener()).unwrap();
        assert_eq!(
            gate.evaluate(&HeaderMap::new(), peer("9.9.9.9")),
            Verdict::Deny(DenyReason::LookupFailed)
        );
    }

    #[tokio::test]
    async fn test_empty_country_code_is_denied_in_blacklist_mode() {
        let gate = GeoGate::with_opener(config("blacklist", &["CN"]), opener()).unwrap();
        assert_eq!(
            gate.evaluate(&HeaderMap::new(), peer("3.0.0.3")),
            Verdict::Deny(DenyReason::Policy)
        );
    }

    #[tokio::test]
    async fn test_missing_peer_is_denied() {
        let gate = GeoGate::with_opener(config("blacklist", &["CN"]), opener()).unwrap();
        assert_eq!(
            gate.evaluate(&HeaderMap::new(), None),
            Verdict::Deny(DenyReason::IpUnresolvable)
        );
    }

    #[tokio::test]
    async fn test_headers_ignored_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("1.0.0.1"));

        let gate = GeoGate::with_opener(config("blacklist", &["CN"]), opener()).unwrap();
        assert_eq!(gate.evaluate(&headers, peer("2.0.0.2")), Verdict::Forward);

        let mut trusting = config("blacklist", &["CN"]);
        trusting.trust_headers = true;
        let gate = GeoGate::with_opener(trusting, opener()).unwrap();
        assert!(gate.trusts_headers());
        assert_eq!(
            gate.evaluate(&headers, peer("2.0.0.2")),
            Verdict::Deny(DenyReason::Policy)
        );
    }

    #[tokio::test]
    async fn test_evaluate_counts_outcomes() {
        let gate = GeoGate::with_opener(config("blacklist", &["CN"]), opener()).unwrap();
        gate.evaluate(&HeaderMap::new(), peer("1.0.0.1"));
        gate.evaluate(&HeaderMap::new(), peer("2.0.0.2"));
        gate.evaluate(&HeaderMap::new(), peer("9.9.9.9"));
        gate.evaluate(&HeaderMap::new(), None);

        let stats = gate.stats();
        assert_eq!(stats.get(Outcome::DeniedPolicy), 1);
        assert_eq!(stats.get(Outcome::Forwarded), 1);
        assert_eq!(stats.get(Outcome::DeniedLookupFailed), 1);
        assert_eq!(stats.get(Outcome::DeniedIpUnresolvable), 1);
        assert_eq!(stats.total_requests(), 4);
    }

    #[tokio::test]
    async fn test_construction_errors_in_order() {
        let err = GeoGate::with_opener(config("graylist", &[]), opener()).err().unwrap();
        assert!(matches!(err, ConfigError::EmptyCountries));

        let err = GeoGate::with_opener(config("graylist", &["US"]), opener())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidMode(_)));

        let mut missing_db = config("blacklist", &["US"]);
        missing_db.db_path = "missing".to_string();
        missing_db.update_interval = "never".to_string();
        let err = GeoGate::with_opener(missing_db, opener()).err().unwrap();
        assert!(matches!(err, ConfigError::Database(_)));

        let mut bad_interval = config("blacklist", &["US"]);
        bad_interval.update_interval = "never".to_string();
        let err = GeoGate::with_opener(bad_interval, opener()).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidInterval(_)));

        let mut zero_interval = config("blacklist", &["US"]);
        zero_interval.update_interval = "0s".to_string();
        let err = GeoGate::with_opener(zero_interval, opener()).err().unwrap();
        assert!(matches!(err, ConfigError::NonPositiveInterval));
    }

    #[tokio::test]
    async fn test_reload_and_shutdown() {
        let gate = GeoGate::with_opener(config("blacklist", &["CN"]), opener()).unwrap();
        assert_eq!(gate.update_interval(), Duration::from_secs(24 * 3600));
        assert_eq!(gate.mode(), FilterMode::Blacklist);
        assert_eq!(gate.countries().len(), 1);
        assert_eq!(gate.database_info().unwrap().source, "test.db");

        gate.reload().await.unwrap();
        assert_eq!(gate.stats().get(Outcome::RefreshSuccess), 1);

        assert!(gate.is_refreshing());
        gate.shutdown().await;
        assert!(!gate.is_refreshing());
    }
}
