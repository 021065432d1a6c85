//! GeoIP database providers.
//!
//! The gate only needs "IP to ISO country code". [`CountryLookup`] is that
//! query; [`DatabaseOpener`] turns a path into a ready-to-query instance.
//! Closing an instance is dropping it.

use std::net::IpAddr;
use std::path::Path;

use maxminddb::{geoip2, Reader};

use crate::error_handling::{DatabaseOpenError, LookupError};

/// A loaded database answering country queries.
pub trait CountryLookup: Send + Sync {
    /// ISO 3166-1 alpha-2 code of the country `ip` is registered in.
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError>;

    /// Build identifier of the loaded data, for status reporting.
    fn version(&self) -> String {
        "unknown".to_string()
    }
}

/// Opens a database file into a [`CountryLookup`].
///
/// Called from the refresh task as well as at startup, so implementations
/// must be usable from any thread.
pub trait DatabaseOpener: Send + Sync {
    /// Reads and parses the database at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn CountryLookup>, DatabaseOpenError>;
}

/// Opens MaxMind DB files (GeoLite2/GeoIP2 Country or City).
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxMindOpener;

impl DatabaseOpener for MaxMindOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn CountryLookup>, DatabaseOpenError> {
        Ok(Box::new(MaxMindCountryDb::open(path)?))
    }
}

/// A MaxMind database held in memory.
pub struct MaxMindCountryDb {
    reader: Reader<Vec<u8>>,
}

impl MaxMindCountryDb {
    /// Reads and parses the file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseOpenError> {
        log::debug!("Reading GeoIP database from: {}", path.display());

        let db_bytes = std::fs::read(path).map_err(|source| DatabaseOpenError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let reader = Reader::from_source(db_bytes).map_err(|e| DatabaseOpenError::Format {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(MaxMindCountryDb { reader })
    }
}

impl CountryLookup for MaxMindCountryDb {
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError> {
        // maxminddb 0.27: lookup() returns a LookupResult; has_data() tells
        // whether the address is covered, decode() deserialises the record
        let lookup = self
            .reader
            .lookup(ip)
            .map_err(|e| LookupError::Provider(e.to_string()))?;

        if !lookup.has_data() {
            return Err(LookupError::NotFound);
        }

        // City databases decode into Country as well (it is a field subset)
        let record: geoip2::Country = match lookup.decode() {
            Ok(Some(record)) => record,
            Ok(None) => return Err(LookupError::NotFound),
            Err(e) => return Err(LookupError::Provider(e.to_string())),
        };

        record
            .country
            .iso_code
            .filter(|code| !code.is_empty())
            .map(|code| code.to_string())
            .ok_or(LookupError::NoCountryCode)
    }

    fn version(&self) -> String {
        format!("build_{}", self.reader.metadata.build_epoch)
    }
}
