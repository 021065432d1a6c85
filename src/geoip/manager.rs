//! Ownership of the active GeoIP database.
//!
//! Readers take the shared lock for the duration of one lookup. A reload opens
//! the new database with no lock held, then takes the exclusive lock only to
//! replace the instance. The replaced instance is dropped after the exclusive
//! lock is released. Reloads are serialised by a separate mutex so two swaps
//! never interleave.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use super::provider::{CountryLookup, DatabaseOpener};
use super::types::DatabaseInfo;
use crate::error_handling::{DatabaseOpenError, LookupError};

struct ActiveDatabase {
    db: Box<dyn CountryLookup>,
    info: DatabaseInfo,
}

/// Owns the active database and swaps it on reload.
///
/// The database instance itself is never handed out; callers only see
/// [`DatabaseManager::lookup_country`] results.
pub struct DatabaseManager {
    path: PathBuf,
    opener: Arc<dyn DatabaseOpener>,
    active: RwLock<ActiveDatabase>,
    load_lock: Mutex<()>,
}

impl DatabaseManager {
    /// Opens the database at `path` and makes it active.
    ///
    /// There is no manager without a database: if this first open fails the
    /// error is returned and nothing is constructed.
    pub fn open(
        path: impl Into<PathBuf>,
        opener: Arc<dyn DatabaseOpener>,
    ) -> Result<Self, DatabaseOpenError> {
        let path = path.into();
        let initial = open_active(opener.as_ref(), &path)?;
        log::info!(
            "GeoIP database loaded from {} ({})",
            initial.info.source,
            initial.info.version
        );

        Ok(DatabaseManager {
            path,
            opener,
            active: RwLock::new(initial),
            load_lock: Mutex::new(()),
        })
    }

    /// Re-reads the database file and swaps it in.
    ///
    /// On failure the current database stays active and keeps serving.
    pub fn load_database(&self) -> Result<DatabaseInfo, DatabaseOpenError> {
        // guards (), so a poisoned mutex carries no broken state
        let _loading = self.load_lock.lock().unwrap_or_else(|e| e.into_inner());

        let fresh = open_active(self.opener.as_ref(), &self.path)?;
        let info = fresh.info.clone();

        let previous = {
            let mut active = self
                .active
                .write()
                .map_err(|_| DatabaseOpenError::LockPoisoned)?;
            std::mem::replace(&mut *active, fresh)
        };
        drop(previous);

        log::info!("GeoIP database reloaded from {} ({})", info.source, info.version);
        Ok(info)
    }

    /// Looks up the country of `ip` in the active database.
    pub fn lookup_country(&self, ip: IpAddr) -> Result<String, LookupError> {
        let active = self
            .active
            .read()
            .map_err(|_| LookupError::Provider("active database lock poisoned".to_string()))?;
        active.db.country_of(ip)
    }

    /// Metadata of the active database.
    pub fn info(&self) -> Option<DatabaseInfo> {
        self.active.read().ok().map(|active| active.info.clone())
    }

    /// Path the database is (re)loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_active(
    opener: &dyn DatabaseOpener,
    path: &Path,
) -> Result<ActiveDatabase, DatabaseOpenError> {
    let db = opener.open(path)?;
    let info = DatabaseInfo {
        source: path.display().to_string(),
        version: db.version(),
        loaded_at: SystemTime::now(),
    };
    Ok(ActiveDatabase { db, info })
}
