// Shared test helpers: a plain-text country database and a gated test server.
//
// The text database has one `ip=CC` entry per line, `*=CC` as a catch-all and
// an optional `version=...` line. Any other non-empty line makes the file
// unreadable as a database, which is how tests simulate a corrupt download.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use geo_gate::{
    serve_with_hijack, with_geo_gate, CountryLookup, DatabaseOpenError, DatabaseOpener,
    GateConfig, GeoGate, LookupError,
};

/// Body served by the handler behind the gate.
pub const UPSTREAM_BODY: &str = "upstream ok";

pub struct TextDb {
    entries: HashMap<IpAddr, String>,
    fallback: Option<String>,
    version: String,
}

impl CountryLookup for TextDb {
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError> {
        self.entries
            .get(&ip)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}

pub struct TextDbOpener;

impl DatabaseOpener for TextDbOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn CountryLookup>, DatabaseOpenError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatabaseOpenError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut db = TextDb {
            entries: HashMap::new(),
            fallback: None,
            version: "unknown".to_string(),
        };
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let format_error = || DatabaseOpenError::Format {
                path: path.to_path_buf(),
                reason: format!("bad line: {}", line),
            };
            let (key, value) = line.split_once('=').ok_or_else(format_error)?;
            match key {
                "version" => db.version = value.to_string(),
                "*" => db.fallback = Some(value.to_string()),
                ip => {
                    let ip: IpAddr = ip.parse().map_err(|_| format_error())?;
                    db.entries.insert(ip, value.to_string());
                }
            }
        }
        Ok(Box::new(db))
    }
}

/// Writes a text database into `dir` and returns its path.
pub fn write_db(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("geo.db");
    std::fs::write(&path, contents).expect("Failed to write test database");
    path
}

/// Gate configuration for a database written by [`write_db`].
pub fn gate_config(
    db_path: &Path,
    mode: &str,
    countries: &[&str],
    trust_headers: bool,
) -> GateConfig {
    GateConfig {
        db_path: db_path.to_string_lossy().into_owned(),
        mode: mode.to_string(),
        countries: countries.iter().map(|c| c.to_string()).collect(),
        trust_headers,
        ..Default::default()
    }
}

/// Builds a gate over the text database.
pub fn build_gate(config: GateConfig) -> Arc<GeoGate> {
    Arc::new(GeoGate::with_opener(config, Arc::new(TextDbOpener)).expect("Failed to build gate"))
}

/// Serves `GET /` behind `gate` on a loopback port.
pub async fn spawn_gated_server(gate: Arc<GeoGate>) -> (SocketAddr, CancellationToken) {
    let router = with_geo_gate(
        Router::new().route("/", get(|| async { UPSTREAM_BODY })),
        gate,
    );
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let shutdown = CancellationToken::new();
    tokio::spawn(serve_with_hijack(listener, router, shutdown.clone()));
    (addr, shutdown)
}

/// Sends `GET /` with `headers` over a fresh connection and returns every
/// byte the server wrote before closing.
pub async fn raw_get(addr: SocketAddr, headers: &[(&str, &str)]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    let mut request = String::from("GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{}: {}\r\n", name, value));
    }
    request.push_str("\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("Failed to send request");

    let mut response = Vec::new();
    // a reset connection counts as "nothing written"
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

/// Atomically replaces the database at `path` with `contents`.
pub fn replace_db(path: &Path, contents: &str) {
    let staging = path.with_extension("tmp");
    std::fs::write(&staging, contents).expect("Failed to write staged database");
    std::fs::rename(&staging, path).expect("Failed to swap database file");
}

/// Polls `condition` every 10ms until it holds, panicking after `timeout`.
pub async fn wait_until(timeout: std::time::Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            timeout
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
