//! Upstream forwarding for the `geo_gate` binary.
//!
//! Requests that pass the gate are relayed to a fixed upstream base URL with
//! the same method, path, query, headers and body. The upstream response body
//! is streamed back as it arrives. Hop-by-hop headers are not relayed in
//! either direction.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Url;

use crate::config::{HOP_BY_HOP_HEADERS, MAX_FORWARD_BODY_SIZE, UPSTREAM_TIMEOUT};

/// The service behind the gate.
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base: Url,
}

impl Upstream {
    /// Creates a forwarder for `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, UPSTREAM_TIMEOUT)
    }

    /// Like [`Upstream::new`] with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid upstream URL: {}", base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("Upstream URL must be http or https: {}", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Upstream { client, base })
    }

    /// Base URL requests are forwarded to.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Upstream URL for a request path and query.
    fn target(&self, path_and_query: &str) -> Result<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path_and_query))
            .with_context(|| format!("Invalid upstream target for {}", path_and_query))
    }
}

/// Fallback handler relaying a request to the upstream.
pub async fn forward(State(upstream): State<Upstream>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = match upstream.target(path_and_query) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("{:#}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let body = match axum::body::to_bytes(body, MAX_FORWARD_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Request body rejected: {}", e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let result = upstream
        .client
        .request(parts.method.clone(), target.clone())
        .headers(relayable_headers(&parts.headers, true))
        .body(body)
        .send()
        .await;

    let upstream_response = match result {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Upstream request to {} failed: {}", target, e);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let status = upstream_response.status();
    let headers = relayable_headers(upstream_response.headers(), false);

    let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Copies `headers` minus hop-by-hop headers (and `Host` for outgoing requests).
///
/// Headers named in `Connection` are hop-by-hop as well.
fn relayable_headers(headers: &HeaderMap, outgoing: bool) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    let mut relayed = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let lower = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&lower)
            || connection_listed.iter().any(|c| c == lower)
            || (outgoing && name == header::HOST)
        {
            continue;
        }
        relayed.append(name.clone(), value.clone());
    }
    relayed
}
