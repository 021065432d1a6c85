//! Client IP resolution.
//!
//! With proxy headers trusted, the address is taken from the first of
//! `CF-Connecting-IP`, `X-Real-IP` and `X-Forwarded-For` that is present and
//! non-empty. Otherwise, or when none is present, the transport peer address
//! is used. The chosen value must be a plain IPv4 or IPv6 address (no port,
//! no brackets); there is no fallback to another source once a header has
//! been picked, even when its value is blank or not text.
//!
//! Trusting headers is only safe behind a reverse proxy that overwrites them.
//! A client talking to the gate directly can put any address in them.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, HeaderValue};

use crate::config::{HEADER_CF_CONNECTING_IP, HEADER_X_FORWARDED_FOR, HEADER_X_REAL_IP};

/// Resolves the address a request is judged by.
///
/// Returns `None` when no source is available or the selected value is not an
/// IP address.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    remote_addr: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<IpAddr> {
    if trust_proxy_headers {
        if let Some((name, value)) = selected_header(headers) {
            return header_ip(name, value);
        }
    }

    remote_addr.map(|addr| addr.ip())
}

/// First trusted header, in priority order, whose raw value is non-empty.
fn selected_header(headers: &HeaderMap) -> Option<(&'static str, &HeaderValue)> {
    [HEADER_CF_CONNECTING_IP, HEADER_X_REAL_IP, HEADER_X_FORWARDED_FOR]
        .into_iter()
        .find_map(|name| {
            headers
                .get(name)
                .filter(|v| !v.as_bytes().is_empty())
                .map(|v| (name, v))
        })
}

/// Address carried by a selected header.
///
/// A value that is not text, is blank, or does not parse yields `None`.
fn header_ip(name: &str, value: &HeaderValue) -> Option<IpAddr> {
    let value = value.to_str().ok()?;
    let candidate = if name == HEADER_X_FORWARDED_FOR {
        first_forwarded_hop(value)
    } else {
        value.trim()
    };
    candidate.parse().ok()
}

/// Leftmost entry of a forwarding chain, without surrounding whitespace.
fn first_forwarded_hop(chain: &str) -> &str {
    chain.split(',').next().unwrap_or("").trim()
}
