//! Client IP resolution through the public API.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, HeaderValue};
use geo_gate::resolve_client_ip;

fn peer() -> Option<SocketAddr> {
    Some("192.0.2.10:40000".parse().unwrap())
}

fn ip(s: &str) -> Option<IpAddr> {
    Some(s.parse().unwrap())
}

fn all_three() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.1"));
    headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.2"));
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_static("203.0.113.3, 203.0.113.4"),
    );
    headers
}

#[test]
fn test_cdn_header_wins_when_trusted() {
    assert_eq!(resolve_client_ip(&all_three(), peer(), true), ip("203.0.113.1"));
}

#[test]
fn test_headers_ignored_when_untrusted() {
    assert_eq!(resolve_client_ip(&all_three(), peer(), false), ip("192.0.2.10"));
}

#[test]
fn test_real_ip_before_forwarded_chain() {
    let mut headers = all_three();
    headers.remove("cf-connecting-ip");
    assert_eq!(resolve_client_ip(&headers, peer(), true), ip("203.0.113.2"));
}

#[test]
fn test_forwarded_chain_first_entry_only() {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_static("198.51.100.1,198.51.100.2, 198.51.100.3"),
    );
    assert_eq!(resolve_client_ip(&headers, peer(), true), ip("198.51.100.1"));
}

#[test]
fn test_trusted_without_headers_uses_peer() {
    assert_eq!(resolve_client_ip(&HeaderMap::new(), peer(), true), ip("192.0.2.10"));
}

#[test]
fn test_nothing_to_resolve() {
    assert_eq!(resolve_client_ip(&HeaderMap::new(), None, true), None);
    assert_eq!(resolve_client_ip(&all_three(), None, false), None);
}

#[test]
fn test_ipv6_peer() {
    let v6: SocketAddr = "[2001:db8::5]:443".parse().unwrap();
    assert_eq!(
        resolve_client_ip(&HeaderMap::new(), Some(v6), false),
        ip("2001:db8::5")
    );
}
