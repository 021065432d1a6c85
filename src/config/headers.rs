//! HTTP header name constants.
//!
//! Client IP headers are listed in the order they are consulted when proxy
//! headers are trusted.

/// Edge-assigned client IP set by Cloudflare
pub const HEADER_CF_CONNECTING_IP: &str = "CF-Connecting-IP";
/// Client IP set by a reverse proxy (nginx `real_ip` convention)
pub const HEADER_X_REAL_IP: &str = "X-Real-IP";
/// Comma-separated forwarding chain, leftmost entry is the original client
pub const HEADER_X_FORWARDED_FOR: &str = "X-Forwarded-For";

/// Hop-by-hop headers (RFC 7230 §6.1), never relayed to or from the upstream.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];
