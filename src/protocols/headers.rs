//! # Header Sanitizer
//!
//! Strips hop-by-hop and transport-identifying headers from any header set
//! crossing the gateway, in both directions. The same [`sanitize`] is used on
//! the inbound request before forwarding and on the upstream response before
//! relaying, so neither side learns connection details of the other.
//!
//! The forwarding path additionally drops the caller's `Host` and
//! `Authorization` and injects `Authorization: Bearer <token>` only when the
//! alias has a token (see [`forward_headers`]). Because the token is added
//! after sanitization it is never stripped, and it is never added to responses.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::core::error::{GatewayError, GatewayResult};

/// Header names never forwarded in either direction (lower-case)
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
    // Edge runtime and intermediary identity
    "cdn-loop",
    "cf-connecting-ip",
    "cf-connecting-ipv6",
    "cf-ew-via",
    "cf-ipcountry",
    "cf-ray",
    "cf-visitor",
    "cf-worker",
    "forwarded",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "x-real-ip",
];

/// Whether a header name is in the stripped set
///
/// `HeaderName` is always lower-case, which makes the comparison
/// case-insensitive with respect to the wire format.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Copy every header except hop-by-hop ones and those named in `Connection`
pub fn sanitize(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut sanitized = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || connection_listed.iter().any(|listed| listed == name.as_str()) {
            continue;
        }
        sanitized.append(name.clone(), value.clone());
    }
    sanitized
}

/// Headers for a forwarded request
///
/// Sanitizes the inbound headers, removes the caller's `Host` and
/// `Authorization`, then adds the alias token when there is one.
pub fn forward_headers(inbound: &HeaderMap, token: Option<&str>) -> GatewayResult<HeaderMap> {
    let mut headers = sanitize(inbound);
    headers.remove(header::HOST);
    headers.remove(header::AUTHORIZATION);

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| GatewayError::config("configured token is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}
