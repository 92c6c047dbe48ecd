//! Identifier encoding for upstream URLs.
//!
//! Repository ids and file paths are split on `/`, empty segments are dropped,
//! and every remaining segment is percent-encoded on its own. The separators
//! survive, so `owner/name` stays a two-segment path while a space inside a
//! segment becomes `%20`.
//!
//! File paths taken from a request must not contain `.` or `..` segments:
//! URL parsing would collapse them and move the request out of the
//! repository, so they are rejected instead of encoded.

use crate::core::error::{GatewayError, GatewayResult};
use std::borrow::Cow;

/// Percent-encode a single path segment (everything except `A-Z a-z 0-9 - _ . ~`)
pub fn encode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::encode(segment)
}

/// Encode a `/`-separated value segment by segment
pub fn encode_path(value: &str) -> String {
    value
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a decoded value contains a `.` or `..` path segment
pub fn has_dot_segment(value: &str) -> bool {
    value.split('/').any(|segment| segment == "." || segment == "..")
}

/// Encode a caller-supplied file path, rejecting dot segments
pub fn encode_file_path(value: &str) -> GatewayResult<String> {
    if has_dot_segment(value) {
        return Err(GatewayError::invalid_argument(
            "path must not contain '.' or '..' segments",
        ));
    }
    Ok(encode_path(value))
}

/// Encode a repository id such as `owner/name`
pub fn encode_repo_id(repo_id: &str) -> String {
    encode_path(repo_id)
}

/// Decode one percent-encoded inbound path segment
pub fn decode_segment(segment: &str) -> GatewayResult<String> {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .map_err(|_| {
            GatewayError::invalid_argument(format!("path segment '{}' is not valid UTF-8", segment))
        })
}
