//! URL encoding helpers
//!
//! Request fields are encoded as `application/x-www-form-urlencoded` (the same
//! bytes serve as a query string for GET and as a body for POST). Namespace
//! prefixes are encoded as a single path segment.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::SesameResult;

/// Characters escaped in a path segment: everything except the RFC 3986 unreserved set
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Ordered list of request fields. Keys may repeat (e.g. `context`).
pub type Fields = Vec<(String, String)>;

/// Encode fields as `k1=v1&k2=v2`, preserving order and repeated keys.
/// Spaces become `+`.
pub fn encode_fields(fields: &[(String, String)]) -> SesameResult<String> {
    Ok(serde_urlencoded::to_string(fields)?)
}

/// Append encoded fields to a URL. No `?` is added when there are no fields.
pub fn with_query(url: &str, fields: &[(String, String)]) -> SesameResult<String> {
    if fields.is_empty() {
        Ok(url.to_string())
    } else {
        Ok(format!("{}?{}", url, encode_fields(fields)?))
    }
}

/// Percent-encode a value for use as one path segment
pub fn encode_path_segment(s: &str) -> String {
    utf8_percent_encode(s, PATH_SEGMENT).to_string()
}
