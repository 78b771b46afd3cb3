//! RFC 2397 data URI formatting.
//!
//! <http://tools.ietf.org/html/rfc2397>

use base64::{engine::general_purpose::STANDARD, Engine as _};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Build `data:<mime>[;key=value]*;base64,<payload>` from a content type and a
/// fully read body.
///
/// The mime type is taken verbatim. Parameters such as `charset=` pass through
/// trimmed; anything after a `;` that is not a `key=value` pair is dropped.
pub fn format(content_type: &str, body: &[u8]) -> String {
    let encoded_len = base64::encoded_len(body.len(), true).unwrap_or_default();
    let mut uri =
        String::with_capacity(SCHEME.len() + content_type.len() + BASE64_MARKER.len() + encoded_len);

    uri.push_str(SCHEME);

    let mut parts = content_type.split(';');
    uri.push_str(parts.next().unwrap_or_default());

    for part in parts {
        if part.find('=').is_some_and(|at| at > 0) {
            uri.push(';');
            uri.push_str(part.trim());
        }
    }

    uri.push_str(BASE64_MARKER);
    STANDARD.encode_string(body, &mut uri);
    uri
}
