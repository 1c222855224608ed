#![forbid(unsafe_code)]

//! Request target construction.
//!
//! The token always occupies exactly one path segment: characters that would
//! split or terminate the path (`/`, `?`, `#`, `%`, whitespace) are
//! percent-encoded. Letters, digits and DOM key names pass through unchanged,
//! so `/keypress/A?key-A=` and `/keypress/Delete` are emitted verbatim.

use url::form_urlencoded;

use crate::config::ForwarderConfig;
use crate::error;
use crate::key::{PathStyle, normalize};

/// Query parameter name prefix used by [`PathStyle::QueryEcho`].
pub const QUERY_KEY_PREFIX: &str = "key-";

/// One outbound keypress request (always a GET, never with a body).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeypressRequest {
    /// Normalized key token, before encoding.
    pub token: String,
    /// Request target: absolute path plus optional query.
    pub path: String,
}

impl KeypressRequest {
    /// Build the request for a raw DOM key identifier.
    pub fn build(config: &ForwarderConfig, key: &str) -> error::Result<Self> {
        let token = normalize(config.style, key)?;
        let path = target_for(&config.prefix, config.style, &token);
        Ok(Self { token, path })
    }

    #[must_use]
    pub const fn method(&self) -> &'static str {
        "GET"
    }
}

fn target_for(prefix: &str, style: PathStyle, token: &str) -> String {
    let segment = encode_segment(token);
    let mut path = format!("{prefix}/{segment}");
    if style.has_query() {
        let name: String =
            form_urlencoded::byte_serialize(format!("{QUERY_KEY_PREFIX}{token}").as_bytes())
                .collect();
        path.push('?');
        path.push_str(&name);
        path.push('=');
    }
    path
}

/// Percent-encode `token` as a single path segment.
///
/// Form encoding writes spaces as `+`, which a path would keep literally, so
/// those are rewritten to `%20`. A literal `+` in the token is already `%2B`.
fn encode_segment(token: &str) -> String {
    form_urlencoded::byte_serialize(token.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}
