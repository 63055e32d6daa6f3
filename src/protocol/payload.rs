//! Sub-fetch payloads.
//!
//! Each [`FetchKind`](crate::host::FetchKind) resolves with one of these
//! shapes. The host sends them as JSON; the dispatcher decodes them with
//! `serde_json::from_value`.
//!
//! | Fetch | Payload | Stored as |
//! |-------|---------|-----------|
//! | `getRequestHeaders` / `getResponseHeaders` | [`HeaderCollection`] | same |
//! | `getRequestCookies` / `getResponseCookies` | [`CookiePayload`] | `Vec<Cookie>` |
//! | `getRequestPostData` | [`PostDataPayload`] | same |
//! | `getSecurityInfo` | [`SecurityInfoPayload`] | [`SecurityInfo`] |
//! | `getResponseContent` | [`ResponseContent`] | same |
//! | `getEventTimings` | [`EventTimings`] | same |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::LongString;

// ============================================================================
// Headers
// ============================================================================

/// One HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as sent.
    pub name: String,

    /// Header value, possibly a long string grip.
    pub value: LongString,
}

impl Header {
    /// Creates a header with a literal value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<LongString>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered header list plus the size of the header block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCollection {
    /// Headers in wire order.
    #[serde(default)]
    pub headers: Vec<Header>,

    /// Size of the header block in bytes.
    #[serde(default)]
    pub headers_size: u64,

    /// Raw header block, when the host provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_headers: Option<String>,
}

impl HeaderCollection {
    /// Creates a collection from headers and their block size.
    #[must_use]
    pub fn new(headers: Vec<Header>, headers_size: u64) -> Self {
        Self {
            headers,
            headers_size,
            raw_headers: None,
        }
    }

    /// Returns `true` if no value is still a grip.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.headers.iter().all(|h| h.value.is_resolved())
    }

    /// Finds a header value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LongString> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| &h.value)
    }
}

// ============================================================================
// Cookies
// ============================================================================

/// One cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,

    /// Cookie value, possibly a long string grip.
    pub value: LongString,

    /// Remaining attributes (`path`, `domain`, `expires`, `httpOnly`, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Cookie {
    /// Creates a cookie with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<LongString>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: Map::new(),
        }
    }
}

/// Cookie payload as sent by the host.
///
/// Hosts have used both a `{cookies: [...]}` wrapper and a bare array.
/// Anything else carries no cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CookiePayload {
    /// `{ "cookies": [...] }`
    Wrapped {
        /// The cookie list.
        cookies: Vec<Cookie>,
    },

    /// `[...]`
    Bare(Vec<Cookie>),

    /// Not a cookie list.
    Other(Value),
}

impl CookiePayload {
    /// Normalizes to a cookie list, or `None` if the payload is not a list.
    #[must_use]
    pub fn into_cookies(self) -> Option<Vec<Cookie>> {
        match self {
            Self::Wrapped { cookies } | Self::Bare(cookies) => Some(cookies),
            Self::Other(_) => None,
        }
    }
}

// ============================================================================
// POST Data
// ============================================================================

/// Request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostData {
    /// Body text, possibly a long string grip.
    #[serde(default)]
    pub text: LongString,
}

/// `getRequestPostData` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDataPayload {
    /// The body.
    #[serde(default)]
    pub post_data: PostData,

    /// Host dropped the body (too large or disabled).
    #[serde(default)]
    pub post_data_discarded: bool,
}

// ============================================================================
// Security
// ============================================================================

/// TLS details of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityInfo {
    /// Overall state (`secure`, `insecure`, `weak`, `broken`).
    #[serde(default)]
    pub state: String,

    /// Protocol version, cipher suite, certificate and other details.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// `getSecurityInfo` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfoPayload {
    /// TLS details.
    #[serde(default)]
    pub security_info: SecurityInfo,
}

// ============================================================================
// Response Content
// ============================================================================

/// Response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody {
    /// MIME type reported with the body.
    #[serde(default)]
    pub mime_type: String,

    /// Body text, possibly a long string grip.
    #[serde(default)]
    pub text: LongString,

    /// Decoded size in bytes.
    #[serde(default)]
    pub size: Option<u64>,

    /// Transfer encoding of `text` (`base64` for binary bodies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// `getResponseContent` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseContent {
    /// The body.
    #[serde(default)]
    pub content: ContentBody,

    /// Host dropped the body.
    #[serde(default)]
    pub content_discarded: bool,
}

// ============================================================================
// Event Timings
// ============================================================================

/// Phase durations in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Queueing.
    #[serde(default)]
    pub blocked: f64,
    /// DNS resolution.
    #[serde(default)]
    pub dns: f64,
    /// TCP connect.
    #[serde(default)]
    pub connect: f64,
    /// TLS handshake.
    #[serde(default)]
    pub ssl: f64,
    /// Sending the request.
    #[serde(default)]
    pub send: f64,
    /// Waiting for the first byte.
    #[serde(default)]
    pub wait: f64,
    /// Receiving the response.
    #[serde(default)]
    pub receive: f64,
}

/// `getEventTimings` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTimings {
    /// Phase durations.
    #[serde(default)]
    pub timings: Timings,

    /// Sum of all phases.
    #[serde(default)]
    pub total_time: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_header_collection_parsing() {
        let payload = json!({
            "from": "netEvent1",
            "headers": [
                { "name": "Host", "value": "example.com" },
                { "name": "Cookie", "value": { "type": "longString", "actor": "ls1", "length": 10000, "initial": "a=" } }
            ],
            "headersSize": 321,
            "rawHeaders": "GET / HTTP/1.1"
        });

        let headers: HeaderCollection = serde_json::from_value(payload).expect("parse");
        assert_eq!(headers.headers.len(), 2);
        assert_eq!(headers.headers_size, 321);
        assert!(!headers.is_resolved());
        assert_eq!(headers.get("host"), Some(&LongString::from("example.com")));
    }

    #[test]
    fn test_cookie_payload_shapes() {
        let wrapped: CookiePayload =
            serde_json::from_value(json!({"from": "a", "cookies": [{"name": "a", "value": "1"}]}))
                .expect("parse");
        let bare: CookiePayload =
            serde_json::from_value(json!([{"name": "a", "value": "1", "path": "/"}])).expect("parse");
        let other: CookiePayload = serde_json::from_value(json!({"from": "a"})).expect("parse");
        let scalar: CookiePayload = serde_json::from_value(json!(42)).expect("parse");

        assert_eq!(wrapped.into_cookies().map(|c| c.len()), Some(1));
        let bare = bare.into_cookies().expect("cookies");
        assert_eq!(bare[0].attributes.get("path"), Some(&json!("/")));
        assert!(other.into_cookies().is_none());
        assert!(scalar.into_cookies().is_none());
    }

    #[test]
    fn test_response_content_parsing() {
        let payload = json!({
            "from": "netEvent1",
            "content": { "mimeType": "image/png", "text": "iVBORw0KGgo=", "size": 8, "encoding": "base64" },
            "contentDiscarded": false
        });

        let content: ResponseContent = serde_json::from_value(payload).expect("parse");
        assert_eq!(content.content.mime_type, "image/png");
        assert_eq!(content.content.encoding.as_deref(), Some("base64"));
    }

    #[test]
    fn test_security_info_keeps_details() {
        let payload = json!({
            "securityInfo": { "state": "secure", "protocolVersion": "TLSv1.3" }
        });

        let info: SecurityInfoPayload = serde_json::from_value(payload).expect("parse");
        assert_eq!(info.security_info.state, "secure");
        assert_eq!(
            info.security_info.details.get("protocolVersion"),
            Some(&json!("TLSv1.3"))
        );
    }
}
