//! Network event packets.
//!
//! The host announces every request with a `networkEvent` packet carrying
//! a [`NetworkInfo`], then sends one `networkEventUpdate` per piece of data
//! that became available, tagged with an [`UpdateType`].
//!
//! # Format
//!
//! ```json
//! {
//!   "actor": "server1.conn0.netEvent42",
//!   "startedDateTime": "2020-01-01T00:00:00Z",
//!   "request": { "method": "GET", "url": "http://example.com/" },
//!   "isXHR": false,
//!   "cause": { "type": "document" },
//!   "fromCache": false,
//!   "fromServiceWorker": false,
//!   "response": { "status": "200", "content": { "mimeType": "text/html" } },
//!   "updates": ["requestHeaders", "responseStart"]
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::host::FetchKind;
use crate::identifiers::ActorId;

// ============================================================================
// NetworkInfo
// ============================================================================

/// Everything the host knows about a request at the time of a packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Actor tracking the request; used as the request id.
    pub actor: ActorId,

    /// RFC 3339 start time.
    #[serde(default)]
    pub started_date_time: String,

    /// Method and URL.
    #[serde(default)]
    pub request: RequestSummary,

    /// Whether the request came from `XMLHttpRequest`/`fetch`.
    #[serde(default, rename = "isXHR")]
    pub is_xhr: bool,

    /// What triggered the request.
    #[serde(default)]
    pub cause: RequestCause,

    /// Served from the HTTP cache.
    #[serde(default)]
    pub from_cache: bool,

    /// Served by a service worker.
    #[serde(default)]
    pub from_service_worker: bool,

    /// Response summary fields known so far.
    #[serde(default)]
    pub response: ResponseSummary,

    /// Security state (`"secure"`, `"insecure"`, `"broken"`, ...).
    #[serde(default)]
    pub security_info: Option<String>,

    /// Total duration in milliseconds.
    #[serde(default)]
    pub total_time: Option<f64>,

    /// Updates already received, for replay of buffered events.
    #[serde(default)]
    pub updates: Vec<UpdateType>,
}

impl NetworkInfo {
    /// Creates a packet with only the identifying fields.
    #[must_use]
    pub fn new(
        actor: impl Into<ActorId>,
        method: impl Into<String>,
        url: impl Into<String>,
        started_date_time: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            started_date_time: started_date_time.into(),
            request: RequestSummary {
                method: method.into(),
                url: url.into(),
            },
            is_xhr: false,
            cause: RequestCause::default(),
            from_cache: false,
            from_service_worker: false,
            response: ResponseSummary::default(),
            security_info: None,
            total_time: None,
            updates: Vec::new(),
        }
    }
}

/// Request line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    /// HTTP method.
    #[serde(default)]
    pub method: String,

    /// Request URL.
    #[serde(default)]
    pub url: String,
}

/// What triggered a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCause {
    /// Cause type (`document`, `script`, `img`, `xhr`, ...).
    #[serde(rename = "type", default)]
    pub cause_type: String,

    /// Document that issued the request.
    #[serde(default, rename = "loadingDocumentUri")]
    pub loading_document_uri: Option<String>,

    /// JS stack at the time the request was issued.
    #[serde(default)]
    pub stacktrace: Option<Value>,
}

/// Response fields the host sends inline with updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    /// Protocol version (`HTTP/1.1`, `HTTP/2`).
    #[serde(default)]
    pub http_version: Option<String>,

    /// Remote IP.
    #[serde(default)]
    pub remote_address: Option<String>,

    /// Remote port.
    #[serde(default)]
    pub remote_port: Option<u16>,

    /// Status code, kept as text.
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<String>,

    /// Status text.
    #[serde(default)]
    pub status_text: Option<String>,

    /// Size of the response head in bytes.
    #[serde(default)]
    pub headers_size: Option<u64>,

    /// Decoded body size in bytes.
    #[serde(default)]
    pub body_size: Option<u64>,

    /// Bytes transferred over the wire.
    #[serde(default)]
    pub transferred_size: Option<u64>,

    /// Content summary.
    #[serde(default)]
    pub content: ContentSummary,
}

/// Content summary sent inline with `responseContent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    /// Response MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Accepts the status as either `"200"` or `200`.
fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ============================================================================
// UpdateType
// ============================================================================

/// Kind of a `networkEventUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateType {
    /// Request headers are available.
    RequestHeaders,
    /// Request cookies are available.
    RequestCookies,
    /// Request body is available.
    RequestPostData,
    /// TLS state is available.
    SecurityInfo,
    /// Response headers are available.
    ResponseHeaders,
    /// Response cookies are available.
    ResponseCookies,
    /// Status line arrived.
    ResponseStart,
    /// Response body is complete.
    ResponseContent,
    /// Timing breakdown is available.
    EventTimings,
    /// Update type this client does not know.
    Unknown(String),
}

impl UpdateType {
    /// Parses the protocol name of an update.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "requestHeaders" => Self::RequestHeaders,
            "requestCookies" => Self::RequestCookies,
            "requestPostData" => Self::RequestPostData,
            "securityInfo" => Self::SecurityInfo,
            "responseHeaders" => Self::ResponseHeaders,
            "responseCookies" => Self::ResponseCookies,
            "responseStart" => Self::ResponseStart,
            "responseContent" => Self::ResponseContent,
            "eventTimings" => Self::EventTimings,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the protocol name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequestHeaders => "requestHeaders",
            Self::RequestCookies => "requestCookies",
            Self::RequestPostData => "requestPostData",
            Self::SecurityInfo => "securityInfo",
            Self::ResponseHeaders => "responseHeaders",
            Self::ResponseCookies => "responseCookies",
            Self::ResponseStart => "responseStart",
            Self::ResponseContent => "responseContent",
            Self::EventTimings => "eventTimings",
            Self::Unknown(name) => name,
        }
    }

    /// Returns the sub-fetch this update triggers, if any.
    ///
    /// `responseStart` carries everything inline.
    #[must_use]
    pub fn fetch_kind(&self) -> Option<FetchKind> {
        match self {
            Self::RequestHeaders => Some(FetchKind::RequestHeaders),
            Self::RequestCookies => Some(FetchKind::RequestCookies),
            Self::RequestPostData => Some(FetchKind::RequestPostData),
            Self::SecurityInfo => Some(FetchKind::SecurityInfo),
            Self::ResponseHeaders => Some(FetchKind::ResponseHeaders),
            Self::ResponseCookies => Some(FetchKind::ResponseCookies),
            Self::ResponseContent => Some(FetchKind::ResponseContent),
            Self::EventTimings => Some(FetchKind::EventTimings),
            Self::ResponseStart | Self::Unknown(_) => None,
        }
    }
}

impl From<String> for UpdateType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<UpdateType> for String {
    fn from(value: UpdateType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimingMarker
// ============================================================================

/// Document loading marker sent by the timeline actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingMarker {
    /// Marker name (`document::DOMContentLoaded`, `document::Load`).
    pub name: String,

    /// Wall clock time of the marker in milliseconds.
    pub unix_time: f64,
}

impl TimingMarker {
    /// Marker name for `DOMContentLoaded`.
    pub const DOM_CONTENT_LOADED: &'static str = "document::DOMContentLoaded";

    /// Marker name for `load`.
    pub const LOAD: &'static str = "document::Load";

    /// Creates a marker.
    #[must_use]
    pub fn new(name: impl Into<String>, unix_time: f64) -> Self {
        Self {
            name: name.into(),
            unix_time,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_info_parsing() {
        let json_str = r#"{
            "actor": "server1.conn0.netEvent42",
            "startedDateTime": "2020-01-01T00:00:00Z",
            "request": { "method": "POST", "url": "http://example.com/form" },
            "isXHR": true,
            "cause": { "type": "xhr", "loadingDocumentUri": "http://example.com/" },
            "fromCache": false,
            "fromServiceWorker": true,
            "response": {
                "httpVersion": "HTTP/1.1",
                "status": 404,
                "statusText": "Not Found",
                "bodySize": 12,
                "content": { "mimeType": "text/plain" }
            },
            "updates": ["requestHeaders", "fancyNewThing"]
        }"#;

        let info: NetworkInfo = serde_json::from_str(json_str).expect("parse");
        assert_eq!(info.actor.as_str(), "server1.conn0.netEvent42");
        assert_eq!(info.request.method, "POST");
        assert!(info.is_xhr);
        assert!(info.from_service_worker);
        assert_eq!(info.cause.cause_type, "xhr");
        assert_eq!(info.response.status.as_deref(), Some("404"));
        assert_eq!(info.response.body_size, Some(12));
        assert_eq!(info.response.content.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(
            info.updates,
            vec![
                UpdateType::RequestHeaders,
                UpdateType::Unknown("fancyNewThing".into())
            ]
        );
    }

    #[test]
    fn test_minimal_network_info() {
        let info: NetworkInfo = serde_json::from_str(r#"{"actor":"a1"}"#).expect("parse");
        assert_eq!(info.request, RequestSummary::default());
        assert!(info.updates.is_empty());
        assert_eq!(info.response.status, None);
    }

    #[test]
    fn test_update_type_names() {
        for name in [
            "requestHeaders",
            "requestCookies",
            "requestPostData",
            "securityInfo",
            "responseHeaders",
            "responseCookies",
            "responseStart",
            "responseContent",
            "eventTimings",
        ] {
            let update = UpdateType::parse(name);
            assert!(!matches!(update, UpdateType::Unknown(_)), "{name}");
            assert_eq!(update.as_str(), name);
        }
    }

    #[test]
    fn test_update_fetch_kind() {
        assert_eq!(UpdateType::ResponseStart.fetch_kind(), None);
        assert_eq!(UpdateType::Unknown("x".into()).fetch_kind(), None);
        assert_eq!(
            UpdateType::ResponseContent.fetch_kind(),
            Some(FetchKind::ResponseContent)
        );
    }

    #[test]
    fn test_timing_marker_parsing() {
        let marker: TimingMarker =
            serde_json::from_str(r#"{"name":"document::Load","unixTime":1500.5}"#).expect("parse");
        assert_eq!(marker.name, TimingMarker::LOAD);
        assert_eq!(marker.unix_time, 1500.5);
    }
}
