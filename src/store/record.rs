//! Request records and patches.
//!
//! A [`RequestRecord`] is created from the static fields of a
//! `networkEvent` ([`NewRequest`]) and then grows through
//! [`RequestPatch`]es. A patch only ever sets the fields it names; fields
//! it leaves as `None` keep their current value.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::DateTime;
use serde::Serialize;
use tracing::warn;

use crate::identifiers::ActorId;
use crate::protocol::{
    Cookie, EventTimings, HeaderCollection, NetworkInfo, PostDataPayload, RequestCause,
    ResponseContent, SecurityInfo,
};

// ============================================================================
// NewRequest
// ============================================================================

/// Static request metadata, fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    /// Start time as unix milliseconds.
    pub started_millis: i64,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Issued by `XMLHttpRequest`/`fetch`.
    #[serde(rename = "isXHR")]
    pub is_xhr: bool,
    /// What triggered the request.
    pub cause: RequestCause,
    /// Served from the HTTP cache.
    pub from_cache: bool,
    /// Served by a service worker.
    pub from_service_worker: bool,
}

impl NewRequest {
    /// Extracts the static fields of a `networkEvent` packet.
    ///
    /// An unparsable start time is recorded as 0.
    #[must_use]
    pub fn from_network_info(info: &NetworkInfo) -> Self {
        let started_millis = match DateTime::parse_from_rfc3339(&info.started_date_time) {
            Ok(time) => time.timestamp_millis(),
            Err(e) => {
                warn!(
                    actor = %info.actor,
                    started = %info.started_date_time,
                    error = %e,
                    "Unparsable startedDateTime"
                );
                0
            }
        };

        Self {
            started_millis,
            method: info.request.method.clone(),
            url: info.request.url.clone(),
            is_xhr: info.is_xhr,
            cause: info.cause.clone(),
            from_cache: info.from_cache,
            from_service_worker: info.from_service_worker,
        }
    }
}

// ============================================================================
// Patchable Fields
// ============================================================================

/// Declares the patchable fields once and derives the field enum, the
/// patch struct and its application from the list.
macro_rules! patchable_fields {
    ($( $(#[$doc:meta])* $field:ident : $ty:ty => $variant:ident, $name:literal; )+) => {
        /// Name of a patchable record field.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RequestField {
            $( $(#[$doc])* $variant, )+
        }

        impl RequestField {
            /// Returns the camelCase field name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }
        }

        /// A set of field values to merge into a record.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct RequestPatch {
            $( $(#[$doc])* pub $field: Option<$ty>, )+
        }

        impl RequestPatch {
            /// Names of the fields this patch sets, in declaration order.
            #[must_use]
            pub fn fields(&self) -> Vec<RequestField> {
                let mut fields = Vec::new();
                $( if self.$field.is_some() { fields.push(RequestField::$variant); } )+
                fields
            }

            /// Returns `true` if the patch sets nothing.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )+
            }

            /// Merges into `record`, overwriting only the fields set here.
            pub(crate) fn apply(self, record: &mut RequestRecord) {
                $( if let Some(value) = self.$field { record.$field = Some(value); } )+
            }
        }

        impl RequestRecord {
            /// Returns `true` if `field` has been populated.
            #[must_use]
            pub fn has(&self, field: RequestField) -> bool {
                match field {
                    $( RequestField::$variant => self.$field.is_some(), )+
                }
            }

            /// Names of all populated fields.
            #[must_use]
            pub fn populated_fields(&self) -> Vec<RequestField> {
                let mut fields = Vec::new();
                $( if self.$field.is_some() { fields.push(RequestField::$variant); } )+
                fields
            }
        }
    };
}

patchable_fields! {
    /// Resolved request headers.
    request_headers: HeaderCollection => RequestHeaders, "requestHeaders";
    /// Resolved request cookies.
    request_cookies: Vec<Cookie> => RequestCookies, "requestCookies";
    /// Resolved request body.
    request_post_data: PostDataPayload => RequestPostData, "requestPostData";
    /// Headers embedded in a multipart request body.
    request_headers_from_upload_stream: HeaderCollection => RequestHeadersFromUploadStream, "requestHeadersFromUploadStream";
    /// Form fields of a urlencoded request body.
    form_data_sections: Vec<String> => FormDataSections, "formDataSections";
    /// Security state summary.
    security_state: String => SecurityState, "securityState";
    /// TLS details.
    security_info: SecurityInfo => SecurityInfo, "securityInfo";
    /// Resolved response headers.
    response_headers: HeaderCollection => ResponseHeaders, "responseHeaders";
    /// Resolved response cookies.
    response_cookies: Vec<Cookie> => ResponseCookies, "responseCookies";
    /// Resolved response body.
    response_content: ResponseContent => ResponseContent, "responseContent";
    /// Data URI for image bodies.
    response_content_data_uri: String => ResponseContentDataUri, "responseContentDataUri";
    /// Timing breakdown.
    event_timings: EventTimings => EventTimings, "eventTimings";
    /// Protocol version.
    http_version: String => HttpVersion, "httpVersion";
    /// Remote IP.
    remote_address: String => RemoteAddress, "remoteAddress";
    /// Remote port.
    remote_port: u16 => RemotePort, "remotePort";
    /// Status code.
    status: String => Status, "status";
    /// Status text.
    status_text: String => StatusText, "statusText";
    /// Response head size.
    headers_size: u64 => HeadersSize, "headersSize";
    /// Decoded body size.
    content_size: u64 => ContentSize, "contentSize";
    /// Bytes on the wire.
    transferred_size: u64 => TransferredSize, "transferredSize";
    /// Response MIME type.
    mime_type: String => MimeType, "mimeType";
    /// Total duration.
    total_time: f64 => TotalTime, "totalTime";
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RequestRecord
// ============================================================================

/// Everything known about one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Host-assigned id.
    pub id: ActorId,
    /// Start time as unix milliseconds.
    pub started_millis: i64,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Issued by `XMLHttpRequest`/`fetch`.
    #[serde(rename = "isXHR")]
    pub is_xhr: bool,
    /// What triggered the request.
    pub cause: RequestCause,
    /// Served from the HTTP cache.
    pub from_cache: bool,
    /// Served by a service worker.
    pub from_service_worker: bool,

    /// Resolved request headers.
    pub request_headers: Option<HeaderCollection>,
    /// Resolved request cookies.
    pub request_cookies: Option<Vec<Cookie>>,
    /// Resolved request body.
    pub request_post_data: Option<PostDataPayload>,
    /// Headers embedded in a multipart request body.
    pub request_headers_from_upload_stream: Option<HeaderCollection>,
    /// Form fields of a urlencoded request body.
    pub form_data_sections: Option<Vec<String>>,
    /// Security state summary.
    pub security_state: Option<String>,
    /// TLS details.
    pub security_info: Option<SecurityInfo>,
    /// Resolved response headers.
    pub response_headers: Option<HeaderCollection>,
    /// Resolved response cookies.
    pub response_cookies: Option<Vec<Cookie>>,
    /// Resolved response body.
    pub response_content: Option<ResponseContent>,
    /// Data URI for image bodies.
    pub response_content_data_uri: Option<String>,
    /// Timing breakdown.
    pub event_timings: Option<EventTimings>,
    /// Protocol version.
    pub http_version: Option<String>,
    /// Remote IP.
    pub remote_address: Option<String>,
    /// Remote port.
    pub remote_port: Option<u16>,
    /// Status code.
    pub status: Option<String>,
    /// Status text.
    pub status_text: Option<String>,
    /// Response head size.
    pub headers_size: Option<u64>,
    /// Decoded body size.
    pub content_size: Option<u64>,
    /// Bytes on the wire.
    pub transferred_size: Option<u64>,
    /// Response MIME type.
    pub mime_type: Option<String>,
    /// Total duration.
    pub total_time: Option<f64>,
}

impl RequestRecord {
    /// Creates a record with only the static fields set.
    #[must_use]
    pub fn new(id: ActorId, fields: NewRequest) -> Self {
        Self {
            id,
            started_millis: fields.started_millis,
            method: fields.method,
            url: fields.url,
            is_xhr: fields.is_xhr,
            cause: fields.cause,
            from_cache: fields.from_cache,
            from_service_worker: fields.from_service_worker,
            request_headers: None,
            request_cookies: None,
            request_post_data: None,
            request_headers_from_upload_stream: None,
            form_data_sections: None,
            security_state: None,
            security_info: None,
            response_headers: None,
            response_cookies: None,
            response_content: None,
            response_content_data_uri: None,
            event_timings: None,
            http_version: None,
            remote_address: None,
            remote_port: None,
            status: None,
            status_text: None,
            headers_size: None,
            content_size: None,
            transferred_size: None,
            mime_type: None,
            total_time: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RequestRecord {
        let info = NetworkInfo::new("req1", "GET", "http://x", "2020-01-01T00:00:00Z");
        RequestRecord::new(ActorId::new("req1"), NewRequest::from_network_info(&info))
    }

    #[test]
    fn test_started_millis_parsed() {
        assert_eq!(record().started_millis, 1_577_836_800_000);
    }

    #[test]
    fn test_bad_date_is_zero() {
        let info = NetworkInfo::new("req1", "GET", "http://x", "yesterday");
        assert_eq!(NewRequest::from_network_info(&info).started_millis, 0);
    }

    #[test]
    fn test_patch_overwrites_only_named_fields() {
        let mut record = record();
        RequestPatch {
            status: Some("200".into()),
            mime_type: Some("text/html".into()),
            ..Default::default()
        }
        .apply(&mut record);

        RequestPatch {
            status: Some("304".into()),
            ..Default::default()
        }
        .apply(&mut record);

        assert_eq!(record.status.as_deref(), Some("304"));
        assert_eq!(record.mime_type.as_deref(), Some("text/html"));
        assert_eq!(
            record.populated_fields(),
            vec![RequestField::Status, RequestField::MimeType]
        );
    }

    #[test]
    fn test_patch_fields_and_empty() {
        let patch = RequestPatch {
            total_time: Some(12.5),
            security_state: Some("secure".into()),
            ..Default::default()
        };
        assert_eq!(
            patch.fields(),
            vec![RequestField::SecurityState, RequestField::TotalTime]
        );
        assert!(!patch.is_empty());
        assert!(RequestPatch::default().is_empty());
    }

    #[test]
    fn test_has_tracks_populated_fields() {
        let mut record = record();
        assert!(!record.has(RequestField::MimeType));
        record.mime_type = Some("image/png".into());
        assert!(record.has(RequestField::MimeType));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(
            RequestField::RequestHeadersFromUploadStream.as_str(),
            "requestHeadersFromUploadStream"
        );
        assert_eq!(RequestField::ResponseContentDataUri.to_string(), "responseContentDataUri");
    }
}
