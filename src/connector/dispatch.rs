//! Update dispatch.
//!
//! Every `networkEventUpdate` is classified by [`UpdateType`]:
//!
//! | Update | Inline patch | Sub-fetch |
//! |--------|--------------|-----------|
//! | `responseStart` | status line, remote address, head size | none |
//! | `securityInfo` | `securityState` | `getSecurityInfo` |
//! | `responseContent` | sizes, MIME type | `getResponseContent` |
//! | `eventTimings` | `totalTime` | `getEventTimings` |
//! | other known types | none | matching `get*` |
//! | unknown | none (counted) | none |
//!
//! Sub-fetches run as independent continuations. A failed fetch leaves its
//! fields absent and emits no `RECEIVED_*` event.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::Ordering;

use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::host::{FetchKind, HostClient};
use crate::identifiers::ActorId;
use crate::protocol::{
    CookiePayload, EventTimings, HeaderCollection, LongString, NetworkInfo, PostDataPayload,
    ResponseContent, SecurityInfoPayload, UpdateType,
};
use crate::request_utils::{
    fetch_cookies, fetch_headers, form_data_uri, headers_from_multipart_text,
    upload_headers_size,
};
use crate::store::RequestPatch;

use super::core::Inner;
use super::events::ConnectorEvent;

// ============================================================================
// Inline Patches
// ============================================================================

impl Inner {
    pub(super) fn on_network_event_update(self: &Arc<Self>, update: &UpdateType, info: &NetworkInfo) {
        if self.session().is_none() {
            return;
        }

        let id = &info.actor;
        trace!(actor = %id, update = %update, "Network event update");

        let inline = match update {
            UpdateType::ResponseStart => {
                let response = &info.response;
                let patch = RequestPatch {
                    http_version: response.http_version.clone(),
                    remote_address: response.remote_address.clone(),
                    remote_port: response.remote_port,
                    status: response.status.clone(),
                    status_text: response.status_text.clone(),
                    headers_size: response.headers_size,
                    ..Default::default()
                };
                self.patch_inline(id, patch);
                self.events
                    .emit(ConnectorEvent::StartedReceivingResponse(id.clone()));
                return;
            }
            UpdateType::SecurityInfo => RequestPatch {
                security_state: info.security_info.clone(),
                ..Default::default()
            },
            UpdateType::ResponseContent => RequestPatch {
                content_size: info.response.body_size,
                transferred_size: info.response.transferred_size,
                mime_type: info.response.content.mime_type.clone(),
                ..Default::default()
            },
            UpdateType::EventTimings => RequestPatch {
                total_time: info.total_time,
                ..Default::default()
            },
            UpdateType::Unknown(name) => {
                self.unknown_updates.fetch_add(1, Ordering::Relaxed);
                debug!(actor = %id, update = %name, "Ignoring unknown update type");
                return;
            }
            _ => RequestPatch::default(),
        };

        self.patch_inline(id, inline);

        if let Some(kind) = update.fetch_kind() {
            self.spawn_fetch(id.clone(), kind);
        }
    }

    /// Queues an inline patch; its outcome is not tracked.
    fn patch_inline(&self, id: &ActorId, patch: RequestPatch) {
        if patch.is_empty() {
            return;
        }
        drop(self.update(id, patch));
    }
}

// ============================================================================
// Sub-fetches
// ============================================================================

impl Inner {
    fn spawn_fetch(self: &Arc<Self>, id: ActorId, kind: FetchKind) {
        let Some(session) = self.session() else {
            return;
        };

        self.fields.begin(&id, kind);
        self.events.emit(ConnectorEvent::Updating(kind, id.clone()));

        let inner = Arc::clone(self);
        self.spawn(async move {
            let landed = match inner.fetch(session.host.as_ref(), &id, kind).await {
                Ok(landed) => landed,
                Err(e) if e.is_host_error() => {
                    warn!(actor = %id, fetch = kind.method(), error = %e, "Sub-fetch failed");
                    false
                }
                Err(e) => {
                    debug!(actor = %id, fetch = kind.method(), error = %e, "Sub-fetch abandoned");
                    false
                }
            };

            inner.fields.finish(&id, kind, landed);
            if landed {
                inner.events.emit(ConnectorEvent::Received(kind, id));
            }
        });
    }

    /// Issues one sub-fetch and patches its result.
    ///
    /// Returns whether the patch landed.
    async fn fetch(&self, host: &dyn HostClient, id: &ActorId, kind: FetchKind) -> Result<bool> {
        let patch = match kind {
            FetchKind::RequestHeaders => RequestPatch {
                request_headers: Some(fetch_headers(decode(host, id, kind).await?, host).await?),
                ..Default::default()
            },
            FetchKind::ResponseHeaders => RequestPatch {
                response_headers: Some(fetch_headers(decode(host, id, kind).await?, host).await?),
                ..Default::default()
            },
            FetchKind::RequestCookies => {
                let payload: CookiePayload = decode(host, id, kind).await?;
                let Some(cookies) = fetch_cookies(payload, host).await? else {
                    debug!(actor = %id, "Cookie payload is not a list");
                    return Ok(false);
                };
                RequestPatch {
                    request_cookies: Some(cookies),
                    ..Default::default()
                }
            }
            FetchKind::ResponseCookies => {
                let payload: CookiePayload = decode(host, id, kind).await?;
                let Some(cookies) = fetch_cookies(payload, host).await? else {
                    debug!(actor = %id, "Cookie payload is not a list");
                    return Ok(false);
                };
                RequestPatch {
                    response_cookies: Some(cookies),
                    ..Default::default()
                }
            }
            FetchKind::RequestPostData => {
                let mut payload: PostDataPayload = decode(host, id, kind).await?;
                let text = host.resolve_long_string(&payload.post_data.text).await?;

                let headers = headers_from_multipart_text(&text);
                let size = upload_headers_size(&headers);
                payload.post_data.text = LongString::Literal(text);

                RequestPatch {
                    request_post_data: Some(payload),
                    request_headers_from_upload_stream: Some(HeaderCollection::new(headers, size)),
                    ..Default::default()
                }
            }
            FetchKind::SecurityInfo => {
                let payload: SecurityInfoPayload = decode(host, id, kind).await?;
                RequestPatch {
                    security_info: Some(payload.security_info),
                    ..Default::default()
                }
            }
            FetchKind::ResponseContent => {
                let payload: ResponseContent = decode(host, id, kind).await?;
                return self.land_response_content(host, id, payload).await;
            }
            FetchKind::EventTimings => {
                let payload: EventTimings = decode(host, id, kind).await?;
                RequestPatch {
                    event_timings: Some(payload),
                    ..Default::default()
                }
            }
        };

        Ok(self.update(id, patch).wait().await)
    }

    /// Resolves a response body and adds a data URI for images.
    async fn land_response_content(
        &self,
        host: &dyn HostClient,
        id: &ActorId,
        mut payload: ResponseContent,
    ) -> Result<bool> {
        let text = host.resolve_long_string(&payload.content.text).await?;

        let mime_type = self
            .session()
            .and_then(|session| session.actions.get_request(id))
            .and_then(|record| record.mime_type)
            .unwrap_or_else(|| payload.content.mime_type.clone());

        let data_uri = mime_type
            .contains("image/")
            .then(|| form_data_uri(&mime_type, payload.content.encoding.as_deref(), &text));
        let is_image = data_uri.is_some();

        payload.content.text = LongString::Literal(text);
        let patch = RequestPatch {
            response_content: Some(payload),
            response_content_data_uri: data_uri,
            ..Default::default()
        };

        let landed = self.update(id, patch).wait().await;
        if landed && is_image {
            self.events
                .emit(ConnectorEvent::ResponseImageThumbnailDisplayed(id.clone()));
        }
        Ok(landed)
    }
}

/// Issues a fetch and decodes its payload.
///
/// A payload of the wrong shape is an [`Error::Protocol`].
async fn decode<T: DeserializeOwned>(
    host: &dyn HostClient,
    id: &ActorId,
    kind: FetchKind,
) -> Result<T> {
    let value = host.request(kind, id).await?;
    serde_json::from_value(value)
        .map_err(|e| Error::protocol(format!("{} reply for {id}: {e}", kind.method())))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use proptest::prelude::*;
    use serde_json::json;

    use super::decode;
    use crate::connector::{ConnectorEvent, FieldStatus, FirefoxConnector};
    use crate::error::{Error, Result};
    use crate::host::memory::MemoryHost;
    use crate::host::{FetchKind, HostEvent};
    use crate::identifiers::ActorId;
    use crate::prefs::Prefs;
    use crate::protocol::{EventTimings, NetworkInfo, UpdateType};
    use crate::store::{Monitor, RequestField};

    fn info(actor: &str) -> NetworkInfo {
        NetworkInfo::new(actor, "GET", "http://x", "2020-01-01T00:00:00Z")
    }

    fn update(info: &NetworkInfo, update_type: UpdateType) -> HostEvent {
        HostEvent::NetworkEventUpdate {
            update_type,
            network_info: info.clone(),
        }
    }

    fn script_all(host: &MemoryHost, actor: &str) {
        host.respond(
            actor,
            FetchKind::RequestHeaders,
            json!({ "headers": [{ "name": "Accept", "value": "*/*" }], "headersSize": 10 }),
        );
        host.respond(
            actor,
            FetchKind::ResponseHeaders,
            json!({ "headers": [{ "name": "Server", "value": "x" }], "headersSize": 8 }),
        );
        host.respond(
            actor,
            FetchKind::RequestCookies,
            json!({ "cookies": [{ "name": "a", "value": "1" }] }),
        );
        host.respond(
            actor,
            FetchKind::ResponseCookies,
            json!([{ "name": "b", "value": "2" }]),
        );
        host.respond(
            actor,
            FetchKind::RequestPostData,
            json!({ "postData": { "text": "a=1" }, "postDataDiscarded": false }),
        );
        host.respond(
            actor,
            FetchKind::SecurityInfo,
            json!({ "securityInfo": { "state": "secure" } }),
        );
        host.respond(
            actor,
            FetchKind::ResponseContent,
            json!({ "content": { "mimeType": "text/html", "text": "<p>" } }),
        );
        host.respond(
            actor,
            FetchKind::EventTimings,
            json!({ "timings": { "wait": 3 }, "totalTime": 3 }),
        );
    }

    async fn connect(host: &Arc<MemoryHost>) -> (FirefoxConnector, Arc<Monitor>) {
        let monitor = Arc::new(Monitor::new());
        monitor.spawn_flusher(Duration::from_millis(1));
        let connector = FirefoxConnector::connect(host.clone(), monitor.clone(), &Prefs::default())
            .await
            .expect("connect");
        (connector, monitor)
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ConnectorEvent>) -> Vec<ConnectorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Record fields each update type fills.
    fn fields_for(update: &UpdateType) -> Vec<RequestField> {
        match update {
            UpdateType::RequestHeaders => vec![RequestField::RequestHeaders],
            UpdateType::ResponseHeaders => vec![RequestField::ResponseHeaders],
            UpdateType::RequestCookies => vec![RequestField::RequestCookies],
            UpdateType::ResponseCookies => vec![RequestField::ResponseCookies],
            UpdateType::RequestPostData => vec![
                RequestField::RequestPostData,
                RequestField::RequestHeadersFromUploadStream,
            ],
            UpdateType::SecurityInfo => {
                vec![RequestField::SecurityState, RequestField::SecurityInfo]
            }
            UpdateType::ResponseStart => vec![RequestField::Status],
            UpdateType::ResponseContent => {
                vec![RequestField::ResponseContent, RequestField::MimeType]
            }
            UpdateType::EventTimings => vec![RequestField::EventTimings, RequestField::TotalTime],
            UpdateType::Unknown(_) => Vec::new(),
        }
    }

    fn all_updates() -> Vec<UpdateType> {
        vec![
            UpdateType::RequestHeaders,
            UpdateType::RequestCookies,
            UpdateType::RequestPostData,
            UpdateType::SecurityInfo,
            UpdateType::ResponseHeaders,
            UpdateType::ResponseCookies,
            UpdateType::ResponseStart,
            UpdateType::ResponseContent,
            UpdateType::EventTimings,
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_fields_independent_of_arrival_order(
            updates in proptest::sample::subsequence(all_updates(), 0..=9).prop_shuffle()
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");

            let populated = runtime.block_on(async {
                let host = Arc::new(MemoryHost::new());
                script_all(&host, "req1");
                let (connector, monitor) = connect(&host).await;

                let mut info = info("req1");
                info.security_info = Some("secure".into());
                info.total_time = Some(3.0);
                info.response.status = Some("200".into());
                info.response.content.mime_type = Some("text/html".into());

                host.emit(HostEvent::NetworkEvent(info.clone()));
                for update_type in &updates {
                    host.emit(update(&info, update_type.clone()));
                }
                connector.wait_idle().await;
                monitor.flush();

                monitor
                    .store()
                    .get(&ActorId::new("req1"))
                    .map(|record| record.populated_fields())
                    .unwrap_or_default()
            });

            let expected: BTreeSet<RequestField> = updates.iter().flat_map(fields_for).collect();
            let populated: BTreeSet<RequestField> = populated.into_iter().collect();
            prop_assert_eq!(populated, expected);
        }
    }

    #[tokio::test]
    async fn test_image_content_gets_data_uri_and_one_thumbnail() {
        let host = Arc::new(MemoryHost::new());
        let grip = host.add_long_string("iVBORw0KGgo=");
        host.respond(
            "req1",
            FetchKind::ResponseContent,
            json!({ "content": { "mimeType": "image/png", "text": grip, "encoding": "base64" } }),
        );

        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        let mut info = info("req1");
        info.response.content.mime_type = Some("image/png".into());
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::ResponseContent));
        connector.wait_idle().await;

        let record = monitor.store().get(&ActorId::new("req1")).expect("record");
        let content = record.response_content.expect("content");
        assert_eq!(content.content.text.as_literal(), Some("iVBORw0KGgo="));
        assert_eq!(
            record.response_content_data_uri.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );

        let thumbnails = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, ConnectorEvent::ResponseImageThumbnailDisplayed(_)))
            .count();
        assert_eq!(thumbnails, 1);
    }

    #[tokio::test]
    async fn test_non_image_content_has_no_data_uri() {
        let host = Arc::new(MemoryHost::new());
        script_all(&host, "req1");
        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::ResponseContent));
        connector.wait_idle().await;

        let record = monitor.store().get(&ActorId::new("req1")).expect("record");
        assert!(record.response_content.is_some());
        assert!(record.response_content_data_uri.is_none());
        assert!(
            !drain(&mut events)
                .iter()
                .any(|e| matches!(e, ConnectorEvent::ResponseImageThumbnailDisplayed(_)))
        );
    }

    #[tokio::test]
    async fn test_event_sequence_for_one_fetch() {
        let host = Arc::new(MemoryHost::new());
        script_all(&host, "req1");
        let (connector, _monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::RequestHeaders));
        connector.wait_idle().await;

        let names: Vec<_> = drain(&mut events).iter().map(ConnectorEvent::name).collect();
        assert_eq!(names[0], "NETWORK_EVENT");
        assert_eq!(names[1], "UPDATING_REQUEST_HEADERS");
        assert!(names.contains(&"REQUEST_ADDED"));
        assert_eq!(
            names
                .iter()
                .filter(|n| **n == "RECEIVED_REQUEST_HEADERS")
                .count(),
            1
        );
        assert_eq!(
            connector.field_status(&ActorId::new("req1"), FetchKind::RequestHeaders),
            FieldStatus::Present
        );
    }

    #[tokio::test]
    async fn test_long_string_headers_resolved() {
        let host = Arc::new(MemoryHost::new());
        let grip = host.add_long_string("c".repeat(4000));
        host.respond(
            "req1",
            FetchKind::RequestHeaders,
            json!({ "headers": [{ "name": "Cookie", "value": grip }], "headersSize": 4008 }),
        );
        let (connector, monitor) = connect(&host).await;

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::RequestHeaders));
        connector.wait_idle().await;

        let headers = monitor
            .store()
            .get(&ActorId::new("req1"))
            .and_then(|r| r.request_headers)
            .expect("headers");
        assert!(headers.is_resolved());
        assert_eq!(headers.headers[0].value.as_literal().map(str::len), Some(4000));
    }

    #[tokio::test]
    async fn test_post_data_upload_headers() {
        let host = Arc::new(MemoryHost::new());
        host.respond(
            "req1",
            FetchKind::RequestPostData,
            json!({ "postData": { "text": "Content-Disposition: form-data; name=\"a\"\r\n\r\nvalue" } }),
        );
        let (connector, monitor) = connect(&host).await;

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::RequestPostData));
        connector.wait_idle().await;

        let record = monitor.store().get(&ActorId::new("req1")).expect("record");
        let upload = record
            .request_headers_from_upload_stream
            .expect("upload headers");
        assert_eq!(upload.headers.len(), 1);
        assert_eq!(upload.headers_size, 40);
        assert!(
            record
                .request_post_data
                .is_some_and(|p| p.post_data.text.is_resolved())
        );
    }

    #[tokio::test]
    async fn test_cookie_shapes() {
        let host = Arc::new(MemoryHost::new());
        host.respond(
            "req1",
            FetchKind::RequestCookies,
            json!({ "cookies": [{ "name": "a", "value": "1" }] }),
        );
        host.respond("req1", FetchKind::ResponseCookies, json!({ "from": "req1" }));
        host.respond("req2", FetchKind::RequestCookies, json!([]));
        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        for actor in ["req1", "req2"] {
            let info = info(actor);
            host.emit(HostEvent::NetworkEvent(info.clone()));
            host.emit(update(&info, UpdateType::RequestCookies));
            if actor == "req1" {
                host.emit(update(&info, UpdateType::ResponseCookies));
            }
        }
        connector.wait_idle().await;

        let req1 = monitor.store().get(&ActorId::new("req1")).expect("req1");
        assert_eq!(req1.request_cookies.map(|c| c.len()), Some(1));
        assert!(req1.response_cookies.is_none());

        let req2 = monitor.store().get(&ActorId::new("req2")).expect("req2");
        assert_eq!(req2.request_cookies, Some(Vec::new()));

        let received: Vec<_> = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, ConnectorEvent::Received(FetchKind::ResponseCookies, _)))
            .collect();
        assert!(received.is_empty());
        assert_eq!(
            connector.field_status(&ActorId::new("req1"), FetchKind::ResponseCookies),
            FieldStatus::Absent
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_field_absent() {
        let host = Arc::new(MemoryHost::new());
        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::ResponseHeaders));
        connector.wait_idle().await;

        let record = monitor.store().get(&ActorId::new("req1")).expect("record");
        assert!(record.response_headers.is_none());
        assert!(
            !drain(&mut events)
                .iter()
                .any(|e| matches!(e, ConnectorEvent::Received(..)))
        );
        assert_eq!(
            connector.field_status(&ActorId::new("req1"), FetchKind::ResponseHeaders),
            FieldStatus::Absent
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_is_protocol_error() {
        let host = Arc::new(MemoryHost::new());
        host.respond("req1", FetchKind::EventTimings, json!({ "timings": "soon" }));

        let decoded: Result<EventTimings> =
            decode(host.as_ref(), &ActorId::new("req1"), FetchKind::EventTimings).await;
        let err = decoded.expect_err("malformed timings");
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.is_host_error());

        let (connector, monitor) = connect(&host).await;
        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::EventTimings));
        connector.wait_idle().await;

        let record = monitor.store().get(&ActorId::new("req1")).expect("record");
        assert!(record.event_timings.is_none());
        assert_eq!(
            connector.field_status(&ActorId::new("req1"), FetchKind::EventTimings),
            FieldStatus::Absent
        );
    }

    #[tokio::test]
    async fn test_update_for_unknown_request_is_dropped() {
        let host = Arc::new(MemoryHost::new());
        script_all(&host, "ghost");
        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        host.emit(update(&info("ghost"), UpdateType::EventTimings));
        connector.wait_idle().await;

        assert!(monitor.store().is_empty());
        assert!(
            !drain(&mut events)
                .iter()
                .any(|e| matches!(e, ConnectorEvent::Received(..)))
        );
    }

    #[tokio::test]
    async fn test_response_start_patches_inline() {
        let host = Arc::new(MemoryHost::new());
        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        let mut info = info("req1");
        info.response.http_version = Some("HTTP/2".into());
        info.response.status = Some("200".into());
        info.response.remote_port = Some(443);
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::ResponseStart));
        connector.wait_idle().await;
        monitor.flush();

        let record = monitor.store().get(&ActorId::new("req1")).expect("record");
        assert_eq!(record.status.as_deref(), Some("200"));
        assert_eq!(record.http_version.as_deref(), Some("HTTP/2"));
        assert_eq!(record.remote_port, Some(443));
        assert!(host.fetches().is_empty());
        assert!(
            drain(&mut events)
                .iter()
                .any(|e| matches!(e, ConnectorEvent::StartedReceivingResponse(_)))
        );
    }

    #[tokio::test]
    async fn test_unknown_update_is_counted() {
        let host = Arc::new(MemoryHost::new());
        let (connector, _monitor) = connect(&host).await;

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::Unknown("fancyNewThing".into())));
        host.emit(update(&info, UpdateType::parse("anotherOne")));
        connector.wait_idle().await;

        assert_eq!(connector.unknown_update_count(), 2);
        assert!(host.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let host = Arc::new(MemoryHost::new());
        script_all(&host, "req1");
        host.set_delay(FetchKind::ResponseContent, Duration::from_millis(50));
        let (connector, monitor) = connect(&host).await;
        let mut events = connector.subscribe();

        let info = info("req1");
        host.emit(HostEvent::NetworkEvent(info.clone()));
        host.emit(update(&info, UpdateType::ResponseContent));
        host.emit(update(&info, UpdateType::EventTimings));
        assert_eq!(
            connector.field_status(&ActorId::new("req1"), FetchKind::ResponseContent),
            FieldStatus::Fetching
        );
        connector.wait_idle().await;

        let received: Vec<FetchKind> = drain(&mut events)
            .iter()
            .filter_map(|e| match e {
                ConnectorEvent::Received(kind, _) => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(received, vec![FetchKind::EventTimings, FetchKind::ResponseContent]);
        assert!(
            monitor
                .store()
                .get(&ActorId::new("req1"))
                .is_some_and(|r| r.event_timings.is_some() && r.response_content.is_some())
        );
    }
}
