//! Connector notifications.
//!
//! Every notification the connector raises is a [`ConnectorEvent`]
//! delivered over an [`EventBus`] owned by the connector instance.
//! Subscribers get an unbounded channel; closing the bus ends every
//! subscription.
//!
//! # Event Names
//!
//! | Event | Name |
//! |-------|------|
//! | [`ConnectorEvent::NetworkEvent`] | `NETWORK_EVENT` |
//! | [`ConnectorEvent::RequestAdded`] | `REQUEST_ADDED` |
//! | [`ConnectorEvent::Updating`] | `UPDATING_<FIELD>` |
//! | [`ConnectorEvent::Received`] | `RECEIVED_<FIELD>` |
//! | [`ConnectorEvent::StartedReceivingResponse`] | `STARTED_RECEIVING_RESPONSE` |
//! | [`ConnectorEvent::ResponseImageThumbnailDisplayed`] | `RESPONSE_IMAGE_THUMBNAIL_DISPLAYED` |
//! | [`ConnectorEvent::TargetWillNavigate`] | `TARGET_WILL_NAVIGATE` |
//! | [`ConnectorEvent::TargetDidNavigate`] | `TARGET_DID_NAVIGATE` |
//! | [`ConnectorEvent::TimelineEvent`] | `TIMELINE_EVENT` |

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use crate::host::FetchKind;
use crate::identifiers::ActorId;
use crate::protocol::TimingMarker;

// ============================================================================
// ConnectorEvent
// ============================================================================

/// Notification raised by the connector.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorEvent {
    /// A `networkEvent` arrived.
    NetworkEvent(ActorId),

    /// A request landed in the store.
    RequestAdded(ActorId),

    /// A sub-fetch was issued.
    Updating(FetchKind, ActorId),

    /// A sub-fetch result landed in the store.
    Received(FetchKind, ActorId),

    /// The status line of a response arrived.
    StartedReceivingResponse(ActorId),

    /// An image body was resolved into a data URI.
    ResponseImageThumbnailDisplayed(ActorId),

    /// The tab is about to navigate.
    TargetWillNavigate,

    /// The tab finished navigating.
    TargetDidNavigate,

    /// A document loading marker arrived.
    TimelineEvent(TimingMarker),
}

impl ConnectorEvent {
    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NetworkEvent(_) => "NETWORK_EVENT",
            Self::RequestAdded(_) => "REQUEST_ADDED",
            Self::Updating(kind, _) => updating_name(*kind),
            Self::Received(kind, _) => received_name(*kind),
            Self::StartedReceivingResponse(_) => "STARTED_RECEIVING_RESPONSE",
            Self::ResponseImageThumbnailDisplayed(_) => "RESPONSE_IMAGE_THUMBNAIL_DISPLAYED",
            Self::TargetWillNavigate => "TARGET_WILL_NAVIGATE",
            Self::TargetDidNavigate => "TARGET_DID_NAVIGATE",
            Self::TimelineEvent(_) => "TIMELINE_EVENT",
        }
    }

    /// Returns the request the event is about, if any.
    #[must_use]
    pub fn actor(&self) -> Option<&ActorId> {
        match self {
            Self::NetworkEvent(id)
            | Self::RequestAdded(id)
            | Self::Updating(_, id)
            | Self::Received(_, id)
            | Self::StartedReceivingResponse(id)
            | Self::ResponseImageThumbnailDisplayed(id) => Some(id),
            Self::TargetWillNavigate | Self::TargetDidNavigate | Self::TimelineEvent(_) => None,
        }
    }
}

const fn updating_name(kind: FetchKind) -> &'static str {
    match kind {
        FetchKind::RequestHeaders => "UPDATING_REQUEST_HEADERS",
        FetchKind::RequestCookies => "UPDATING_REQUEST_COOKIES",
        FetchKind::RequestPostData => "UPDATING_REQUEST_POST_DATA",
        FetchKind::SecurityInfo => "UPDATING_SECURITY_INFO",
        FetchKind::ResponseHeaders => "UPDATING_RESPONSE_HEADERS",
        FetchKind::ResponseCookies => "UPDATING_RESPONSE_COOKIES",
        FetchKind::ResponseContent => "UPDATING_RESPONSE_CONTENT",
        FetchKind::EventTimings => "UPDATING_EVENT_TIMINGS",
    }
}

const fn received_name(kind: FetchKind) -> &'static str {
    match kind {
        FetchKind::RequestHeaders => "RECEIVED_REQUEST_HEADERS",
        FetchKind::RequestCookies => "RECEIVED_REQUEST_COOKIES",
        FetchKind::RequestPostData => "RECEIVED_REQUEST_POST_DATA",
        FetchKind::SecurityInfo => "RECEIVED_SECURITY_INFO",
        FetchKind::ResponseHeaders => "RECEIVED_RESPONSE_HEADERS",
        FetchKind::ResponseCookies => "RECEIVED_RESPONSE_COOKIES",
        FetchKind::ResponseContent => "RECEIVED_RESPONSE_CONTENT",
        FetchKind::EventTimings => "RECEIVED_EVENT_TIMINGS",
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// Subscriber list for connector events.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ConnectorEvent>>>,
    closed: AtomicBool,
}

impl EventBus {
    /// Creates an open bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every future event.
    ///
    /// On a closed bus the receiver is already at its end.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConnectorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.closed.load(Ordering::SeqCst) {
            self.subscribers.lock().push(tx);
        }
        rx
    }

    /// Delivers `event` to every live subscriber.
    pub fn emit(&self, event: ConnectorEvent) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        trace!(event = event.name(), actor = ?event.actor(), "Connector event");
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drops every subscriber and ignores later events.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.lock().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
