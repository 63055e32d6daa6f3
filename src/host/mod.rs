//! Host client seam.
//!
//! The connector never talks to a socket itself. Everything it needs from
//! the remote debugging session goes through [`HostClient`]: event
//! subscriptions, the eight sub-fetches, long string resolution, tab
//! reconfiguration and capability ("trait") queries.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   subscribe / events    ┌──────────────────┐
//! │  FirefoxConnector│◄───────────────────────►│   HostClient     │
//! │                  │   request(kind, actor)  │  (tab target +   │
//! │                  │   long_string_text      │   console actor) │
//! └──────────────────┘   reconfigure           └──────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `memory` | In-process host with scripted payloads |

// ============================================================================
// Submodules
// ============================================================================

/// In-process host client.
pub mod memory;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{ActorId, SubscriptionId};
use crate::protocol::{LongString, LongStringGrip, NetworkInfo, TimingMarker, UpdateType};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called for each matching event, in delivery order. Handlers may call
/// back into the host (including `unsubscribe`), so hosts must not hold
/// their registry lock while invoking them.
pub type HostEventHandler = Arc<dyn Fn(&HostEvent) + Send + Sync>;

// ============================================================================
// HostEvent
// ============================================================================

/// Notification delivered by the host.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A request started.
    NetworkEvent(NetworkInfo),

    /// More data is available for a request.
    NetworkEventUpdate {
        /// Which data.
        update_type: UpdateType,
        /// Request state at the time of the update.
        network_info: NetworkInfo,
    },

    /// The tab is about to navigate.
    WillNavigate {
        /// Destination URL.
        url: String,
    },

    /// The tab finished navigating.
    Navigate {
        /// New document URL.
        url: String,
    },

    /// The tab target went away.
    Close,

    /// Document loading marker from the timeline actor.
    DocLoading(TimingMarker),
}

impl HostEvent {
    /// Returns the subscription kind this event is delivered under.
    #[must_use]
    pub fn kind(&self) -> HostEventKind {
        match self {
            Self::NetworkEvent(_) => HostEventKind::NetworkEvent,
            Self::NetworkEventUpdate { .. } => HostEventKind::NetworkEventUpdate,
            Self::WillNavigate { .. } => HostEventKind::WillNavigate,
            Self::Navigate { .. } => HostEventKind::Navigate,
            Self::Close => HostEventKind::Close,
            Self::DocLoading(_) => HostEventKind::DocLoading,
        }
    }
}

/// Named event stream a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    /// `networkEvent` on the console actor.
    NetworkEvent,
    /// `networkEventUpdate` on the console actor.
    NetworkEventUpdate,
    /// `will-navigate` on the tab target.
    WillNavigate,
    /// `navigate` on the tab target.
    Navigate,
    /// `close` on the tab target.
    Close,
    /// `doc-loading` on the timeline actor.
    DocLoading,
}

impl HostEventKind {
    /// Returns the protocol event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkEvent => "networkEvent",
            Self::NetworkEventUpdate => "networkEventUpdate",
            Self::WillNavigate => "will-navigate",
            Self::Navigate => "navigate",
            Self::Close => "close",
            Self::DocLoading => "doc-loading",
        }
    }
}

// ============================================================================
// FetchKind
// ============================================================================

/// One of the asynchronous sub-fetches for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchKind {
    /// `getRequestHeaders`
    RequestHeaders,
    /// `getRequestCookies`
    RequestCookies,
    /// `getRequestPostData`
    RequestPostData,
    /// `getSecurityInfo`
    SecurityInfo,
    /// `getResponseHeaders`
    ResponseHeaders,
    /// `getResponseCookies`
    ResponseCookies,
    /// `getResponseContent`
    ResponseContent,
    /// `getEventTimings`
    EventTimings,
}

impl FetchKind {
    /// Number of kinds.
    pub const COUNT: usize = 8;

    /// All kinds, in index order.
    pub const ALL: [FetchKind; Self::COUNT] = [
        Self::RequestHeaders,
        Self::RequestCookies,
        Self::RequestPostData,
        Self::SecurityInfo,
        Self::ResponseHeaders,
        Self::ResponseCookies,
        Self::ResponseContent,
        Self::EventTimings,
    ];

    /// Stable index into per-kind tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the protocol method name.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::RequestHeaders => "getRequestHeaders",
            Self::RequestCookies => "getRequestCookies",
            Self::RequestPostData => "getRequestPostData",
            Self::SecurityInfo => "getSecurityInfo",
            Self::ResponseHeaders => "getResponseHeaders",
            Self::ResponseCookies => "getResponseCookies",
            Self::ResponseContent => "getResponseContent",
            Self::EventTimings => "getEventTimings",
        }
    }

    /// Returns the record field name the fetch fills.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestHeaders => "requestHeaders",
            Self::RequestCookies => "requestCookies",
            Self::RequestPostData => "requestPostData",
            Self::SecurityInfo => "securityInfo",
            Self::ResponseHeaders => "responseHeaders",
            Self::ResponseCookies => "responseCookies",
            Self::ResponseContent => "responseContent",
            Self::EventTimings => "eventTimings",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Capability
// ============================================================================

/// Optional host feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The console actor can replay edited requests.
    CustomNetworkRequest,
    /// Responses report their transferred (compressed) size.
    TransferredResponseSize,
    /// The tab can be reconfigured (cache, reload).
    Reconfigure,
    /// The timeline actor emits document loading markers.
    DocumentLoadingMarkers,
}

impl Capability {
    /// Returns the protocol trait name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomNetworkRequest => "customNetworkRequest",
            Self::TransferredResponseSize => "transferredResponseSize",
            Self::Reconfigure => "reconfigure",
            Self::DocumentLoadingMarkers => "documentLoadingMarkers",
        }
    }
}

// ============================================================================
// ReconfigureOptions
// ============================================================================

/// Options for a tab `reconfigure` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconfigureOptions {
    /// Cache override; `None` leaves the current setting alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_disabled: Option<bool>,

    /// Reload the page once reconfigured.
    #[serde(default)]
    pub perform_reload: bool,
}

impl ReconfigureOptions {
    /// Reload without touching the cache setting.
    #[inline]
    #[must_use]
    pub const fn reload() -> Self {
        Self {
            cache_disabled: None,
            perform_reload: true,
        }
    }

    /// Sets the cache override.
    #[inline]
    #[must_use]
    pub const fn with_cache_disabled(mut self, disabled: bool) -> Self {
        self.cache_disabled = Some(disabled);
        self
    }
}

// ============================================================================
// HostClient
// ============================================================================

/// Interface to the remote debugging session.
#[async_trait]
pub trait HostClient: Send + Sync {
    /// Registers a handler for one event stream.
    fn subscribe(&self, kind: HostEventKind, handler: HostEventHandler) -> SubscriptionId;

    /// Removes a handler. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Issues one sub-fetch and returns its raw payload.
    ///
    /// # Errors
    ///
    /// Fails if the host does not know `actor` or the fetch is rejected.
    async fn request(&self, kind: FetchKind, actor: &ActorId) -> Result<Value>;

    /// Fetches the full text behind a long string grip.
    async fn long_string_text(&self, grip: &LongStringGrip) -> Result<String>;

    /// Resolves a value that may be a long string grip.
    ///
    /// Literals come back unchanged.
    async fn resolve_long_string(&self, value: &LongString) -> Result<String> {
        match value {
            LongString::Literal(text) => Ok(text.clone()),
            LongString::Reference(grip) => self.long_string_text(grip).await,
        }
    }

    /// Network events that happened before the client attached.
    ///
    /// Each entry carries the updates already seen in `updates`.
    fn buffered_events(&self) -> Vec<NetworkInfo>;

    /// Reports whether the host supports an optional feature.
    fn has_capability(&self, capability: Capability) -> bool;

    /// Reconfigures the tab.
    async fn reconfigure(&self, options: ReconfigureOptions) -> Result<()>;

    /// Starts the timeline actor with document loading markers.
    async fn start_timeline(&self) -> Result<()> {
        Ok(())
    }

    /// Stops the timeline actor.
    async fn stop_timeline(&self) {}
}

// ============================================================================
// Tests
// ============================================================================
