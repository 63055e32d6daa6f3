//! In-process host client.
//!
//! [`MemoryHost`] implements [`HostClient`] without a remote session:
//! payloads, long strings and capabilities are scripted up front and
//! events are pushed with [`MemoryHost::emit`]. It is used to replay
//! captured traffic through a connector and in tests.
//!
//! # Example
//!
//! ```ignore
//! let host = Arc::new(MemoryHost::new().with_capability(Capability::Reconfigure));
//! host.respond("netEvent1", FetchKind::RequestHeaders, json!({ "headers": [], "headersSize": 0 }));
//!
//! let connector = FirefoxConnector::connect(host.clone(), monitor, &Prefs::default()).await?;
//! host.emit(HostEvent::NetworkEvent(info));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::{ActorId, SubscriptionId};
use crate::protocol::{LongStringGrip, NetworkInfo};

use super::{
    Capability, FetchKind, HostClient, HostEvent, HostEventHandler, HostEventKind,
    ReconfigureOptions,
};

// ============================================================================
// Types
// ============================================================================

/// Characters of a long string sent inline with its grip.
const LONG_STRING_INITIAL_LENGTH: usize = 1000;

/// Registered handler with its stream.
type Registration = (SubscriptionId, HostEventKind, HostEventHandler);

// ============================================================================
// MemoryHost
// ============================================================================

/// Scripted in-process host.
///
/// # Thread Safety
///
/// `MemoryHost` is `Send + Sync`. Handlers are invoked outside the
/// registry lock, so they may subscribe or unsubscribe re-entrantly.
#[derive(Default)]
pub struct MemoryHost {
    /// Event handlers in registration order.
    handlers: Mutex<Vec<Registration>>,
    /// Payloads by request and fetch kind.
    payloads: Mutex<FxHashMap<(ActorId, FetchKind), Value>>,
    /// Artificial latency per fetch kind.
    delays: Mutex<FxHashMap<FetchKind, Duration>>,
    /// Long string texts by grip actor.
    long_strings: Mutex<FxHashMap<String, String>>,
    /// Counter for generated grip actors.
    next_long_string: AtomicU64,
    /// Supported capabilities.
    capabilities: RwLock<FxHashSet<Capability>>,
    /// Events that happened before attach.
    buffered: Mutex<Vec<NetworkInfo>>,
    /// Every fetch issued, in order.
    fetch_log: Mutex<Vec<(FetchKind, ActorId)>>,
    /// Every reconfigure call, in order.
    reconfigures: Mutex<Vec<ReconfigureOptions>>,
    /// Emit a navigation pair when a reconfigure asks for a reload.
    navigate_on_reload: AtomicBool,
    /// Timeline actor state.
    timeline_running: AtomicBool,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("handlers", &self.handlers.lock().len())
            .field("payloads", &self.payloads.lock().len())
            .field("buffered", &self.buffered.lock().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// MemoryHost - Builder
// ============================================================================

impl MemoryHost {
    /// Creates an empty host with no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a supported capability.
    #[must_use]
    pub fn with_capability(self, capability: Capability) -> Self {
        self.capabilities.write().insert(capability);
        self
    }

    /// Emits `will-navigate` then `navigate` whenever a reconfigure reloads.
    #[must_use]
    pub fn with_navigate_on_reload(self) -> Self {
        self.navigate_on_reload.store(true, Ordering::SeqCst);
        self
    }
}

// ============================================================================
// MemoryHost - Scripting
// ============================================================================

impl MemoryHost {
    /// Sets the payload returned for a fetch.
    pub fn respond(&self, actor: impl Into<ActorId>, kind: FetchKind, payload: Value) {
        self.payloads.lock().insert((actor.into(), kind), payload);
    }

    /// Delays every fetch of one kind.
    pub fn set_delay(&self, kind: FetchKind, delay: Duration) {
        self.delays.lock().insert(kind, delay);
    }

    /// Stores a long string and returns a grip for it.
    pub fn add_long_string(&self, text: impl Into<String>) -> LongStringGrip {
        let text = text.into();
        let n = self.next_long_string.fetch_add(1, Ordering::Relaxed);
        let actor = format!("conn0.longString{n}");
        let length = text.chars().count() as u64;
        let initial: String = text.chars().take(LONG_STRING_INITIAL_LENGTH).collect();
        let grip = LongStringGrip::new(actor.clone(), length, initial);
        self.long_strings.lock().insert(actor, text);
        grip
    }

    /// Queues an event for replay at attach time.
    pub fn buffer(&self, info: NetworkInfo) {
        self.buffered.lock().push(info);
    }

    /// Delivers an event to every handler of its stream.
    pub fn emit(&self, event: HostEvent) {
        let kind = event.kind();
        let targets: Vec<HostEventHandler> = self
            .handlers
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, handler)| HostEventHandler::clone(handler))
            .collect();

        trace!(event = kind.as_str(), handlers = targets.len(), "Emitting host event");

        for handler in targets {
            handler(&event);
        }
    }
}

// ============================================================================
// MemoryHost - Inspection
// ============================================================================

impl MemoryHost {
    /// Number of live handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Number of live handlers for one stream.
    #[must_use]
    pub fn subscriber_count_for(&self, kind: HostEventKind) -> usize {
        self.handlers
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Fetches issued so far.
    #[must_use]
    pub fn fetches(&self) -> Vec<(FetchKind, ActorId)> {
        self.fetch_log.lock().clone()
    }

    /// Reconfigure calls issued so far.
    #[must_use]
    pub fn reconfigure_calls(&self) -> Vec<ReconfigureOptions> {
        self.reconfigures.lock().clone()
    }

    /// Whether the timeline actor is running.
    #[must_use]
    pub fn timeline_running(&self) -> bool {
        self.timeline_running.load(Ordering::SeqCst)
    }
}

// ============================================================================
// HostClient Implementation
// ============================================================================

#[async_trait]
impl HostClient for MemoryHost {
    fn subscribe(&self, kind: HostEventKind, handler: HostEventHandler) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.handlers.lock().push((id, kind, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers.lock().retain(|(sub, _, _)| *sub != id);
    }

    async fn request(&self, kind: FetchKind, actor: &ActorId) -> Result<Value> {
        self.fetch_log.lock().push((kind, actor.clone()));

        let delay = self.delays.lock().get(&kind).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.payloads
            .lock()
            .get(&(actor.clone(), kind))
            .cloned()
            .ok_or_else(|| Error::host_request(kind, actor.clone(), "no such actor"))
    }

    async fn long_string_text(&self, grip: &LongStringGrip) -> Result<String> {
        self.long_strings
            .lock()
            .get(&grip.actor)
            .cloned()
            .ok_or_else(|| Error::unknown_actor(grip.actor.clone()))
    }

    fn buffered_events(&self) -> Vec<NetworkInfo> {
        self.buffered.lock().clone()
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.read().contains(&capability)
    }

    async fn reconfigure(&self, options: ReconfigureOptions) -> Result<()> {
        self.reconfigures.lock().push(options);

        if options.perform_reload && self.navigate_on_reload.load(Ordering::SeqCst) {
            self.emit(HostEvent::WillNavigate {
                url: "about:reload".to_string(),
            });
            self.emit(HostEvent::Navigate {
                url: "about:reload".to_string(),
            });
        }

        Ok(())
    }

    async fn start_timeline(&self) -> Result<()> {
        self.timeline_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_timeline(&self) {
        self.timeline_running.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Tests
// ============================================================================
