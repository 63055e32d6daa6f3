//! Connector lifecycle.
//!
//! [`FirefoxConnector`] attaches to a [`HostClient`], feeds an [`Actions`]
//! store and raises [`ConnectorEvent`]s. Connecting negotiates a fixed
//! [`SubscriptionPlan`], replays buffered events, and from then on every
//! host event is handled in delivery order. Closing unsubscribes
//! everything and detaches from the host and the store; continuations
//! still in flight finish without touching the store.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::host::{
    Capability, FetchKind, HostClient, HostEvent, HostEventHandler, HostEventKind,
};
use crate::identifiers::{ActorId, SubscriptionId};
use crate::prefs::Prefs;
use crate::protocol::{NetworkInfo, TimingMarker};
use crate::store::{Actions, Commit, NewRequest, RequestPatch};

use super::activity::{ActivityController, ActivityType};
use super::events::{ConnectorEvent, EventBus};
use super::progress::{FieldStatus, FieldTracker, InFlight};

// ============================================================================
// SubscriptionPlan
// ============================================================================

/// Host event streams a connector listens to, fixed at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    kinds: Vec<HostEventKind>,
    timeline: bool,
}

impl SubscriptionPlan {
    /// Streams every connector needs.
    const BASE: [HostEventKind; 5] = [
        HostEventKind::WillNavigate,
        HostEventKind::Navigate,
        HostEventKind::Close,
        HostEventKind::NetworkEvent,
        HostEventKind::NetworkEventUpdate,
    ];

    /// Builds the plan from the host's capabilities.
    ///
    /// Document loading markers are only subscribed to when the host can
    /// emit them.
    #[must_use]
    pub fn negotiate(host: &dyn HostClient) -> Self {
        let timeline = host.has_capability(Capability::DocumentLoadingMarkers);
        let mut kinds = Self::BASE.to_vec();
        if timeline {
            kinds.push(HostEventKind::DocLoading);
        }
        Self { kinds, timeline }
    }

    /// Streams to subscribe to, in subscription order.
    #[inline]
    #[must_use]
    pub fn kinds(&self) -> &[HostEventKind] {
        &self.kinds
    }

    /// Returns `true` if the timeline actor is used.
    #[inline]
    #[must_use]
    pub fn uses_timeline(&self) -> bool {
        self.timeline
    }
}

// ============================================================================
// Session
// ============================================================================

/// Host and store references held while connected.
#[derive(Clone)]
pub(super) struct Session {
    pub(super) host: Arc<dyn HostClient>,
    pub(super) actions: Arc<dyn Actions>,
}

// ============================================================================
// Inner
// ============================================================================

/// Shared connector state.
pub(super) struct Inner {
    /// `None` once closed.
    session: RwLock<Option<Session>>,
    /// Runtime continuations are spawned on.
    runtime: Handle,
    plan: SubscriptionPlan,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    timeline_started: AtomicBool,
    persist_log: AtomicBool,
    pub(super) events: EventBus,
    pub(super) fields: FieldTracker,
    pub(super) in_flight: Arc<InFlight>,
    pub(super) unknown_updates: AtomicU64,
    activity: ActivityController,
}

impl Inner {
    /// Current session, if still connected.
    #[inline]
    pub(super) fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Spawns a continuation and tracks it until it finishes.
    pub(super) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.in_flight.enter();
        self.runtime.spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    /// Queues a patch on the current session.
    ///
    /// Resolves `false` without touching anything once closed.
    pub(super) fn update(&self, id: &ActorId, patch: RequestPatch) -> Commit {
        match self.session() {
            Some(session) => session.actions.update_request(id, patch, true),
            None => Commit::ready(false),
        }
    }

    fn handler(self: &Arc<Self>) -> HostEventHandler {
        let weak = Arc::downgrade(self);
        Arc::new(move |event: &HostEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.handle(event);
            }
        })
    }

    fn handle(self: &Arc<Self>, event: &HostEvent) {
        match event {
            HostEvent::NetworkEvent(info) => self.on_network_event(info),
            HostEvent::NetworkEventUpdate {
                update_type,
                network_info,
            } => self.on_network_event_update(update_type, network_info),
            HostEvent::WillNavigate { .. } => self.will_navigate(),
            HostEvent::Navigate { .. } => self.events.emit(ConnectorEvent::TargetDidNavigate),
            HostEvent::Close => {
                if let Some(session) = self.shutdown() {
                    self.runtime.spawn(async move {
                        session.host.stop_timeline().await;
                    });
                }
            }
            HostEvent::DocLoading(marker) => self.on_doc_loading(marker),
        }
    }

    fn on_network_event(self: &Arc<Self>, info: &NetworkInfo) {
        let Some(session) = self.session() else {
            return;
        };

        let id = info.actor.clone();
        let commit =
            session
                .actions
                .add_request(id.clone(), NewRequest::from_network_info(info), true);
        self.events.emit(ConnectorEvent::NetworkEvent(id.clone()));

        let inner = Arc::clone(self);
        self.spawn(async move {
            if commit.wait().await {
                inner.events.emit(ConnectorEvent::RequestAdded(id));
            }
        });
    }

    fn on_doc_loading(&self, marker: &TimingMarker) {
        let Some(session) = self.session() else {
            return;
        };

        self.events.emit(ConnectorEvent::TimelineEvent(marker.clone()));
        session.actions.add_timing_marker(marker);
    }

    fn will_navigate(&self) {
        let Some(session) = self.session() else {
            return;
        };

        if self.persist_log.load(Ordering::SeqCst) {
            session.actions.clear_timing_markers();
        } else {
            session.actions.batch_reset();
            session.actions.clear_requests();
            self.fields.clear();
        }

        debug!(persist = self.persist_log.load(Ordering::SeqCst), "Target will navigate");
        self.events.emit(ConnectorEvent::TargetWillNavigate);
    }

    /// Replays events the host saw before the connector attached.
    fn replay_buffered(self: &Arc<Self>, host: &dyn HostClient) {
        let buffered = host.buffered_events();
        if buffered.is_empty() {
            return;
        }

        debug!(count = buffered.len(), "Replaying buffered network events");
        for info in &buffered {
            self.on_network_event(info);
            for update in &info.updates {
                self.on_network_event_update(update, info);
            }
        }
    }

    /// Detaches from the host and the store.
    ///
    /// Returns the released session if the timeline still has to be
    /// stopped.
    fn shutdown(&self) -> Option<Session> {
        let session = self.session.write().take()?;

        session.actions.batch_reset();
        for id in self.subscriptions.lock().drain(..) {
            session.host.unsubscribe(id);
        }
        self.activity.close();
        self.events.close();

        info!("Connector closed");
        self.timeline_started
            .swap(false, Ordering::SeqCst)
            .then_some(session)
    }
}

// ============================================================================
// FirefoxConnector
// ============================================================================

/// Network monitor connector for a Firefox tab.
///
/// Cheap to clone; clones share the same connection.
///
/// # Example
///
/// ```ignore
/// let host = Arc::new(MemoryHost::new());
/// let monitor = Arc::new(Monitor::new());
/// monitor.spawn_flusher(prefs.refresh_rate());
///
/// let connector = FirefoxConnector::connect(host, monitor.clone(), &prefs).await?;
/// let mut events = connector.subscribe();
/// ```
#[derive(Clone)]
pub struct FirefoxConnector {
    pub(super) inner: Arc<Inner>,
}

impl fmt::Debug for FirefoxConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirefoxConnector")
            .field("connected", &self.is_connected())
            .field("plan", &self.inner.plan)
            .field("in_flight", &self.inner.in_flight.count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// FirefoxConnector - Lifecycle
// ============================================================================

impl FirefoxConnector {
    /// Attaches to `host` and starts feeding `actions`.
    ///
    /// Subscribes to the tab, console and (if supported) timeline events,
    /// then replays buffered events through the live path.
    ///
    /// # Errors
    ///
    /// Fails only if no Tokio runtime is available to the caller.
    pub async fn connect(
        host: Arc<dyn HostClient>,
        actions: Arc<dyn Actions>,
        prefs: &Prefs,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::config(e.to_string()))?;
        let plan = SubscriptionPlan::negotiate(host.as_ref());

        let inner = Arc::new(Inner {
            session: RwLock::new(Some(Session {
                host: Arc::clone(&host),
                actions,
            })),
            runtime,
            plan,
            subscriptions: Mutex::new(Vec::new()),
            timeline_started: AtomicBool::new(false),
            persist_log: AtomicBool::new(prefs.persist_log),
            events: EventBus::new(),
            fields: FieldTracker::new(),
            in_flight: Arc::new(InFlight::new()),
            unknown_updates: AtomicU64::new(0),
            activity: ActivityController::new(),
        });

        {
            let handler = inner.handler();
            let mut subscriptions = inner.subscriptions.lock();
            for kind in inner.plan.kinds() {
                subscriptions.push(host.subscribe(*kind, HostEventHandler::clone(&handler)));
            }
        }

        if inner.plan.uses_timeline() {
            match host.start_timeline().await {
                Ok(()) => inner.timeline_started.store(true, Ordering::SeqCst),
                Err(e) => warn!(error = %e, "Timeline failed to start"),
            }
        }

        inner.replay_buffered(host.as_ref());

        info!(
            streams = inner.plan.kinds().len(),
            timeline = inner.plan.uses_timeline(),
            "Connector attached"
        );

        Ok(Self { inner })
    }

    /// Detaches from the host and the store.
    ///
    /// Pending batched changes are discarded; results of fetches still in
    /// flight are dropped. Calling it again does nothing.
    pub async fn close(&self) {
        if let Some(session) = self.inner.shutdown() {
            session.host.stop_timeline().await;
        }
    }

    /// Handles an upcoming navigation.
    ///
    /// Without persist-log the request list is cleared; with it only the
    /// timing markers are.
    pub fn will_navigate(&self) {
        self.inner.will_navigate();
    }

    /// Returns `true` until closed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.session.read().is_some()
    }

    /// Changes the persist-log preference for later navigations.
    pub fn set_persist_log(&self, persist: bool) {
        self.inner.persist_log.store(persist, Ordering::SeqCst);
    }

    /// Current persist-log preference.
    #[must_use]
    pub fn persist_log(&self) -> bool {
        self.inner.persist_log.load(Ordering::SeqCst)
    }

    /// Streams negotiated at connect time.
    #[must_use]
    pub fn subscription_plan(&self) -> &SubscriptionPlan {
        &self.inner.plan
    }

    /// Subscribes to connector events.
    ///
    /// The stream ends when the connector closes.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConnectorEvent> {
        self.inner.events.subscribe()
    }

    pub(super) fn session(&self) -> Result<Session> {
        self.inner.session().ok_or(Error::NotConnected)
    }
}

// ============================================================================
// FirefoxConnector - Activities
// ============================================================================

impl FirefoxConnector {
    /// Runs an activity given by numeric code.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidActivity`] for codes that are not an activity
    /// - [`Error::NotConnected`] after close
    pub async fn trigger_activity(&self, code: u32) -> Result<()> {
        let session = self.session()?;
        self.inner.activity.trigger_code(session.host, code).await
    }

    /// Runs an activity.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidActivity`] for [`ActivityType::None`]
    /// - [`Error::NotConnected`] after close
    pub async fn trigger(&self, activity: ActivityType) -> Result<()> {
        let session = self.session()?;
        self.inner.activity.trigger(session.host, activity).await
    }

    /// Activity in progress.
    #[must_use]
    pub fn current_activity(&self) -> ActivityType {
        self.inner.activity.current()
    }
}

// ============================================================================
// FirefoxConnector - Progress
// ============================================================================

impl FirefoxConnector {
    /// Progress of one sub-fetch for a request.
    #[must_use]
    pub fn field_status(&self, id: &ActorId, kind: FetchKind) -> FieldStatus {
        self.inner.fields.status(id, kind)
    }

    /// Number of ignored updates of unknown type.
    #[must_use]
    pub fn unknown_update_count(&self) -> u64 {
        self.inner.unknown_updates.load(Ordering::Relaxed)
    }

    /// Number of continuations still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.count()
    }

    /// Waits until every continuation has finished.
    ///
    /// Batched changes only land when the store flushes, so a store with
    /// batching needs its flusher running for this to return.
    pub async fn wait_idle(&self) {
        self.inner.in_flight.wait_idle().await;
    }
}

// ============================================================================
// Tests
// ============================================================================
