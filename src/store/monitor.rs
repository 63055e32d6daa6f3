//! Default request list state.
//!
//! [`Monitor`] implements [`Actions`] over a [`RequestStore`] and adds the
//! list state the connector drives: batched updates, type filters, the
//! selection and document timing markers.
//!
//! # Batching
//!
//! Changes sent with `batch = true` are queued and applied together by
//! [`Monitor::flush`], which [`Monitor::spawn_flusher`] calls on an
//! interval. An immediate change first flushes the queue so changes are
//! always applied in call order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::identifiers::ActorId;
use crate::prefs::Prefs;
use crate::protocol::TimingMarker;

use super::actions::{Actions, Commit};
use super::filters::{FilterSet, FilterType};
use super::record::{NewRequest, RequestPatch, RequestRecord};
use super::requests::RequestStore;

// ============================================================================
// Types
// ============================================================================

/// A queued change.
enum Change {
    Add(ActorId, NewRequest),
    Update(ActorId, RequestPatch),
}

/// A queued change and its acknowledgement.
struct Queued {
    change: Change,
    done: oneshot::Sender<bool>,
}

// ============================================================================
// TimingMarkers
// ============================================================================

/// First document loading markers of the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingMarkers {
    /// Time of the first `DOMContentLoaded`.
    pub first_dom_content_loaded: Option<f64>,
    /// Time of the first `load`.
    pub first_load: Option<f64>,
}

impl TimingMarkers {
    fn record(&mut self, marker: &TimingMarker) {
        let slot = match marker.name.as_str() {
            TimingMarker::DOM_CONTENT_LOADED => &mut self.first_dom_content_loaded,
            TimingMarker::LOAD => &mut self.first_load,
            _ => return,
        };
        slot.get_or_insert(marker.unix_time);
    }
}

// ============================================================================
// Monitor
// ============================================================================

/// Request list state behind the connector.
///
/// # Thread Safety
///
/// `Monitor` is `Send + Sync`; share it as `Arc<Monitor>`.
#[derive(Default)]
pub struct Monitor {
    store: RequestStore,
    queue: Mutex<Vec<Queued>>,
    filters: RwLock<FilterSet>,
    selected: RwLock<Option<ActorId>>,
    markers: RwLock<TimingMarkers>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("requests", &self.store.len())
            .field("queued", &self.queue.lock().len())
            .field("filters", &*self.filters.read())
            .field("selected", &*self.selected.read())
            .finish()
    }
}

// ============================================================================
// Monitor - Constructors
// ============================================================================

impl Monitor {
    /// Creates an empty monitor showing all requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty monitor with the filters from `prefs`.
    #[must_use]
    pub fn with_prefs(prefs: &Prefs) -> Self {
        Self {
            filters: RwLock::new(FilterSet::from_types(prefs.filters.iter().copied())),
            ..Self::default()
        }
    }
}

// ============================================================================
// Monitor - Batching
// ============================================================================

impl Monitor {
    /// Applies every queued change in order. Returns how many landed.
    pub fn flush(&self) -> usize {
        let queued = mem::take(&mut *self.queue.lock());
        if queued.is_empty() {
            return 0;
        }

        let total = queued.len();
        let mut applied = 0;
        for Queued { change, done } in queued {
            let ok = self.apply(change);
            applied += usize::from(ok);
            let _ = done.send(ok);
        }

        trace!(total, applied, "Batch flushed");
        applied
    }

    /// Number of queued changes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Flushes on an interval until the monitor is dropped.
    pub fn spawn_flusher(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let monitor = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                monitor.flush();
            }

            trace!("Flusher stopped");
        })
    }

    fn submit(&self, change: Change, batch: bool) -> Commit {
        if batch {
            let (done, rx) = oneshot::channel();
            self.queue.lock().push(Queued { change, done });
            return Commit::pending(rx);
        }

        self.flush();
        Commit::ready(self.apply(change))
    }

    fn apply(&self, change: Change) -> bool {
        match change {
            Change::Add(id, request) => match self.store.create(id, request) {
                Ok(()) => true,
                Err(e) => {
                    debug!(error = %e, "Add rejected");
                    false
                }
            },
            Change::Update(id, patch) => self.store.patch(&id, patch),
        }
    }
}

// ============================================================================
// Monitor - Queries
// ============================================================================

impl Monitor {
    /// The underlying store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    /// Active filters.
    #[must_use]
    pub fn filters(&self) -> FilterSet {
        self.filters.read().clone()
    }

    /// Requests the active filters show, in arrival order.
    #[must_use]
    pub fn displayed_requests(&self) -> Vec<RequestRecord> {
        let filters = self.filters();
        self.store.filter(|record| filters.matches(record))
    }

    /// Selected request id.
    #[must_use]
    pub fn selected_request(&self) -> Option<ActorId> {
        self.selected.read().clone()
    }

    /// Recorded timing markers.
    #[must_use]
    pub fn timing_markers(&self) -> TimingMarkers {
        *self.markers.read()
    }
}

// ============================================================================
// Actions Implementation
// ============================================================================

impl Actions for Monitor {
    fn add_request(&self, id: ActorId, request: NewRequest, batch: bool) -> Commit {
        self.submit(Change::Add(id, request), batch)
    }

    fn update_request(&self, id: &ActorId, patch: RequestPatch, batch: bool) -> Commit {
        self.submit(Change::Update(id.clone(), patch), batch)
    }

    fn clear_requests(&self) {
        self.store.clear();
        *self.selected.write() = None;
        *self.markers.write() = TimingMarkers::default();
        debug!("Requests cleared");
    }

    fn batch_reset(&self) {
        let dropped = mem::take(&mut *self.queue.lock());
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "Batch reset");
        }
    }

    fn clear_timing_markers(&self) {
        *self.markers.write() = TimingMarkers::default();
    }

    fn add_timing_marker(&self, marker: &TimingMarker) {
        self.markers.write().record(marker);
    }

    fn toggle_request_filter_type(&self, filter: FilterType) {
        self.filters.write().toggle(filter);
    }

    fn select_request(&self, id: &ActorId) {
        if self.store.contains(id) {
            *self.selected.write() = Some(id.clone());
        }
    }

    fn get_request(&self, id: &ActorId) -> Option<RequestRecord> {
        self.store.get(id)
    }

    fn get_displayed_request(&self, id: &ActorId) -> Option<RequestRecord> {
        let record = self.store.get(id)?;
        self.filters.read().matches(&record).then_some(record)
    }

    fn flush(&self) {
        Monitor::flush(self);
    }
}

// ============================================================================
// Tests
// ============================================================================
