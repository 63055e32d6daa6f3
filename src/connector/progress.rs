//! Sub-fetch progress.
//!
//! [`FieldTracker`] keeps a [`FieldStatus`] per request and fetch kind so
//! the state of every request can be inspected without a host. [`InFlight`]
//! counts outstanding continuations and lets callers wait until all of them
//! have settled.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;

use crate::host::FetchKind;
use crate::identifiers::ActorId;

// ============================================================================
// FieldStatus
// ============================================================================

/// Progress of one sub-fetch for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldStatus {
    /// Never fetched, or every fetch failed.
    #[default]
    Absent,
    /// A fetch is outstanding.
    Fetching,
    /// A fetch result landed in the store.
    Present,
}

/// Per-kind counters behind a [`FieldStatus`].
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    outstanding: u32,
    present: bool,
}

impl Slot {
    fn status(self) -> FieldStatus {
        if self.outstanding > 0 {
            FieldStatus::Fetching
        } else if self.present {
            FieldStatus::Present
        } else {
            FieldStatus::Absent
        }
    }
}

// ============================================================================
// FieldTracker
// ============================================================================

/// Request id to per-kind fetch status.
#[derive(Debug, Default)]
pub struct FieldTracker {
    slots: Mutex<FxHashMap<ActorId, [Slot; FetchKind::COUNT]>>,
}

impl FieldTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a fetch was issued.
    pub fn begin(&self, id: &ActorId, kind: FetchKind) {
        let mut slots = self.slots.lock();
        let slot = &mut slots.entry(id.clone()).or_default()[kind.index()];
        slot.outstanding += 1;
    }

    /// Records the outcome of a fetch.
    pub fn finish(&self, id: &ActorId, kind: FetchKind, landed: bool) {
        let mut slots = self.slots.lock();
        let Some(entry) = slots.get_mut(id) else {
            return;
        };
        let slot = &mut entry[kind.index()];
        slot.outstanding = slot.outstanding.saturating_sub(1);
        slot.present |= landed;
    }

    /// Current status of one fetch.
    #[must_use]
    pub fn status(&self, id: &ActorId, kind: FetchKind) -> FieldStatus {
        self.slots
            .lock()
            .get(id)
            .map_or(FieldStatus::Absent, |entry| entry[kind.index()].status())
    }

    /// Forgets every request.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

// ============================================================================
// InFlight
// ============================================================================

/// Outstanding continuation counter.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one continuation until the guard drops.
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: Arc::clone(self),
        }
    }

    /// Number of outstanding continuations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until no continuation is outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps one continuation registered with an [`InFlight`].
#[derive(Debug)]
pub struct InFlightGuard {
    counter: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.counter.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.counter.idle.notify_waiters();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
