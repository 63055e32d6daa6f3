//! Store mutators consumed by the connector.
//!
//! The connector never owns request state. It drives an [`Actions`]
//! implementation and reads back through the same trait. [`Monitor`] is
//! the in-crate implementation.
//!
//! Mutators are synchronous so that call order is the order changes are
//! applied in. Adds and updates return a [`Commit`] that resolves once the
//! change has landed (or been discarded).
//!
//! [`Monitor`]: super::Monitor

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::oneshot;

use crate::identifiers::ActorId;
use crate::protocol::TimingMarker;

use super::filters::FilterType;
use super::record::{NewRequest, RequestPatch, RequestRecord};

// ============================================================================
// Commit
// ============================================================================

/// Outcome of an add or update.
///
/// Immediate changes carry their result; batched changes resolve when the
/// batch is flushed, or `false` if it is reset first.
#[derive(Debug)]
#[must_use = "a commit does nothing unless awaited or dropped deliberately"]
pub struct Commit {
    state: CommitState,
}

#[derive(Debug)]
enum CommitState {
    Ready(bool),
    Pending(oneshot::Receiver<bool>),
}

impl Commit {
    /// A change that has already been applied (or rejected).
    #[inline]
    pub fn ready(applied: bool) -> Self {
        Self {
            state: CommitState::Ready(applied),
        }
    }

    /// A change that resolves through `rx`.
    #[inline]
    pub fn pending(rx: oneshot::Receiver<bool>) -> Self {
        Self {
            state: CommitState::Pending(rx),
        }
    }

    /// Returns `true` if the outcome is not known yet.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, CommitState::Pending(_))
    }

    /// Waits for the change to land.
    ///
    /// Returns `false` if it was rejected or discarded.
    pub async fn wait(self) -> bool {
        match self.state {
            CommitState::Ready(applied) => applied,
            CommitState::Pending(rx) => rx.await.unwrap_or(false),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Request list mutators and queries.
pub trait Actions: Send + Sync {
    /// Adds a request. Duplicates resolve `false` and leave the store alone.
    fn add_request(&self, id: ActorId, request: NewRequest, batch: bool) -> Commit;

    /// Merges fields into a request. Unknown ids resolve `false`.
    fn update_request(&self, id: &ActorId, patch: RequestPatch, batch: bool) -> Commit;

    /// Removes every request, the selection and the timing markers.
    fn clear_requests(&self);

    /// Discards queued batched changes.
    fn batch_reset(&self);

    /// Forgets recorded timing markers.
    fn clear_timing_markers(&self);

    /// Records a document loading marker.
    fn add_timing_marker(&self, marker: &TimingMarker);

    /// Toggles a request type filter.
    fn toggle_request_filter_type(&self, filter: FilterType);

    /// Selects a request in the list.
    fn select_request(&self, id: &ActorId);

    /// Returns the request with this id, displayed or not.
    fn get_request(&self, id: &ActorId) -> Option<RequestRecord>;

    /// Returns the request with this id if the active filters show it.
    fn get_displayed_request(&self, id: &ActorId) -> Option<RequestRecord>;

    /// Applies queued batched changes now.
    ///
    /// Stores without batching have nothing to do.
    fn flush(&self) {}
}

// ============================================================================
// Tests
// ============================================================================
