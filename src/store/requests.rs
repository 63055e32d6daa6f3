//! In-memory request store.
//!
//! Maps request ids to [`RequestRecord`]s and owns the merge semantics.
//! Records are kept in arrival order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::ActorId;

use super::record::{NewRequest, RequestPatch, RequestRecord};

// ============================================================================
// Types
// ============================================================================

/// Records plus their arrival order.
#[derive(Default)]
struct Records {
    by_id: FxHashMap<ActorId, RequestRecord>,
    order: Vec<ActorId>,
}

// ============================================================================
// RequestStore
// ============================================================================

/// Id-keyed request records.
///
/// # Thread Safety
///
/// `RequestStore` is `Send + Sync`. Queries return owned snapshots so no
/// lock outlives a call.
#[derive(Default)]
pub struct RequestStore {
    records: RwLock<Records>,
}

impl fmt::Debug for RequestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestStore")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// RequestStore - Mutation
// ============================================================================

impl RequestStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record with only its static fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRequest`] if `id` is already present.
    pub fn create(&self, id: ActorId, fields: NewRequest) -> Result<()> {
        {
            let mut records = self.records.write();
            if records.by_id.contains_key(&id) {
                return Err(Error::duplicate_request(id));
            }
            records
                .by_id
                .insert(id.clone(), RequestRecord::new(id.clone(), fields));
            records.order.push(id.clone());
        }

        trace!(actor = %id, "Request created");
        Ok(())
    }

    /// Merges `patch` into the record for `id`.
    ///
    /// Returns `false` without touching the store if `id` is unknown.
    pub fn patch(&self, id: &ActorId, patch: RequestPatch) -> bool {
        let fields = patch.fields();

        let mut records = self.records.write();
        let Some(record) = records.by_id.get_mut(id) else {
            debug!(actor = %id, "Patch for unknown request dropped");
            return false;
        };
        patch.apply(record);

        trace!(actor = %id, ?fields, "Request patched");
        true
    }

    /// Removes every record.
    pub fn clear(&self) {
        let mut records = self.records.write();
        records.by_id.clear();
        records.order.clear();
    }
}

// ============================================================================
// RequestStore - Queries
// ============================================================================

impl RequestStore {
    /// Returns a snapshot of the record for `id`.
    #[must_use]
    pub fn get(&self, id: &ActorId) -> Option<RequestRecord> {
        self.records.read().by_id.get(id).cloned()
    }

    /// Returns `true` if `id` is present.
    #[must_use]
    pub fn contains(&self, id: &ActorId) -> bool {
        self.records.read().by_id.contains_key(id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().order.len()
    }

    /// Returns `true` if the store has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots of all records in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<RequestRecord> {
        let records = self.records.read();
        records
            .order
            .iter()
            .filter_map(|id| records.by_id.get(id).cloned())
            .collect()
    }

    /// Snapshots of the records matching `predicate`, in arrival order.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&RequestRecord) -> bool) -> Vec<RequestRecord> {
        let records = self.records.read();
        records
            .order
            .iter()
            .filter_map(|id| records.by_id.get(id))
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::RequestField;

    fn new_request(url: &str) -> NewRequest {
        NewRequest {
            method: "GET".into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = RequestStore::new();
        store
            .create(ActorId::new("r1"), new_request("http://a"))
            .expect("create");

        let record = store.get(&ActorId::new("r1")).expect("record");
        assert_eq!(record.url, "http://a");
        assert!(record.populated_fields().is_empty());
    }

    #[test]
    fn test_duplicate_create_fails() {
        let store = RequestStore::new();
        let id = ActorId::new("r1");
        store.create(id.clone(), new_request("http://a")).expect("create");

        let err = store.create(id, new_request("http://b")).unwrap_err();
        assert!(matches!(err, Error::DuplicateRequest { .. }));
        assert_eq!(store.records()[0].url, "http://a");
    }

    #[test]
    fn test_patch_unknown_id_is_noop() {
        let store = RequestStore::new();
        store
            .create(ActorId::new("r1"), new_request("http://a"))
            .expect("create");
        let before = store.records();

        let applied = store.patch(
            &ActorId::new("unknown-id"),
            RequestPatch {
                status: Some("200".into()),
                ..Default::default()
            },
        );

        assert!(!applied);
        assert_eq!(store.records(), before);
        assert!(!store.contains(&ActorId::new("unknown-id")));
    }

    #[test]
    fn test_patch_overwrites_only_set_fields() {
        let store = RequestStore::new();
        let id = ActorId::new("r1");
        store.create(id.clone(), new_request("http://a")).expect("create");

        let first = RequestPatch {
            status: Some("200".into()),
            status_text: Some("OK".into()),
            ..Default::default()
        };
        assert!(store.patch(&id, first));

        let second = RequestPatch {
            status: Some("304".into()),
            ..Default::default()
        };
        assert!(store.patch(&id, second));

        let record = store.get(&id).expect("record");
        assert_eq!(record.status.as_deref(), Some("304"));
        assert_eq!(record.status_text.as_deref(), Some("OK"));
        assert_eq!(
            record.populated_fields(),
            vec![RequestField::Status, RequestField::StatusText]
        );
    }

    #[test]
    fn test_clear_and_order() {
        let store = RequestStore::new();
        for n in ["c", "a", "b"] {
            store
                .create(ActorId::new(n), new_request(&format!("http://{n}")))
                .expect("create");
        }

        let ids: Vec<_> = store.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![ActorId::new("c"), ActorId::new("a"), ActorId::new("b")]);

        let only_a = store.filter(|r| r.url.ends_with('a'));
        assert_eq!(only_a.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
