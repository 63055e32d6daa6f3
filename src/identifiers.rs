//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Source | Purpose |
//! |------|--------|---------|
//! | [`ActorId`] | Host | Network event actor, primary key of a request |
//! | [`SubscriptionId`] | Host client | Handle for removing an event handler |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// ActorId
// ============================================================================

/// Opaque request identifier assigned by the host.
///
/// The host names every network event after the actor that tracks it
/// (e.g. `server1.conn0.netEvent42`). Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Arc<str>);

impl ActorId {
    /// Creates an actor ID from any string.
    #[inline]
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl From<&str> for ActorId {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActorId {
    #[inline]
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Global counter for subscription handles.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by a host client when an event handler is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates the next unique subscription ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_display() {
        let id = ActorId::new("server1.conn0.netEvent4");
        assert_eq!(id.to_string(), "server1.conn0.netEvent4");
        assert_eq!(id.as_str(), "server1.conn0.netEvent4");
    }

    #[test]
    fn test_actor_id_serde() {
        let id: ActorId = serde_json::from_str("\"netEvent1\"").expect("parse");
        assert_eq!(id, ActorId::new("netEvent1"));
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"netEvent1\"");
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let a = SubscriptionId::next();
        let b = SubscriptionId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }
}
