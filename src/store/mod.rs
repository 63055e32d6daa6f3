//! Request list state.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `actions` | Mutators the connector drives ([`Actions`], [`Commit`]) |
//! | `filters` | Request type filters |
//! | `monitor` | Default [`Actions`] implementation |
//! | `record` | Request records and patches |
//! | `requests` | Id-keyed record store |

// ============================================================================
// Submodules
// ============================================================================

/// Store mutators.
pub mod actions;

/// Request type filters.
pub mod filters;

/// Default list state.
pub mod monitor;

/// Records and patches.
pub mod record;

/// Record store.
pub mod requests;

// ============================================================================
// Re-exports
// ============================================================================

pub use actions::{Actions, Commit};
pub use filters::{FilterSet, FilterType};
pub use monitor::{Monitor, TimingMarkers};
pub use record::{NewRequest, RequestField, RequestPatch, RequestRecord};
pub use requests::RequestStore;
