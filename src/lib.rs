//! Firefox NetMonitor - Network monitor connector for the Firefox remote
//! debugging protocol.
//!
//! This library assembles per-request records from the asynchronous,
//! partially ordered `networkEvent`/`networkEventUpdate` stream a Firefox
//! tab emits, resolving long strings and fetching headers, cookies, bodies
//! and timings on demand.
//!
//! # Architecture
//!
//! The connector sits between a host client and a request store:
//!
//! - **Host (`HostClient`)**: Event subscriptions, sub-fetches, long strings
//! - **Connector (`FirefoxConnector`)**: Lifecycle, update dispatch, activities
//! - **Store (`Actions`)**: Request list mutators; [`Monitor`] is the default
//!
//! Key design principles:
//!
//! - Every update type is a closed [`UpdateType`] variant
//! - Sub-fetches run as independent continuations, patching by field name
//! - Per-request progress is explicit ([`FieldStatus`])
//! - Notifications go through a per-connector [`ConnectorEvent`] bus
//! - After `close()` every continuation is a no-op
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use firefox_netmonitor::{Connection, Monitor, Prefs, Result, on_connect};
//!
//! async fn attach(host: Arc<dyn HostClient>) -> Result<()> {
//!     let prefs = Prefs::default().with_persist_log(true);
//!
//!     let monitor = Arc::new(Monitor::with_prefs(&prefs));
//!     monitor.spawn_flusher(prefs.refresh_rate());
//!
//!     let connector = on_connect(Connection::firefox(host), monitor.clone(), &prefs).await?;
//!     let mut events = connector.subscribe();
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{}", event.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connector`] | Connector lifecycle, dispatch, activities |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`host`] | Host client seam and in-process host |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`prefs`] | Monitor preferences |
//! | [`protocol`] | Network event packets and fetch payloads |
//! | [`request_utils`] | Payload helpers (data URIs, multipart headers) |
//! | [`store`] | Request records, store and actions |

// ============================================================================
// Modules
// ============================================================================

/// Connector lifecycle, update dispatch and activities.
///
/// Use [`FirefoxConnector::connect()`] or [`on_connect()`] to attach.
pub mod connector;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Host client seam.
///
/// The connector reaches the remote session only through [`HostClient`].
pub mod host;

/// Type-safe identifiers.
pub mod identifiers;

/// Monitor preferences.
pub mod prefs;

/// Remote debugging protocol message types.
pub mod protocol;

/// Request payload helpers.
pub mod request_utils;

/// Request records, store and actions.
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

// Connector types
pub use connector::{
    ActivityType, ClientType, Connection, ConnectorEvent, FieldStatus, FirefoxConnector,
    SubscriptionPlan, on_connect,
};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::memory::MemoryHost;
pub use host::{Capability, FetchKind, HostClient, HostEvent, HostEventKind, ReconfigureOptions};

// Identifier types
pub use identifiers::{ActorId, SubscriptionId};

// Preferences
pub use prefs::{PreferenceValue, Prefs};

// Protocol types
pub use protocol::{LongString, LongStringGrip, NetworkInfo, TimingMarker, UpdateType};

// Store types
pub use store::{Actions, Commit, FilterType, Monitor, RequestField, RequestPatch, RequestRecord};
