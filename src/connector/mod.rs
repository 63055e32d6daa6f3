//! Connector layer.
//!
//! Turns the host's `networkEvent`/`networkEventUpdate` stream into request
//! records and drives the tab for reloads and cache toggles.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FirefoxConnector`] | Lifecycle, dispatch and query surface |
//! | [`ActivityType`] | Reload and cache activities |
//! | [`ConnectorEvent`] | Notifications raised by the connector |
//! | [`FieldStatus`] | Per-request progress of each sub-fetch |
//!
//! # Example
//!
//! ```ignore
//! use firefox_netmonitor::connector::{Connection, on_connect};
//!
//! let monitor = Arc::new(Monitor::with_prefs(&prefs));
//! monitor.spawn_flusher(prefs.refresh_rate());
//!
//! let connector = on_connect(Connection::firefox(host), monitor.clone(), &prefs).await?;
//! connector.trigger(ActivityType::ReloadWithCacheDefault).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Reload and cache activities.
pub mod activity;

/// Connector lifecycle.
pub mod core;

/// Update dispatch.
mod dispatch;

/// Connector notifications.
pub mod events;

/// Query surface.
mod inspect;

/// Sub-fetch progress tracking.
pub mod progress;

// ============================================================================
// Re-exports
// ============================================================================

pub use activity::{ActivityController, ActivityType};
pub use self::core::{FirefoxConnector, SubscriptionPlan};
pub use events::{ConnectorEvent, EventBus};
pub use progress::{FieldStatus, FieldTracker, InFlight};

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::host::HostClient;
use crate::prefs::Prefs;
use crate::store::Actions;

// ============================================================================
// ClientType
// ============================================================================

/// Debugging protocol spoken by the remote end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientType {
    /// Firefox remote debugging protocol.
    Firefox,
    /// Chrome DevTools protocol. Recognized, not implemented.
    Chrome,
}

impl ClientType {
    /// Parses a client type name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownClientType`] for anything but `firefox` and
    /// `chrome`.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "firefox" => Ok(Self::Firefox),
            "chrome" => Ok(Self::Chrome),
            other => Err(Error::unknown_client_type(other)),
        }
    }

    /// Returns the client type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Remote session handed to [`on_connect`].
#[derive(Clone)]
pub struct Connection {
    /// Protocol name reported by the tab (`firefox`, `chrome`).
    pub client_type: String,
    /// Host client for the tab.
    pub host: Arc<dyn HostClient>,
}

impl Connection {
    /// Creates a connection with an explicit client type.
    #[must_use]
    pub fn new(client_type: impl Into<String>, host: Arc<dyn HostClient>) -> Self {
        Self {
            client_type: client_type.into(),
            host,
        }
    }

    /// Creates a Firefox connection.
    #[must_use]
    pub fn firefox(host: Arc<dyn HostClient>) -> Self {
        Self::new(ClientType::Firefox.as_str(), host)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("client_type", &self.client_type)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Dispatch Shell
// ============================================================================

/// Connects the connector matching the connection's client type.
///
/// # Errors
///
/// - [`Error::UnknownClientType`] for unrecognized client types
/// - [`Error::UnsupportedClient`] for `chrome`
pub async fn on_connect(
    connection: Connection,
    actions: Arc<dyn Actions>,
    prefs: &Prefs,
) -> Result<FirefoxConnector> {
    let result = match ClientType::parse(&connection.client_type) {
        Ok(ClientType::Firefox) => {
            debug!(client = %ClientType::Firefox, "Connecting");
            FirefoxConnector::connect(connection.host, actions, prefs).await
        }
        Ok(client_type) => Err(Error::unsupported_client(client_type.as_str())),
        Err(e) => Err(e),
    };

    if let Err(e) = &result
        && e.is_setup_error()
    {
        warn!(client = %connection.client_type, error = %e, "Connection rejected");
    }
    result
}

// ============================================================================
// Tests
// ============================================================================
