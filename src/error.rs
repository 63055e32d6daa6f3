//! Error types for the network monitor connector.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use firefox_netmonitor::{ActivityType, Result};
//!
//! async fn reload(connector: &FirefoxConnector) -> Result<()> {
//!     connector.trigger(ActivityType::ReloadWithCacheDisabled).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Setup | [`Error::Config`], [`Error::UnknownClientType`], [`Error::UnsupportedClient`] |
//! | Activity | [`Error::InvalidActivity`] |
//! | Store | [`Error::DuplicateRequest`], [`Error::RequestNotFound`] |
//! | Host | [`Error::HostRequest`], [`Error::UnknownActor`], [`Error::Protocol`] |
//! | Lifecycle | [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Json`] |
//!
//! Sub-fetch failures never reach callers of the connector: they are
//! contained in the dispatcher and only show up as fields that never arrive.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::host::FetchKind;
use crate::identifiers::ActorId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when preferences cannot be parsed or are inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Unknown client type in the connection descriptor.
    ///
    /// Fatal at connect time: there is no protocol mapping for it.
    #[error("Unknown client type: {client_type}")]
    UnknownClientType {
        /// The client type that was requested.
        client_type: String,
    },

    /// Known client type without a connector implementation.
    #[error("Unsupported client: {client_type}")]
    UnsupportedClient {
        /// The client type that was requested.
        client_type: String,
    },

    // ========================================================================
    // Activity Errors
    // ========================================================================
    /// Activity code is not a triggerable activity.
    ///
    /// The activity state is reset to NONE before this is returned.
    #[error("Invalid activity type: {code}")]
    InvalidActivity {
        /// The rejected activity code.
        code: u32,
    },

    // ========================================================================
    // Store Errors
    // ========================================================================
    /// A request with this id is already in the store.
    #[error("Duplicate request: {actor}")]
    DuplicateRequest {
        /// The id that was already present.
        actor: ActorId,
    },

    /// No request with this id is in the store.
    #[error("Request not found: {actor}")]
    RequestNotFound {
        /// The missing id.
        actor: ActorId,
    },

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// The host rejected a sub-fetch.
    #[error("Host request {kind} failed for {actor}: {message}")]
    HostRequest {
        /// Which sub-fetch failed.
        kind: FetchKind,
        /// The request the sub-fetch was for.
        actor: ActorId,
        /// Failure reported by the host.
        message: String,
    },

    /// The host does not know this actor (request or long string).
    #[error("Unknown actor: {actor}")]
    UnknownActor {
        /// The actor the host could not find.
        actor: String,
    },

    /// A host payload did not have the expected shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// What was malformed.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The connector has no live host connection.
    #[error("Not connected")]
    NotConnected,

    /// The connector was closed while the operation was waiting.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unknown client type error.
    #[inline]
    pub fn unknown_client_type(client_type: impl Into<String>) -> Self {
        Self::UnknownClientType {
            client_type: client_type.into(),
        }
    }

    /// Creates an unsupported client error.
    #[inline]
    pub fn unsupported_client(client_type: impl Into<String>) -> Self {
        Self::UnsupportedClient {
            client_type: client_type.into(),
        }
    }

    /// Creates an invalid activity error.
    #[inline]
    pub fn invalid_activity(code: u32) -> Self {
        Self::InvalidActivity { code }
    }

    /// Creates a duplicate request error.
    #[inline]
    pub fn duplicate_request(actor: ActorId) -> Self {
        Self::DuplicateRequest { actor }
    }

    /// Creates a request not found error.
    #[inline]
    pub fn request_not_found(actor: ActorId) -> Self {
        Self::RequestNotFound { actor }
    }

    /// Creates a host request error.
    #[inline]
    pub fn host_request(kind: FetchKind, actor: ActorId, message: impl Into<String>) -> Self {
        Self::HostRequest {
            kind,
            actor,
            message: message.into(),
        }
    }

    /// Creates an unknown actor error.
    #[inline]
    pub fn unknown_actor(actor: impl Into<String>) -> Self {
        Self::UnknownActor {
            actor: actor.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the error came from the host side of a fetch.
    ///
    /// Anything else means the connector itself went away (closed).
    #[inline]
    #[must_use]
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            Self::HostRequest { .. } | Self::UnknownActor { .. } | Self::Protocol { .. }
        )
    }

    /// Returns `true` if this is a structural error surfaced to callers.
    #[inline]
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::UnknownClientType { .. }
                | Self::UnsupportedClient { .. }
                | Self::InvalidActivity { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
