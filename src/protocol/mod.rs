//! Remote debugging protocol message types.
//!
//! This module defines the packets the host sends about network activity
//! and the payloads of the follow-up fetches.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `networkEvent` | Host → Client | A request started |
//! | `networkEventUpdate` | Host → Client | More data for a request is ready |
//! | `get*` fetch | Client → Host | Fetch one group of request data |
//! | `substring` | Client → Host | Fetch the text behind a long string grip |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `long_string` | Long string grips |
//! | `packet` | Network event packets and update types |
//! | `payload` | Fetch payloads (headers, cookies, bodies, timings) |

// ============================================================================
// Submodules
// ============================================================================

/// Long string grips.
pub mod long_string;

/// Network event packets.
pub mod packet;

/// Fetch payload types.
pub mod payload;

// ============================================================================
// Re-exports
// ============================================================================

pub use long_string::{LongString, LongStringGrip};
pub use packet::{
    ContentSummary, NetworkInfo, RequestCause, RequestSummary, ResponseSummary, TimingMarker,
    UpdateType,
};
pub use payload::{
    ContentBody, Cookie, CookiePayload, EventTimings, Header, HeaderCollection, PostData,
    PostDataPayload, ResponseContent, SecurityInfo, SecurityInfoPayload, Timings,
};
