//! Query surface used by the UI layer.
//!
//! | Method | Description |
//! |--------|-------------|
//! | `inspect_request` | Selects a request, waiting for it if needed |
//! | `update_form_data_sections` | Derives urlencoded form sections once |
//! | `get_string` | Resolves a long string |
//! | `supports_*` | Host capability pass-throughs |

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Capability;
use crate::identifiers::ActorId;
use crate::protocol::LongString;
use crate::request_utils::form_data_sections;
use crate::store::{Actions, FilterType, RequestPatch};

use super::core::FirefoxConnector;
use super::events::ConnectorEvent;

// ============================================================================
// FirefoxConnector - Inspection
// ============================================================================

impl FirefoxConnector {
    /// Selects a request once the request list displays it.
    ///
    /// If the active filters hide the request they are reset to `all`.
    /// A request that has not arrived yet is waited for.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connector is closed
    /// - [`Error::ConnectionClosed`] if it closes while waiting
    pub async fn inspect_request(&self, id: &ActorId) -> Result<()> {
        let mut events = self.subscribe();

        loop {
            let session = self.session()?;
            if select_displayed(session.actions.as_ref(), id) {
                debug!(actor = %id, "Request inspected");
                return Ok(());
            }

            loop {
                match events.recv().await {
                    Some(ConnectorEvent::RequestAdded(_)) => break,
                    Some(_) => {}
                    None => return Err(Error::ConnectionClosed),
                }
            }
        }
    }

    /// Derives the form sections of a urlencoded POST body.
    ///
    /// Needs request headers, upload stream headers and POST data to be
    /// present. Returns `true` if sections were stored, `false` if they
    /// already exist or an input is still missing.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestNotFound`] for unknown ids
    /// - [`Error::NotConnected`] if the connector is closed
    /// - host errors while resolving the body
    pub async fn update_form_data_sections(&self, id: &ActorId) -> Result<bool> {
        let session = self.session()?;
        let record = session
            .actions
            .get_request(id)
            .ok_or_else(|| Error::request_not_found(id.clone()))?;

        if record.form_data_sections.is_some() {
            return Ok(false);
        }
        let (Some(headers), Some(upload), Some(post_data)) = (
            record.request_headers.as_ref(),
            record.request_headers_from_upload_stream.as_ref(),
            record.request_post_data.as_ref(),
        ) else {
            return Ok(false);
        };

        let sections =
            form_data_sections(headers, upload, post_data, session.host.as_ref()).await?;
        let patch = RequestPatch {
            form_data_sections: Some(sections),
            ..Default::default()
        };

        Ok(self.inner.update(id, patch).wait().await)
    }

    /// Resolves a long string to its full text.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connector is closed
    /// - host errors for unknown grips
    pub async fn get_string(&self, value: &LongString) -> Result<String> {
        let session = self.session()?;
        session.host.resolve_long_string(value).await
    }
}

/// Looks the request up, resetting the filters once if it is hidden.
fn select_displayed(actions: &dyn Actions, id: &ActorId) -> bool {
    if actions.get_displayed_request(id).is_none() {
        actions.toggle_request_filter_type(FilterType::All);
        if actions.get_displayed_request(id).is_none() {
            return false;
        }
    }

    actions.select_request(id);
    true
}

// ============================================================================
// FirefoxConnector - Capabilities
// ============================================================================

impl FirefoxConnector {
    /// Whether the host can replay edited requests.
    #[must_use]
    pub fn supports_custom_request(&self) -> bool {
        self.has_capability(Capability::CustomNetworkRequest)
    }

    /// Whether responses report their transferred size.
    #[must_use]
    pub fn supports_transferred_response_size(&self) -> bool {
        self.has_capability(Capability::TransferredResponseSize)
    }

    /// Whether the tab can be reloaded for performance statistics.
    #[must_use]
    pub fn supports_perf_stats(&self) -> bool {
        self.has_capability(Capability::Reconfigure)
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.session()
            .is_ok_and(|session| session.host.has_capability(capability))
    }
}

// ============================================================================
// Tests
// ============================================================================
