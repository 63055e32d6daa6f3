//! Request type filters.
//!
//! The request list shows a request when it matches any active filter
//! type. `all` matches everything.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

use super::record::RequestRecord;

// ============================================================================
// FilterType
// ============================================================================

/// A request type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterType {
    /// Everything.
    All,
    /// HTML documents.
    Html,
    /// Stylesheets.
    Css,
    /// Scripts.
    Js,
    /// `XMLHttpRequest`/`fetch`.
    Xhr,
    /// Web fonts.
    Fonts,
    /// Images.
    Images,
    /// Audio and video.
    Media,
    /// Flash objects.
    Flash,
    /// WebSocket upgrades.
    Ws,
    /// None of the above.
    Other,
}

impl FilterType {
    /// All filter types in toolbar order.
    pub const ALL: [FilterType; 11] = [
        Self::All,
        Self::Html,
        Self::Css,
        Self::Js,
        Self::Xhr,
        Self::Fonts,
        Self::Images,
        Self::Media,
        Self::Flash,
        Self::Ws,
        Self::Other,
    ];

    /// Returns the filter name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Html => "html",
            Self::Css => "css",
            Self::Js => "js",
            Self::Xhr => "xhr",
            Self::Fonts => "fonts",
            Self::Images => "images",
            Self::Media => "media",
            Self::Flash => "flash",
            Self::Ws => "ws",
            Self::Other => "other",
        }
    }

    /// Returns `true` if `record` belongs to this type.
    #[must_use]
    pub fn matches(self, record: &RequestRecord) -> bool {
        match self {
            Self::All => true,
            Self::Html => mime_contains(record, &["/html"]),
            Self::Css => mime_contains(record, &["/css"]),
            Self::Js => mime_contains(record, &["/ecmascript", "/javascript", "/x-javascript"]),
            Self::Xhr => record.is_xhr && !is_websocket(record),
            Self::Fonts => {
                mime_contains(record, &["font/", "/font"])
                    || url_has_extension(record, &[".woff", ".woff2", ".ttf", ".otf", ".eot"])
            }
            Self::Images => mime_contains(record, &["image/"]),
            Self::Media => mime_contains(
                record,
                &[
                    "audio/",
                    "video/",
                    "model/",
                    "application/vnd.apple.mpegurl",
                    "application/x-mpegurl",
                ],
            ),
            Self::Flash => {
                mime_contains(record, &["/x-flv", "/x-shockwave-flash"])
                    || url_has_extension(record, &[".swf", ".flv"])
            }
            Self::Ws => is_websocket(record),
            Self::Other => Self::ALL[1..10].iter().all(|t| !t.matches(record)),
        }
    }
}

fn mime_contains(record: &RequestRecord, needles: &[&str]) -> bool {
    record
        .mime_type
        .as_deref()
        .is_some_and(|mime| needles.iter().any(|n| mime.contains(n)))
}

fn url_has_extension(record: &RequestRecord, extensions: &[&str]) -> bool {
    let path = record.url.split(['?', '#']).next().unwrap_or_default();
    let path = path.to_ascii_lowercase();
    extensions.iter().any(|ext| path.ends_with(ext))
}

fn is_websocket(record: &RequestRecord) -> bool {
    if record.status.as_deref() == Some("101") {
        return true;
    }

    record
        .response_headers
        .as_ref()
        .and_then(|headers| headers.get("upgrade"))
        .and_then(|value| value.as_literal())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown filter type: {s}")))
    }
}

impl Serialize for FilterType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// FilterSet
// ============================================================================

/// The set of active filter types. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    active: BTreeSet<FilterType>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::from_types([FilterType::All])
    }
}

impl FilterSet {
    /// Builds a set from a list of types; an empty list means `all`.
    #[must_use]
    pub fn from_types(types: impl IntoIterator<Item = FilterType>) -> Self {
        let mut active: BTreeSet<FilterType> = types.into_iter().collect();
        if active.is_empty() {
            active.insert(FilterType::All);
        }
        Self { active }
    }

    /// Toggles one filter type.
    ///
    /// Toggling `all` resets to only `all`. Toggling any other type turns
    /// `all` off; if nothing is left active, `all` comes back.
    pub fn toggle(&mut self, filter: FilterType) {
        if filter == FilterType::All {
            self.active.clear();
            self.active.insert(FilterType::All);
            return;
        }

        self.active.remove(&FilterType::All);
        if !self.active.remove(&filter) {
            self.active.insert(filter);
        }
        if self.active.is_empty() {
            self.active.insert(FilterType::All);
        }
    }

    /// Returns `true` if `filter` is active.
    #[must_use]
    pub fn is_active(&self, filter: FilterType) -> bool {
        self.active.contains(&filter)
    }

    /// Active types in toolbar order.
    #[must_use]
    pub fn active(&self) -> Vec<FilterType> {
        self.active.iter().copied().collect()
    }

    /// Returns `true` if `record` should be displayed.
    #[must_use]
    pub fn matches(&self, record: &RequestRecord) -> bool {
        self.active.iter().any(|t| t.matches(record))
    }
}

// ============================================================================
// Tests
// ============================================================================
