//! Connector preferences.
//!
//! Mirrors the devtools preferences the network monitor reads:
//!
//! | Preference | Field | Default |
//! |------------|-------|---------|
//! | `devtools.webconsole.persistlog` | [`Prefs::persist_log`] | `false` |
//! | `devtools.netmonitor.filters` | [`Prefs::filters`] | `["all"]` |
//! | `devtools.netmonitor.refresh-rate` | [`Prefs::refresh_rate_ms`] | `50` |
//!
//! # Example
//!
//! ```
//! use firefox_netmonitor::Prefs;
//!
//! let prefs = Prefs::from_json_str(r#"{ "persistLog": true }"#).unwrap();
//! assert!(prefs.persist_log);
//!
//! let prefs = Prefs::new().with_persist_log(false).with_refresh_rate(100);
//! assert_eq!(prefs.refresh_rate().as_millis(), 100);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::FilterType;

// ============================================================================
// Constants
// ============================================================================

/// Keep requests across navigations.
pub const PERSIST_LOG_PREF: &str = "devtools.webconsole.persistlog";

/// Active request filters, as a JSON array.
pub const FILTERS_PREF: &str = "devtools.netmonitor.filters";

/// Batch flush interval in milliseconds.
pub const REFRESH_RATE_PREF: &str = "devtools.netmonitor.refresh-rate";

/// Default batch flush interval.
const DEFAULT_REFRESH_RATE_MS: u64 = 50;

// ============================================================================
// PreferenceValue
// ============================================================================

/// A raw preference value.
///
/// Firefox preferences can be booleans, integers, or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PreferenceValue {
    /// Boolean value.
    Bool(bool),

    /// Integer value.
    Int(i32),

    /// String value.
    String(String),
}

impl From<bool> for PreferenceValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PreferenceValue {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PreferenceValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

// ============================================================================
// Prefs
// ============================================================================

/// Preferences read by the connector and the default store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prefs {
    /// Keep requests across navigations; only timing markers are cleared.
    pub persist_log: bool,

    /// Request filters active at startup.
    pub filters: Vec<FilterType>,

    /// Interval between batch flushes, in milliseconds.
    pub refresh_rate_ms: u64,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            persist_log: false,
            filters: vec![FilterType::All],
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
        }
    }
}

// ============================================================================
// Prefs - Constructors
// ============================================================================

impl Prefs {
    /// Creates preferences with default values.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses preferences from JSON; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not valid JSON for `Prefs`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Prefs - Builder Methods
// ============================================================================

impl Prefs {
    /// Sets the persist-log preference.
    #[inline]
    #[must_use]
    pub fn with_persist_log(mut self, persist: bool) -> Self {
        self.persist_log = persist;
        self
    }

    /// Sets the startup filters.
    #[inline]
    #[must_use]
    pub fn with_filters(mut self, filters: impl IntoIterator<Item = FilterType>) -> Self {
        self.filters = filters.into_iter().collect();
        self
    }

    /// Sets the batch flush interval in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_refresh_rate(mut self, millis: u64) -> Self {
        self.refresh_rate_ms = millis;
        self
    }
}

// ============================================================================
// Prefs - Accessors
// ============================================================================

impl Prefs {
    /// Batch flush interval.
    #[inline]
    #[must_use]
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms.max(1))
    }

    /// Applies one raw preference by its Firefox name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown names or mistyped values.
    pub fn set(&mut self, key: &str, value: PreferenceValue) -> Result<()> {
        match (key, value) {
            (PERSIST_LOG_PREF, PreferenceValue::Bool(b)) => self.persist_log = b,
            (FILTERS_PREF, PreferenceValue::String(json)) => {
                self.filters = serde_json::from_str(&json)
                    .map_err(|e| Error::config(format!("{FILTERS_PREF}: {e}")))?;
            }
            (REFRESH_RATE_PREF, PreferenceValue::Int(ms)) => {
                self.refresh_rate_ms = u64::try_from(ms)
                    .map_err(|_| Error::config(format!("{REFRESH_RATE_PREF}: negative")))?;
            }
            (PERSIST_LOG_PREF | FILTERS_PREF | REFRESH_RATE_PREF, value) => {
                return Err(Error::config(format!(
                    "wrong value type for {key}: {value:?}"
                )));
            }
            _ => return Err(Error::config(format!("unknown preference: {key}"))),
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
