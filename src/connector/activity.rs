//! Page reload and cache sequencing.
//!
//! An activity reconfigures the tab and, for reloads, waits until the
//! navigation it causes has started and finished. The controller always
//! returns to [`ActivityType::None`] when an activity ends, including when
//! it fails.
//!
//! # Activities
//!
//! | Code | Activity | Reconfigure | Waits for navigation |
//! |------|----------|-------------|----------------------|
//! | 1 | [`ActivityType::ReloadWithCacheEnabled`] | cache on, reload | yes |
//! | 2 | [`ActivityType::ReloadWithCacheDisabled`] | cache off, reload | yes |
//! | 3 | [`ActivityType::ReloadWithCacheDefault`] | reload | yes |
//! | 4 | [`ActivityType::EnableCache`] | cache on | no |
//! | 5 | [`ActivityType::DisableCache`] | cache off | no |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::{HostClient, HostEvent, HostEventKind, ReconfigureOptions};
use crate::identifiers::SubscriptionId;

// ============================================================================
// ActivityType
// ============================================================================

/// What the frontend is currently doing to the tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum ActivityType {
    /// Standing by.
    #[default]
    None = 0,
    /// Reloading with the cache on.
    ReloadWithCacheEnabled = 1,
    /// Reloading with the cache off.
    ReloadWithCacheDisabled = 2,
    /// Reloading with the current cache setting.
    ReloadWithCacheDefault = 3,
    /// Turning the cache on.
    EnableCache = 4,
    /// Turning the cache off.
    DisableCache = 5,
}

impl ActivityType {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up an activity by code.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::ReloadWithCacheEnabled),
            2 => Some(Self::ReloadWithCacheDisabled),
            3 => Some(Self::ReloadWithCacheDefault),
            4 => Some(Self::EnableCache),
            5 => Some(Self::DisableCache),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::ReloadWithCacheEnabled => "reload-with-cache-enabled",
            Self::ReloadWithCacheDisabled => "reload-with-cache-disabled",
            Self::ReloadWithCacheDefault => "reload-with-cache-default",
            Self::EnableCache => "enable-cache",
            Self::DisableCache => "disable-cache",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ActivityState
// ============================================================================

/// Shared current activity.
#[derive(Debug, Default)]
struct ActivityState(AtomicU32);

impl ActivityState {
    fn get(&self) -> ActivityType {
        ActivityType::from_code(self.0.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn set(&self, activity: ActivityType) {
        self.0.store(activity.code(), Ordering::SeqCst);
    }
}

// ============================================================================
// NavigationWait
// ============================================================================

/// One-shot listener for a `will-navigate` then `navigate` pair.
///
/// Armed before the reconfigure call so a navigation the host reports
/// synchronously is not missed. Unsubscribes on drop.
struct NavigationWait {
    host: Arc<dyn HostClient>,
    subscriptions: [SubscriptionId; 2],
    rx: mpsc::UnboundedReceiver<HostEventKind>,
}

impl NavigationWait {
    /// Subscribes to both navigation events.
    ///
    /// `flip` is applied to `state` on the first `will-navigate`.
    fn arm(
        host: Arc<dyn HostClient>,
        state: Arc<ActivityState>,
        flip: Option<ActivityType>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let started = tx.clone();
        let flipped = AtomicBool::new(false);
        let will_navigate = host.subscribe(
            HostEventKind::WillNavigate,
            Arc::new(move |_: &HostEvent| {
                if let Some(activity) = flip
                    && !flipped.swap(true, Ordering::SeqCst)
                {
                    state.set(activity);
                }
                let _ = started.send(HostEventKind::WillNavigate);
            }),
        );

        let navigate = host.subscribe(
            HostEventKind::Navigate,
            Arc::new(move |_: &HostEvent| {
                let _ = tx.send(HostEventKind::Navigate);
            }),
        );

        Self {
            host,
            subscriptions: [will_navigate, navigate],
            rx,
        }
    }

    /// Resolves once a `navigate` follows a `will-navigate`.
    async fn finished(mut self) -> Result<()> {
        let mut started = false;
        while let Some(kind) = self.rx.recv().await {
            match kind {
                HostEventKind::WillNavigate => started = true,
                HostEventKind::Navigate if started => return Ok(()),
                _ => {}
            }
        }
        Err(Error::ConnectionClosed)
    }
}

impl Drop for NavigationWait {
    fn drop(&mut self) {
        for id in self.subscriptions {
            self.host.unsubscribe(id);
        }
    }
}

// ============================================================================
// ActivityController
// ============================================================================

/// Runs activities against a host and tracks the current one.
///
/// Once [`close`](Self::close) is called, activities in progress end with
/// [`Error::ConnectionClosed`] and release their host subscriptions.
#[derive(Debug)]
pub struct ActivityController {
    state: Arc<ActivityState>,
    closed: watch::Sender<bool>,
}

impl Default for ActivityController {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            closed: watch::Sender::new(false),
        }
    }
}

impl ActivityController {
    /// Creates a controller standing by.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts running activities and refuses later ones.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Current activity.
    #[must_use]
    pub fn current(&self) -> ActivityType {
        self.state.get()
    }

    /// Runs an activity given by numeric code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidActivity`] for codes that are not a
    /// triggerable activity, after resetting to [`ActivityType::None`].
    pub async fn trigger_code(&self, host: Arc<dyn HostClient>, code: u32) -> Result<()> {
        match ActivityType::from_code(code) {
            Some(activity) => self.trigger(host, activity).await,
            None => {
                self.state.set(ActivityType::None);
                Err(Error::invalid_activity(code))
            }
        }
    }

    /// Runs an activity and returns once it has finished.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidActivity`] for [`ActivityType::None`]
    /// - [`Error::ConnectionClosed`] if the controller is closed before the
    ///   activity ends
    /// - the host's error if reconfiguring fails
    ///
    /// The controller is back to [`ActivityType::None`] either way.
    pub async fn trigger(&self, host: Arc<dyn HostClient>, activity: ActivityType) -> Result<()> {
        debug!(%activity, "Triggering activity");
        let mut closed = self.closed.subscribe();

        let result = tokio::select! {
            biased;
            _ = closed.wait_for(|closed| *closed) => {
                debug!(%activity, "Activity aborted by close");
                Err(Error::ConnectionClosed)
            }
            result = self.run(host, activity) => result,
        };

        self.state.set(ActivityType::None);
        result
    }

    async fn run(&self, host: Arc<dyn HostClient>, activity: ActivityType) -> Result<()> {
        let options = ReconfigureOptions::default();

        match activity {
            ActivityType::ReloadWithCacheDefault => {
                self.reload(host, ReconfigureOptions::reload(), None).await
            }
            ActivityType::ReloadWithCacheEnabled => {
                self.state.set(ActivityType::EnableCache);
                let options = ReconfigureOptions::reload().with_cache_disabled(false);
                self.reload(host, options, Some(activity)).await
            }
            ActivityType::ReloadWithCacheDisabled => {
                self.state.set(ActivityType::DisableCache);
                let options = ReconfigureOptions::reload().with_cache_disabled(true);
                self.reload(host, options, Some(activity)).await
            }
            ActivityType::EnableCache => {
                self.state.set(activity);
                host.reconfigure(options.with_cache_disabled(false)).await
            }
            ActivityType::DisableCache => {
                self.state.set(activity);
                host.reconfigure(options.with_cache_disabled(true)).await
            }
            ActivityType::None => Err(Error::invalid_activity(activity.code())),
        }
    }

    async fn reload(
        &self,
        host: Arc<dyn HostClient>,
        options: ReconfigureOptions,
        flip: Option<ActivityType>,
    ) -> Result<()> {
        let navigation = NavigationWait::arm(Arc::clone(&host), Arc::clone(&self.state), flip);
        host.reconfigure(options).await?;
        navigation.finished().await
    }
}

// ============================================================================
// Tests
// ============================================================================
