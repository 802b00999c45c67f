//! Engine state shared between the scheduler, the listeners and the public
//! handle.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::Duration;

use sidedock_common::WindowId;
use sidedock_config::SharedConfig;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::features::ActiveFeatures;
use crate::platform::HostCapabilities;
use crate::registry::WindowRegistry;
use crate::session::SessionIdentityStore;

/// Which timers are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingState {
    Idle,
    SlowPolling,
    /// The fast timer runs layered over the slow one.
    FastPolling,
}

/// Options for [`DockingEngine::check_simulate_docking`](super::DockingEngine::check_simulate_docking).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Rebuild the slow timer even if its interval is unchanged.
    pub reset: bool,
    /// Drop records whose windows no longer exist.
    pub revalidate: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            reset: false,
            revalidate: true,
        }
    }
}

/// A periodic task that can be stopped.
#[derive(Debug)]
pub(crate) struct Timer {
    pub period: Duration,
    pub cancel: CancellationToken,
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A running event listener task.
#[derive(Debug)]
pub(crate) struct Listener {
    pub cancel: CancellationToken,
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Timers and listeners currently installed. Dropping an entry stops it.
#[derive(Debug, Default)]
pub(crate) struct Activity {
    pub features: ActiveFeatures,
    pub slow: Option<Timer>,
    pub fast: Option<Timer>,
    pub focus_listener: Option<Listener>,
    pub removed_listener: Option<Listener>,
}

impl Activity {
    pub fn polling_state(&self) -> PollingState {
        match (&self.slow, &self.fast) {
            (_, Some(_)) => PollingState::FastPolling,
            (Some(_), None) => PollingState::SlowPolling,
            (None, None) => PollingState::Idle,
        }
    }
}

/// What the focus coordinator remembers between notifications.
#[derive(Debug, Default)]
pub(crate) struct FocusState {
    /// Last window that received focus.
    pub last_focused: Option<WindowId>,
    /// When the previous notification arrived.
    pub focus_lost_at: Option<Instant>,
}

pub(crate) struct Inner {
    pub host: HostCapabilities,
    pub config: SharedConfig,
    pub registry: WindowRegistry,
    pub sessions: SessionIdentityStore,
    /// Set by every applied geometry or state change.
    pub dirty: AtomicBool,
    pub activity: Mutex<Activity>,
    pub focus: Mutex<FocusState>,
    /// Cancelled on shutdown and replaced when the engine starts again.
    pub run: Mutex<CancellationToken>,
}
