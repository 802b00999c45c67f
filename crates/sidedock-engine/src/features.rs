//! Which engine features are active for a given configuration.
//!
//! Derived from a full config snapshot plus registry occupancy every time
//! either changes, so the scheduler never consults individual settings when
//! deciding what to run.

use std::time::Duration;

use sidedock_config::DockConfig;

/// The resolved set of active features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveFeatures {
    /// The slow timer should run.
    pub simulate: bool,
    pub slow_interval: Option<Duration>,
    /// Set only when it is strictly faster than `slow_interval`.
    pub fast_interval: Option<Duration>,
    pub focus_listener: bool,
    pub removed_listener: bool,
}

impl ActiveFeatures {
    pub fn derive(config: &DockConfig, has_tracked_windows: bool) -> Self {
        let docking = &config.docking;
        let slow_interval = docking
            .slow_interval()
            .filter(|_| docking.enabled && has_tracked_windows);
        let simulate = slow_interval.is_some();
        let fast_interval = slow_interval.and_then(|slow| {
            docking
                .fast_interval()
                .filter(|fast| *fast < slow)
        });

        Self {
            simulate,
            slow_interval,
            fast_interval,
            focus_listener: simulate && (docking.auto_focus || docking.refocus_parent),
            removed_listener: simulate && docking.auto_close,
        }
    }

    /// Derive with simulation forced off, tearing everything down.
    pub fn idle() -> Self {
        Self::default()
    }
}
