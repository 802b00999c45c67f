//! Window lifecycle reactions: closing cascades and session identity
//! bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use sidedock_common::{WindowEvent, WindowId};
use tracing::{debug, info, warn};

use super::types::{Inner, Listener};

/// Host notifications can arrive before the host's own state reflects the
/// removal; the follow-up pass runs this long after the first.
const REMOVAL_SETTLE_DELAY: Duration = Duration::from_millis(100);

impl Inner {
    pub(crate) fn spawn_removed_listener(self: &Arc<Self>) -> Listener {
        self.spawn_event_listener("removed", |inner, event| async move {
            if let WindowEvent::Removed(window) = event {
                if inner.registry.involves(window) {
                    tokio::spawn(async move { inner.on_window_removed(window).await });
                }
            }
        })
    }

    /// A window that is part of a pair was closed. Tick right away, then
    /// once more after a short delay, so that cascades such as an anchor
    /// with several satellites settle within two passes.
    pub(crate) async fn on_window_removed(self: &Arc<Self>, window: WindowId) {
        debug!(%window, "docked window removed");
        self.mark_dirty();
        self.slow_tick().await;
        tokio::time::sleep(REMOVAL_SETTLE_DELAY).await;
        if self.is_stopped() {
            return;
        }
        self.layout_pass().await;
    }

    /// Keeps session identities in step with window creation and removal.
    /// Runs for the lifetime of the engine.
    pub(crate) fn spawn_session_listener(self: &Arc<Self>) -> Listener {
        self.spawn_event_listener("session", |inner, event| async move {
            match event {
                WindowEvent::Created(window) if inner.sessions.is_active() => {
                    tokio::spawn(async move {
                        inner.sessions.observe(window).await;
                    });
                }
                WindowEvent::Removed(window) => inner.sessions.forget(window),
                _ => {}
            }
        })
    }

    /// Assign identities to every open window.
    pub(crate) async fn observe_all_windows(&self) {
        if !self.sessions.is_active() {
            return;
        }
        match self.host.windows.list(false).await {
            Ok(windows) => {
                join_all(windows.iter().map(|w| self.sessions.observe(w.id))).await;
            }
            Err(e) => warn!(error = %e, "failed to list windows for session data"),
        }
    }

    /// Turn session persistence on or off at runtime. Enabling links every
    /// tracked pair; disabling clears stored identities from open windows.
    pub(crate) async fn set_session_persistence(&self, enabled: bool) {
        if self.sessions.set_enabled(enabled) == enabled {
            return;
        }
        info!(enabled, "session data persistence changed");
        if enabled {
            self.observe_all_windows().await;
            for record in self.registry.snapshot() {
                self.sessions
                    .set_parent(record.satellite_id, record.anchor_id)
                    .await;
            }
            return;
        }
        match self.host.windows.list(false).await {
            Ok(windows) => {
                join_all(windows.iter().map(|w| self.sessions.clear(w.id))).await;
            }
            Err(e) => warn!(error = %e, "failed to list windows to clear session data"),
        }
    }
}
