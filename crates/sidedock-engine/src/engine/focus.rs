//! Focus coordination.
//!
//! Focusing an anchor raises its satellites; focusing a satellite hands
//! focus back to its anchor. Every focus command is tagged
//! [`CommandOrigin::Focus`], and notifications carrying that origin are
//! recorded but never acted on, so the coordinator cannot trigger itself.

use std::sync::Arc;
use std::time::Duration;

use sidedock_common::{CommandOrigin, WindowEvent, WindowId, WindowState};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::types::{FocusState, Inner, Listener};
use crate::platform::WindowUpdate;

/// An anchor that lost focus this recently is considered to still have it.
const REFOCUS_DEBOUNCE: Duration = Duration::from_millis(150);

impl Inner {
    pub(crate) fn spawn_focus_listener(self: &Arc<Self>) -> Listener {
        *self.focus() = FocusState::default();

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            if let Ok(Some(window)) = inner.host.windows.last_focused().await {
                inner.focus().last_focused.get_or_insert(window);
            }
        });

        self.spawn_event_listener("focus", |inner, event| async move {
            if let WindowEvent::FocusChanged { window_id, origin } = event {
                inner.on_focus_changed(window_id, origin).await;
            }
        })
    }

    pub(crate) async fn on_focus_changed(
        self: &Arc<Self>,
        window: Option<WindowId>,
        origin: CommandOrigin,
    ) {
        let (window, previous, lost_at) = {
            let mut focus = self.focus();
            let lost_at = focus.focus_lost_at.replace(Instant::now());
            let Some(window) = window else {
                return;
            };
            (window, focus.last_focused.replace(window), lost_at)
        };
        if origin == CommandOrigin::Focus {
            trace!(%window, "ignoring self-originated focus change");
            return;
        }

        let docking = self.config.snapshot().docking;
        if docking.auto_focus && self.registry.is_anchor(window) {
            self.raise_group(window).await;
            return;
        }
        if !docking.refocus_parent {
            return;
        }
        let Some(anchor_id) = self.registry.anchor_of(window) else {
            return;
        };
        let anchor = match self.host.windows.get(anchor_id, false).await {
            Ok(anchor) => anchor,
            Err(e) => {
                debug!(anchor = %anchor_id, error = %e, "anchor vanished before refocus");
                return;
            }
        };

        if anchor.state == WindowState::Minimized {
            // The anchor was most likely just minimized and this satellite
            // happened to receive focus.
            if docking.minimize {
                self.focus_command(
                    window,
                    WindowUpdate::state(WindowState::Minimized, CommandOrigin::Focus),
                )
                .await;
            }
            return;
        }

        let anchor_just_had_focus = previous == Some(anchor_id)
            && lost_at.is_some_and(|at| at.elapsed() < REFOCUS_DEBOUNCE);
        let sibling_count = self.registry.satellites_of(anchor_id).len();
        if !docking.auto_focus || anchor_just_had_focus || sibling_count <= 1 {
            self.focus_command(anchor_id, WindowUpdate::focus(CommandOrigin::Focus))
                .await;
        } else {
            self.raise_group(anchor_id).await;
        }
    }

    /// Focus each satellite of `anchor`, then the anchor itself so it ends
    /// up on top.
    async fn raise_group(&self, anchor: WindowId) {
        let satellites = self.registry.satellites_of(anchor);
        if satellites.is_empty() {
            return;
        }
        for window in satellites.into_iter().chain(std::iter::once(anchor)) {
            self.focus_command(window, WindowUpdate::focus(CommandOrigin::Focus))
                .await;
        }
    }

    async fn focus_command(&self, window: WindowId, update: WindowUpdate) {
        if let Err(e) = self.host.windows.update(window, update).await {
            debug!(%window, error = %e, "focus command failed");
        }
    }
}
