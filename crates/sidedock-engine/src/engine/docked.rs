//! Opening a new satellite beside an anchor.

use std::sync::Arc;

use sidedock_common::{
    CommandOrigin, DockError, Geometry, WindowId, WindowInfo, WindowKind, WindowState,
};
use sidedock_config::DockConfig;
use tracing::{info, warn};

use super::types::{CheckOptions, Inner};
use crate::companion::CompanionUrls;
use crate::platform::{CreateWindow, WindowUpdate};
use crate::registry::TrackedWindow;

/// Where a satellite of `width` starts out. Returns the satellite's left
/// edge and, when the anchor has to move right to make room, the anchor's
/// new left edge.
fn initial_left(anchor: &Geometry, width: i32, gap: i32, dock_right: bool) -> (i32, Option<i32>) {
    if dock_right {
        return (anchor.right() + gap, None);
    }
    let offset = width + gap;
    let left = anchor.left - offset;
    if left < 0 {
        (0, Some(offset))
    } else {
        (left, None)
    }
}

fn satellite_kind(config: &DockConfig) -> WindowKind {
    match (config.window.popup, config.window.popup_hidden) {
        (true, true) => WindowKind::Panel,
        (true, false) => WindowKind::Popup,
        (false, _) => WindowKind::Normal,
    }
}

impl Inner {
    /// Register a pair and make sure the scheduler is running for it.
    pub(crate) async fn add_tracked(self: &Arc<Self>, record: TrackedWindow) -> Result<(), DockError> {
        let (satellite, anchor) = (record.satellite_id, record.anchor_id);
        self.registry.add(record)?;
        self.mark_dirty();
        self.check(CheckOptions {
            reset: false,
            revalidate: false,
        })
        .await;
        // Switch to fast polling right away.
        let polling = self.activity().slow.is_some();
        if polling {
            self.slow_tick().await;
        }
        self.sessions.set_parent(satellite, anchor).await;
        Ok(())
    }

    pub(crate) async fn open_docked_window(
        self: &Arc<Self>,
        anchor_id: WindowId,
        origin: CommandOrigin,
    ) -> Result<WindowInfo, DockError> {
        let config = self.config.snapshot();
        let windows = &self.host.windows;
        let gap = config.docking.space_between;
        let dock_right = config.docking.dock_right;

        let mut anchor = windows.get(anchor_id, false).await?;
        if anchor.state != WindowState::Normal {
            anchor = windows
                .update(anchor_id, WindowUpdate::state(WindowState::Normal, origin))
                .await?;
        }

        let width = config.window.effective_width();
        let height = if config.window.height > 0 {
            config.window.height
        } else {
            anchor.geometry.height
        };
        let (left, shift_anchor) = initial_left(&anchor.geometry, width, gap, dock_right);
        if let Some(anchor_left) = shift_anchor {
            anchor = windows
                .update(
                    anchor_id,
                    WindowUpdate {
                        left: Some(anchor_left),
                        ..WindowUpdate::new(origin)
                    },
                )
                .await?;
        }

        let url = CompanionUrls::from_config(&config.companion).for_anchor(anchor_id)?;
        let title_preface = Some(config.window.title_preface.clone()).filter(|t| !t.is_empty());
        let satellite = windows
            .create(CreateWindow {
                kind: satellite_kind(&config),
                url: Some(url),
                left: Some(left),
                top: Some(anchor.geometry.top),
                width: Some(width),
                height: Some(height),
                title_preface,
                incognito: anchor.incognito,
                origin,
            })
            .await?;
        info!(satellite = %satellite.id, anchor = %anchor_id, "opened docked window");

        self.add_tracked(
            TrackedWindow::new(satellite.id, anchor_id)
                .with_windows(Some(satellite.clone()), Some(anchor.clone())),
        )
        .await?;

        if config.docking.refocus_parent {
            if let Err(e) = windows
                .update(anchor_id, WindowUpdate::focus(CommandOrigin::Focus))
                .await
            {
                warn!(anchor = %anchor_id, error = %e, "failed to refocus anchor after opening satellite");
            }
        }

        // The host may not have honored the requested width.
        let (left, shift_anchor) =
            initial_left(&anchor.geometry, satellite.geometry.width, gap, dock_right);
        if let Some(anchor_left) = shift_anchor {
            let update = WindowUpdate {
                left: Some(anchor_left),
                ..WindowUpdate::new(origin)
            };
            match windows.update(anchor_id, update).await {
                Ok(moved) => anchor = moved,
                Err(e) => warn!(anchor = %anchor_id, error = %e, "failed to move anchor"),
            }
        }
        let top = anchor.geometry.top;
        if satellite.kind != WindowKind::Normal
            || satellite.geometry.left != left
            || satellite.geometry.top != top
        {
            let update = WindowUpdate {
                left: Some(left),
                top: Some(top),
                ..WindowUpdate::new(origin)
            };
            match windows.update(satellite.id, update).await {
                Ok(_) => self.mark_dirty(),
                Err(e) => warn!(satellite = %satellite.id, error = %e, "failed to position satellite"),
            }
        }
        Ok(satellite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_left_docks_beside_anchor() {
        let anchor = Geometry::new(500, 0, 800, 600);
        assert_eq!(initial_left(&anchor, 235, 10, false), (255, None));
        assert_eq!(initial_left(&anchor, 235, 10, true), (1310, None));
    }

    #[test]
    fn initial_left_moves_anchor_when_off_screen() {
        let anchor = Geometry::new(100, 0, 800, 600);
        assert_eq!(initial_left(&anchor, 235, -13, false), (0, Some(222)));
    }

    #[test]
    fn satellite_kind_follows_popup_settings() {
        let mut config = DockConfig::default();
        assert_eq!(satellite_kind(&config), WindowKind::Panel);
        config.window.popup_hidden = false;
        assert_eq!(satellite_kind(&config), WindowKind::Popup);
        config.window.popup = false;
        assert_eq!(satellite_kind(&config), WindowKind::Normal);
    }
}
