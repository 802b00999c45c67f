//! One reconciliation pass over every tracked window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use sidedock_common::errors::PlatformError;
use sidedock_common::{CommandOrigin, DockError, Geometry, WindowId, WindowInfo, WindowState};
use sidedock_config::schema::DockingConfig;
use sidedock_config::DockConfig;
use tracing::{debug, info, warn};

use super::types::Inner;
use crate::layout::{DockLayout, SlotInput, WidthSync};
use crate::platform::WindowUpdate;
use crate::registry::TrackedWindow;

/// Upper bound for waiting on siblings to close before the first sibling
/// closes itself.
const SIBLING_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A satellite's place among the satellites of its anchor.
#[derive(Debug, Clone, Default)]
struct Slot {
    ordinal: usize,
    sibling_count: usize,
    /// Last observed geometry of satellites with a lower ordinal.
    earlier: Vec<Geometry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotOutcome {
    Unchanged,
    Updated,
    Skipped,
    /// The record was removed from the registry.
    Dropped,
}

/// Treat a vanished window as absent; anything else is a failure.
fn found(result: Result<WindowInfo, PlatformError>) -> Result<Option<WindowInfo>, DockError> {
    match result {
        Ok(window) => Ok(Some(window)),
        Err(e) if e.is_transient() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Inner {
    /// Reconcile every tracked window once. Failures are logged per window
    /// and trigger a revalidation sweep.
    pub(crate) async fn layout_pass(self: &Arc<Self>) {
        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            self.apply_features(false);
            return;
        }
        let config = self.config.snapshot();
        let layout = DockLayout::from_config(&config);
        let group_siblings = config.docking.tiling() || config.docking.restore_state;

        let active: Vec<&TrackedWindow> = snapshot.iter().filter(|r| !r.forget).collect();
        let mut ordinals: HashMap<WindowId, usize> = HashMap::new();
        let jobs = active.iter().map(|record| {
            let slot = if group_siblings {
                let next = ordinals.entry(record.anchor_id).or_insert(0);
                let ordinal = *next;
                *next += 1;
                let siblings: Vec<&&TrackedWindow> = active
                    .iter()
                    .filter(|r| r.anchor_id == record.anchor_id)
                    .collect();
                Slot {
                    ordinal,
                    sibling_count: siblings.len(),
                    earlier: siblings
                        .iter()
                        .take(ordinal)
                        .filter_map(|r| r.satellite.as_ref().map(|w| w.geometry))
                        .collect(),
                }
            } else {
                Slot {
                    sibling_count: 1,
                    ..Slot::default()
                }
            };
            self.reconcile((*record).clone(), slot, &config, &layout)
        });
        let results = join_all(jobs).await;

        let mut failed = false;
        let mut dropped = false;
        for (record, result) in active.iter().zip(results) {
            match result {
                Ok(SlotOutcome::Dropped) => dropped = true,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        satellite = %record.satellite_id,
                        anchor = %record.anchor_id,
                        error = %e,
                        "failed to simulate docking"
                    );
                    failed = true;
                }
            }
        }
        if failed {
            self.revalidate().await;
        }
        if failed || dropped {
            self.apply_features(false);
        }
    }

    async fn reconcile(
        self: &Arc<Self>,
        record: TrackedWindow,
        slot: Slot,
        config: &DockConfig,
        layout: &DockLayout,
    ) -> Result<SlotOutcome, DockError> {
        let docking = &config.docking;
        let windows = &self.host.windows;
        let id = record.satellite_id;

        let (satellite, anchor) =
            tokio::join!(windows.get(id, false), windows.get(record.anchor_id, false));
        let (satellite, anchor) = (found(satellite)?, found(anchor)?);

        if !self.registry.get(id).is_some_and(|r| !r.forget) {
            return Ok(SlotOutcome::Skipped);
        }
        self.registry.update(id, |r| {
            if satellite.is_some() {
                r.satellite.clone_from(&satellite);
            }
            if anchor.is_some() {
                r.anchor.clone_from(&anchor);
            }
        });

        if satellite.is_some() && anchor.is_none() && docking.auto_close {
            self.close_orphan(&record, &slot, docking).await;
            self.registry.remove(id);
            return Ok(SlotOutcome::Dropped);
        }
        let (Some(mut satellite), Some(anchor)) = (satellite, anchor) else {
            self.registry.remove(id);
            return Ok(SlotOutcome::Dropped);
        };

        let mut outcome = SlotOutcome::Unchanged;
        match anchor.state {
            WindowState::Minimized => {
                if docking.minimize && satellite.state != WindowState::Minimized {
                    self.apply(id, WindowUpdate::state(WindowState::Minimized, CommandOrigin::Layout))
                        .await?;
                    return Ok(SlotOutcome::Updated);
                }
                return Ok(SlotOutcome::Skipped);
            }
            WindowState::Normal => {}
            // Leave maximized and fullscreen layouts to the host.
            _ => return Ok(SlotOutcome::Skipped),
        }

        if satellite.state == WindowState::Minimized {
            if !docking.minimize {
                return Ok(SlotOutcome::Skipped);
            }
            self.apply(id, WindowUpdate::state(WindowState::Normal, CommandOrigin::Layout))
                .await?;
            outcome = SlotOutcome::Updated;
            satellite = windows.get(id, false).await?;
        }

        if !docking.control_position {
            return Ok(outcome);
        }

        let synced = self.registry.get(id).and_then(|r| r.synced_width);
        let configured = self.config.window_width();
        let target_width = match layout.sync_width(configured, satellite.geometry.width, synced) {
            WidthSync::Keep => None,
            WidthSync::Request(width) => {
                self.registry.update(id, |r| r.synced_width = Some(width));
                Some(width)
            }
            WidthSync::Adopt(width) => {
                info!(satellite = %id, width, "satellite resized, adopting new width");
                self.config.set_window_width(width).await;
                self.registry.update(id, |r| r.synced_width = Some(width));
                None
            }
        };
        let uniform_width = docking
            .sync_width
            .then(|| self.config.window_width())
            .filter(|w| *w > 0);

        let placement = layout.place(&SlotInput {
            satellite: satellite.geometry,
            anchor: anchor.geometry,
            ordinal: slot.ordinal,
            sibling_count: slot.sibling_count,
            earlier_siblings: &slot.earlier,
            target_width,
            uniform_width,
        });
        if placement.differs_from(&satellite.geometry) {
            self.apply(id, placement.to_update(CommandOrigin::Layout)).await?;
            outcome = SlotOutcome::Updated;
        }
        Ok(outcome)
    }

    async fn apply(&self, id: WindowId, update: WindowUpdate) -> Result<(), DockError> {
        self.host.windows.update(id, update).await?;
        self.mark_dirty();
        Ok(())
    }

    /// The anchor of `record` is gone. Close the satellite unless the user
    /// put other tabs into it.
    async fn close_orphan(&self, record: &TrackedWindow, slot: &Slot, docking: &DockingConfig) {
        let id = record.satellite_id;
        self.registry.update(id, |r| r.forget = true);

        let satellite = match self.host.windows.get(id, true).await {
            Ok(window) => window,
            Err(e) => {
                debug!(satellite = %id, error = %e, "orphaned satellite already gone");
                return;
            }
        };
        if satellite.tab_count().unwrap_or(0) > 1 {
            info!(satellite = %id, "anchor closed, keeping satellite with extra tabs open");
            return;
        }

        if docking.restore_state && slot.ordinal == 0 {
            if let Some(anchor) = &record.anchor {
                if self.is_last_window(record, docking).await {
                    self.restore_to_anchor(&satellite, anchor, slot).await;
                }
            }
        }

        match self.host.windows.remove(id, CommandOrigin::Lifecycle).await {
            Ok(()) => info!(satellite = %id, anchor = %record.anchor_id, "closed orphaned satellite"),
            Err(e) => warn!(satellite = %id, error = %e, "failed to auto close satellite"),
        }
    }

    /// Whether the satellite should take over its anchor's place: always,
    /// unless restricted to when nothing but satellites remains open.
    async fn is_last_window(&self, record: &TrackedWindow, docking: &DockingConfig) -> bool {
        if !docking.restore_state_only_last_window {
            return true;
        }
        let windows = self.host.windows.list(false).await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to list windows before closing satellite");
            Vec::new()
        });
        !windows
            .iter()
            .any(|w| w.id != record.anchor_id && !self.registry.is_tracked(w.id))
    }

    /// Give the satellite its anchor's last geometry and state, then wait
    /// for the other satellites of that anchor to close first.
    async fn restore_to_anchor(&self, satellite: &WindowInfo, anchor: &WindowInfo, slot: &Slot) {
        let windows = &self.host.windows;
        let update = WindowUpdate::geometry(anchor.geometry, CommandOrigin::Lifecycle);
        if let Err(e) = windows.update(satellite.id, update).await {
            debug!(satellite = %satellite.id, error = %e, "failed to restore anchor geometry");
        }
        if anchor.state != satellite.state {
            let update = WindowUpdate::state(anchor.state, CommandOrigin::Lifecycle);
            if let Err(e) = windows.update(satellite.id, update).await {
                debug!(satellite = %satellite.id, error = %e, "failed to restore anchor state");
            }
        }

        if slot.sibling_count > 1 {
            let (me, anchor_id) = (satellite.id, anchor.id);
            let closed = self
                .registry
                .wait_until(SIBLING_CLOSE_TIMEOUT, |records| {
                    !records
                        .iter()
                        .any(|r| r.anchor_id == anchor_id && r.satellite_id != me)
                })
                .await;
            if !closed {
                warn!(satellite = %me, "timed out waiting for sibling satellites to close");
            }
        }
    }
}
