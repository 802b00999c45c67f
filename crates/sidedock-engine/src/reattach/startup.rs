//! Re-establishing docking after a restart.

use std::sync::Arc;

use serde::Serialize;
use sidedock_common::{CommandOrigin, DockError, WindowId, WindowInfo, WindowKind};
use sidedock_config::DockConfig;
use tracing::{debug, info, warn};

use super::discovery::{find_sidebar_windows, Discovery, DiscoveryOptions};
use crate::companion::CompanionUrls;
use crate::engine::Inner;
use crate::platform::CreateWindow;
use crate::registry::TrackedWindow;

/// What kind of restart preceded reattachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupKind {
    /// The host itself restarted; every window id changed and satellites
    /// point at anchors that no longer exist.
    HostRestart,
    /// Only this process restarted; open windows are still valid.
    ProcessRestart,
}

/// What reattachment did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReattachReport {
    /// Pairs registered as they were found, `(satellite, anchor)`.
    pub registered: Vec<(WindowId, WindowId)>,
    /// Satellites closed and recreated, `(old, new, anchor)`.
    pub reopened: Vec<(WindowId, WindowId, WindowId)>,
    /// Satellites closed because no anchor was found.
    pub closed: Vec<WindowId>,
    /// Satellites opened for anchors that had none.
    pub opened: Vec<WindowId>,
    /// Blank window created so that closing satellites leaves one open.
    pub created_anchor: Option<WindowId>,
}

impl Inner {
    pub(crate) async fn discover(&self, all_windows: Vec<WindowInfo>, config: &DockConfig) -> Discovery {
        let options = DiscoveryOptions {
            collaborator_timeout: config.startup.collaborator_timeout(),
            gap: config.docking.space_between,
            dock_right: config.docking.dock_right,
            use_session_data: config.startup.session_data,
        };
        let companion = CompanionUrls::from_config(&config.companion);
        find_sidebar_windows(&self.host, &self.sessions, &companion, all_windows, &options).await
    }

    pub(crate) async fn reattach_at_startup(
        self: &Arc<Self>,
        kind: StartupKind,
    ) -> Result<ReattachReport, DockError> {
        let config = self.config.snapshot();
        let mut report = ReattachReport::default();
        if !config.docking.enabled || !config.startup.reattach_enabled() {
            debug!("startup reattachment disabled");
            return Ok(report);
        }

        let all_windows = self.host.windows.list(true).await?;
        let discovery = self.discover(all_windows.clone(), &config).await;

        if config.startup.auto_detect {
            let only_satellites = !discovery.satellites.is_empty()
                && discovery.possible_anchors.is_empty()
                && all_windows.iter().all(|w| discovery.is_satellite(w.id));
            if only_satellites {
                let blank = self
                    .host
                    .windows
                    .create(CreateWindow {
                        kind: WindowKind::Normal,
                        origin: CommandOrigin::Startup,
                        ..Default::default()
                    })
                    .await?;
                info!(window = %blank.id, "opened a window so closing satellites leaves one open");
                report.created_anchor = Some(blank.id);
            }

            for found in &discovery.satellites {
                let satellite = found.window.id;
                let Some(anchor) = &found.anchor else {
                    if kind == StartupKind::HostRestart && self.close_satellite(satellite).await {
                        report.closed.push(satellite);
                    }
                    continue;
                };
                match kind {
                    StartupKind::HostRestart => {
                        self.close_satellite(satellite).await;
                        match self.open_docked_window(anchor.id, CommandOrigin::Startup).await {
                            Ok(window) => report.reopened.push((satellite, window.id, anchor.id)),
                            Err(e) => {
                                warn!(anchor = %anchor.id, error = %e, "failed to reopen docked window")
                            }
                        }
                    }
                    StartupKind::ProcessRestart => {
                        if self.registry.is_tracked(satellite) {
                            continue;
                        }
                        let record = TrackedWindow::new(satellite, anchor.id)
                            .with_windows(Some(found.window.clone()), Some(anchor.clone()));
                        match self.add_tracked(record).await {
                            Ok(()) => report.registered.push((satellite, anchor.id)),
                            Err(e) => warn!(%satellite, error = %e, "failed to track docked window"),
                        }
                    }
                }
            }
            self.sessions.force_persist_all().await;
        }

        if config.startup.auto_open && kind == StartupKind::HostRestart {
            for anchor in &discovery.possible_anchors {
                if self.registry.is_anchor(anchor.id) {
                    continue;
                }
                match self.open_docked_window(anchor.id, CommandOrigin::Startup).await {
                    Ok(window) => report.opened.push(window.id),
                    Err(e) => warn!(anchor = %anchor.id, error = %e, "failed to open docked window"),
                }
            }
        }

        info!(
            ?kind,
            registered = report.registered.len(),
            reopened = report.reopened.len(),
            closed = report.closed.len(),
            opened = report.opened.len(),
            "startup reattachment finished"
        );
        Ok(report)
    }

    async fn close_satellite(&self, satellite: WindowId) -> bool {
        match self.host.windows.remove(satellite, CommandOrigin::Startup).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%satellite, error = %e, "failed to close stale satellite");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HostCapabilities, VirtualHost};
    use crate::DockingEngine;
    use sidedock_common::Geometry;
    use sidedock_config::SharedConfig;

    const ANCHOR: Geometry = Geometry {
        left: 500,
        top: 100,
        width: 800,
        height: 600,
    };

    fn engine_with(host: &Arc<VirtualHost>, edit: impl FnOnce(&mut DockConfig)) -> DockingEngine {
        let mut config = DockConfig::default();
        config.window.width = 235;
        config.startup.collaborator_timeout_ms = 2_000;
        edit(&mut config);
        DockingEngine::new(
            HostCapabilities::from_virtual_host(host.clone()),
            SharedConfig::new(config),
        )
    }

    fn companion_url(anchor: WindowId) -> String {
        CompanionUrls::from_config(&DockConfig::default().companion)
            .for_anchor(anchor)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_reattachment_does_nothing() {
        let host = Arc::new(VirtualHost::new());
        host.open_window(WindowKind::Normal, ANCHOR, &["https://example.com/"]);
        let engine = engine_with(&host, |_| {});

        let report = engine
            .reattach_at_startup(StartupKind::HostRestart)
            .await
            .unwrap();
        assert_eq!(report, ReattachReport::default());
        assert_eq!(host.windows().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn process_restart_registers_pairs_from_session_data() {
        let host = Arc::new(VirtualHost::new());
        let anchor = host.open_window(WindowKind::Normal, ANCHOR, &["https://example.com/"]);
        let previous = engine_with(&host, |_| {});
        let satellite = previous.open_docked_window(anchor).await.unwrap().id;
        previous.shutdown();
        drop(previous);

        let engine = engine_with(&host, |c| c.startup.auto_detect = true);
        let report = engine
            .reattach_at_startup(StartupKind::ProcessRestart)
            .await
            .unwrap();

        assert_eq!(report.registered, vec![(satellite, anchor)]);
        assert!(report.reopened.is_empty());
        assert!(engine.is_docked_window(satellite));
        assert!(host.window(satellite).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn process_restart_pairs_companion_pages_by_position() {
        let host = Arc::new(VirtualHost::new());
        let anchor = host.open_window(WindowKind::Normal, ANCHOR, &["https://example.com/"]);
        let url = companion_url(anchor);
        let satellite =
            host.open_window(WindowKind::Popup, Geometry::new(278, 100, 235, 600), &[url.as_str()]);
        let engine = engine_with(&host, |c| {
            c.startup.auto_detect = true;
            c.startup.session_data = false;
        });

        let report = engine
            .reattach_at_startup(StartupKind::ProcessRestart)
            .await
            .unwrap();

        assert_eq!(report.registered, vec![(satellite, anchor)]);
        assert!(engine.is_parent_window(anchor));
    }

    #[tokio::test(start_paused = true)]
    async fn host_restart_reopens_satellites_beside_their_anchor() {
        let host = Arc::new(VirtualHost::new());
        let anchor = host.open_window(WindowKind::Normal, ANCHOR, &["https://example.com/"]);
        let previous = engine_with(&host, |_| {});
        let satellite = previous.open_docked_window(anchor).await.unwrap().id;
        previous.shutdown();
        drop(previous);

        let remap = host.restart();
        let (satellite, anchor) = (remap[&satellite], remap[&anchor]);
        let engine = engine_with(&host, |c| c.startup.auto_detect = true);
        let report = engine
            .reattach_at_startup(StartupKind::HostRestart)
            .await
            .unwrap();

        assert_eq!(report.reopened.len(), 1);
        let (old, new, reopened_for) = report.reopened[0];
        assert_eq!((old, reopened_for), (satellite, anchor));
        assert!(host.window(old).is_none());
        assert!(host.window(new).is_some());
        assert_eq!(engine.tracked_windows().len(), 1);
        assert!(engine.is_docked_window(new));
        assert!(report.closed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lone_satellites_get_a_blank_window_before_closing() {
        let host = Arc::new(VirtualHost::new());
        let url = companion_url(WindowId(99));
        let satellite =
            host.open_window(WindowKind::Popup, Geometry::new(0, 0, 235, 600), &[url.as_str()]);
        let engine = engine_with(&host, |c| {
            c.startup.auto_detect = true;
            c.startup.session_data = false;
        });

        let report = engine
            .reattach_at_startup(StartupKind::HostRestart)
            .await
            .unwrap();

        let blank = report.created_anchor.expect("a blank window should be opened");
        assert_eq!(report.closed, vec![satellite]);
        let remaining: Vec<WindowId> = host.windows().iter().map(|w| w.id).collect();
        assert_eq!(remaining, vec![blank]);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_open_docks_a_satellite_to_every_anchor() {
        let host = Arc::new(VirtualHost::new());
        let first = host.open_window(WindowKind::Normal, ANCHOR, &["https://example.com/"]);
        let second = host.open_window(
            WindowKind::Normal,
            Geometry::new(1400, 0, 800, 600),
            &["https://example.org/", "https://example.net/"],
        );
        let engine = engine_with(&host, |c| c.startup.auto_open = true);

        let report = engine
            .reattach_at_startup(StartupKind::HostRestart)
            .await
            .unwrap();

        assert_eq!(report.opened.len(), 2);
        assert!(engine.is_parent_window(first));
        assert!(engine.is_parent_window(second));

        let again = engine
            .reattach_at_startup(StartupKind::HostRestart)
            .await
            .unwrap();
        assert!(again.opened.is_empty());
    }
}
