//! The docking engine.
//!
//! [`DockingEngine`] owns the registry, the session identity store, the
//! poll timers and the event listeners. It is a cheap handle; clones share
//! one engine. Dropping the last clone, or calling
//! [`shutdown`](DockingEngine::shutdown), stops every background task.

mod docked;
mod focus;
mod layout_pass;
mod lifecycle;
mod scheduler;
mod types;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use sidedock_common::{CommandOrigin, DockError, WindowId, WindowInfo};
use sidedock_config::{DockConfig, SharedConfig};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use types::{CheckOptions, PollingState};
pub(crate) use types::Inner;

use crate::features::ActiveFeatures;
use crate::platform::HostCapabilities;
use crate::reattach::{Discovery, ReattachReport, StartupKind};
use crate::registry::{TrackedWindow, WindowRegistry};
use crate::session::SessionIdentityStore;

impl Drop for Inner {
    fn drop(&mut self) {
        self.run_token().cancel();
    }
}

/// Handle to a running docking engine.
#[derive(Clone)]
pub struct DockingEngine {
    inner: Arc<Inner>,
}

impl DockingEngine {
    pub fn new(host: HostCapabilities, config: SharedConfig) -> Self {
        let session_data = config.snapshot().startup.session_data;
        let sessions = SessionIdentityStore::new(host.values.clone(), session_data);
        Self {
            inner: Arc::new(Inner {
                host,
                config,
                registry: WindowRegistry::new(),
                sessions,
                dirty: AtomicBool::new(false),
                activity: Mutex::new(Default::default()),
                focus: Mutex::new(Default::default()),
                run: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Start following configuration changes and window events. Timers
    /// only start once windows are tracked. An engine that was shut down
    /// can be started again.
    pub async fn start(&self) {
        let inner = &self.inner;
        let run = {
            let mut run = inner.run.lock().unwrap_or_else(|e| e.into_inner());
            if run.is_cancelled() {
                *run = CancellationToken::new();
            }
            run.clone()
        };
        let session_listener = inner.spawn_session_listener();
        let rx = inner.config.subscribe();
        tokio::spawn(watch_config(
            Arc::downgrade(inner),
            rx,
            session_listener,
            run.child_token(),
        ));
        inner.observe_all_windows().await;
        inner.check(CheckOptions::default()).await;
        info!(capabilities = ?inner.host, "docking engine started");
    }

    /// Stop every timer and listener. Tracked windows are kept.
    pub fn shutdown(&self) {
        self.inner.run_token().cancel();
        *self.inner.activity() = Default::default();
        debug!("docking engine stopped");
    }

    pub fn config(&self) -> &SharedConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &HostCapabilities {
        &self.inner.host
    }

    /// Track `satellite` as docked to `anchor`.
    pub async fn add_tracked_window(
        &self,
        satellite: WindowId,
        anchor: WindowId,
    ) -> Result<(), DockError> {
        self.inner
            .add_tracked(TrackedWindow::new(satellite, anchor))
            .await
    }

    /// Stop tracking `satellite` without touching the window.
    pub fn remove_tracked_window(&self, satellite: WindowId) -> Option<TrackedWindow> {
        let removed = self.inner.registry.remove(satellite);
        self.inner.apply_features(false);
        removed
    }

    pub fn is_docked_window(&self, id: WindowId) -> bool {
        self.inner.registry.is_tracked(id)
    }

    pub fn is_parent_window(&self, id: WindowId) -> bool {
        self.inner.registry.is_anchor(id)
    }

    pub fn tracked_windows(&self) -> Vec<TrackedWindow> {
        self.inner.registry.snapshot()
    }

    /// Re-derive which timers and listeners should run.
    pub async fn check_simulate_docking(&self, options: CheckOptions) {
        self.inner.check(options).await;
    }

    pub fn polling_state(&self) -> PollingState {
        self.inner.activity().polling_state()
    }

    pub fn active_features(&self) -> ActiveFeatures {
        self.inner.activity().features
    }

    /// Open a satellite beside `anchor` and track it.
    pub async fn open_docked_window(&self, anchor: WindowId) -> Result<WindowInfo, DockError> {
        self.inner
            .open_docked_window(anchor, CommandOrigin::Lifecycle)
            .await
    }

    /// Classify every open window into satellites and possible anchors.
    pub async fn find_sidebar_windows(&self) -> Result<Discovery, DockError> {
        let windows = self.inner.host.windows.list(true).await?;
        let config = self.inner.config.snapshot();
        Ok(self.inner.discover(windows, &config).await)
    }

    pub async fn reattach_at_startup(&self, kind: StartupKind) -> Result<ReattachReport, DockError> {
        self.inner.reattach_at_startup(kind).await
    }

    /// Switch session identity persistence on or off.
    pub async fn set_session_persistence(&self, enabled: bool) {
        self.inner.set_session_persistence(enabled).await;
    }
}

impl std::fmt::Debug for DockingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockingEngine")
            .field("tracked", &self.inner.registry.len())
            .field("polling", &self.polling_state())
            .finish()
    }
}

/// Re-evaluate the engine on every configuration change. Holds the session
/// listener for as long as it runs.
async fn watch_config(
    engine: std::sync::Weak<Inner>,
    mut rx: watch::Receiver<DockConfig>,
    _session_listener: types::Listener,
    cancel: CancellationToken,
) {
    let mut previous = rx.borrow_and_update().clone();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let current = rx.borrow_and_update().clone();
        let Some(inner) = engine.upgrade() else { break };
        if previous.startup.session_data != current.startup.session_data {
            inner.set_session_persistence(current.startup.session_data).await;
        }
        inner.check(CheckOptions::default()).await;
        previous = current;
    }
}
