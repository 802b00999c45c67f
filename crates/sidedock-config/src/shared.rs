//! In-process configuration handle shared between the engine, the reload
//! manager, and the binary.
//!
//! Readers take cheap snapshots or subscribe for changes; writers replace
//! the whole config or apply the width-sync write-back. Subscribers are
//! only woken when the value actually changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::schema::DockConfig;
use crate::toml_writer::save_config_to_path;

/// Cloneable handle to the live [`DockConfig`].
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<Inner>,
}

struct Inner {
    tx: watch::Sender<DockConfig>,
    persist_path: Option<PathBuf>,
}

impl SharedConfig {
    pub fn new(config: DockConfig) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self {
            inner: Arc::new(Inner {
                tx,
                persist_path: None,
            }),
        }
    }

    /// Persist write-backs (see [`set_window_width`](Self::set_window_width))
    /// to `path`.
    pub fn with_persist_path(self, path: PathBuf) -> Self {
        let config = self.snapshot();
        let (tx, _rx) = watch::channel(config);
        Self {
            inner: Arc::new(Inner {
                tx,
                persist_path: Some(path),
            }),
        }
    }

    pub fn persist_path(&self) -> Option<&Path> {
        self.inner.persist_path.as_deref()
    }

    /// Clone of the current config.
    pub fn snapshot(&self) -> DockConfig {
        self.inner.tx.borrow().clone()
    }

    /// Configured satellite width, without cloning the whole config.
    pub fn window_width(&self) -> i32 {
        self.inner.tx.borrow().window.width
    }

    pub fn subscribe(&self) -> watch::Receiver<DockConfig> {
        self.inner.tx.subscribe()
    }

    /// Swap in a new config. Returns `true` if it differed from the current one.
    pub fn replace(&self, config: DockConfig) -> bool {
        self.inner.tx.send_if_modified(|current| {
            if *current == config {
                false
            } else {
                *current = config;
                true
            }
        })
    }

    /// Apply an in-place edit. Returns `true` if anything changed.
    pub fn update(&self, edit: impl FnOnce(&mut DockConfig)) -> bool {
        self.inner.tx.send_if_modified(|current| {
            let before = current.clone();
            edit(current);
            *current != before
        })
    }

    /// Record the width the user last resized a satellite to, so every
    /// satellite converges on it. Persisted when a path is attached.
    pub async fn set_window_width(&self, width: i32) -> bool {
        let changed = self.update(|config| config.window.width = width);
        if changed {
            debug!(width, "window width written back");
            self.persist().await;
        }
        changed
    }

    /// Write the current config to the persist path off the async workers.
    async fn persist(&self) {
        let Some(path) = self.inner.persist_path.clone() else {
            return;
        };
        let config = self.snapshot();
        let target = path.clone();
        match tokio::task::spawn_blocking(move || save_config_to_path(&config, &target)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, path = %path.display(), "failed to persist config"),
            Err(e) => warn!(error = %e, "config persist task failed"),
        }
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(DockConfig::default())
    }
}

impl std::fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedConfig")
            .field("config", &*self.inner.tx.borrow())
            .field("persist_path", &self.inner.persist_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_only_reports_real_changes() {
        let shared = SharedConfig::default();
        assert!(!shared.replace(DockConfig::default()));

        let mut config = DockConfig::default();
        config.docking.dock_right = true;
        assert!(shared.replace(config));
        assert!(shared.snapshot().docking.dock_right);
    }

    #[tokio::test]
    async fn subscribers_see_width_write_back() {
        let shared = SharedConfig::default();
        let mut rx = shared.subscribe();

        assert!(shared.set_window_width(300).await);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().window.width, 300);

        // Same width again is not a change.
        assert!(!shared.set_window_width(300).await);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn width_write_back_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let shared = SharedConfig::default().with_persist_path(path.clone());

        assert!(shared.set_window_width(280).await);

        let text = std::fs::read_to_string(&path).unwrap();
        let on_disk: DockConfig = toml::from_str(&text).unwrap();
        assert_eq!(on_disk.window.width, 280);
    }

    #[test]
    fn clones_share_state() {
        let a = SharedConfig::default();
        let b = a.clone();
        a.update(|c| c.docking.tile_height = true);
        assert!(b.snapshot().docking.tile_height);
    }
}
