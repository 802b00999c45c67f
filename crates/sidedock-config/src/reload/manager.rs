//! Core reload manager implementation.
//!
//! Contains the [`ReloadManager`] struct that loads the config file once,
//! wraps it in a [`SharedConfig`], and keeps that handle current as the
//! file changes on disk.

use crate::schema::DockConfig;
use crate::shared::SharedConfig;
use crate::toml_loader;
use crate::validation;
use crate::watcher::ConfigWatcher;
use sidedock_common::ConfigError;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Manages live config reloading.
pub struct ReloadManager {
    config_path: PathBuf,
}

impl ReloadManager {
    /// Load the initial config from `config_path` and start watching it.
    ///
    /// The returned [`SharedConfig`] persists engine write-backs to the same
    /// file and receives every successful reload. A missing or unparsable
    /// file falls back to defaults.
    pub async fn start(config_path: PathBuf) -> SharedConfig {
        let initial = match toml_loader::load_from_path(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load config: {e}, using defaults");
                DockConfig::default()
            }
        };

        let shared = SharedConfig::new(initial).with_persist_path(config_path.clone());

        let manager = ReloadManager { config_path };
        let target = shared.clone();
        tokio::spawn(async move {
            manager.run_watch_loop(target).await;
        });

        shared
    }

    /// Internal watch loop that reloads config on file changes.
    async fn run_watch_loop(&self, shared: SharedConfig) {
        let watcher = match ConfigWatcher::new(self.config_path.clone()) {
            Ok(w) => w,
            Err(e) => {
                error!("failed to create config watcher: {e}");
                return;
            }
        };

        let (change_tx, mut change_rx) = broadcast::channel::<()>(16);

        tokio::spawn(async move {
            if let Err(e) = watcher.watch(change_tx).await {
                error!("config watcher error: {e}");
            }
        });

        loop {
            match change_rx.recv().await {
                Ok(()) => {
                    info!("reloading config from {}", self.config_path.display());
                    match self.reload_config() {
                        Ok(config) => {
                            if shared.replace(config) {
                                info!("config reloaded");
                            }
                        }
                        Err(e) => warn!("config reload failed: {e}"),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("config watcher lagged by {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("config watcher channel closed");
                    break;
                }
            }
        }
    }

    /// Reload config from disk. Unlike the initial load, a reload that fails
    /// validation is rejected and the running config is kept.
    fn reload_config(&self) -> Result<DockConfig, ConfigError> {
        let config = toml_loader::load_from_path(&self.config_path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
