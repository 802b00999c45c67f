//! Null-object capability implementations.
//!
//! Substituted when the host lacks a capability. Queries return empty
//! results and storage writes are dropped silently.

use async_trait::async_trait;
use serde_json::Value;
use sidedock_common::errors::PlatformError;
use sidedock_common::{CommandOrigin, TabInfo, WindowEvent, WindowId, WindowInfo};
use tokio::sync::broadcast;

use super::{
    CreateWindow, Result, TabTreeProvider, WindowService, WindowUpdate, WindowValueStore,
};

/// A window service with no windows.
pub struct NoopWindowService;

#[async_trait]
impl WindowService for NoopWindowService {
    async fn get(&self, id: WindowId, _with_tabs: bool) -> Result<WindowInfo> {
        Err(PlatformError::WindowNotFound(id))
    }

    async fn list(&self, _with_tabs: bool) -> Result<Vec<WindowInfo>> {
        Ok(Vec::new())
    }

    async fn update(&self, id: WindowId, _update: WindowUpdate) -> Result<WindowInfo> {
        Err(PlatformError::WindowNotFound(id))
    }

    async fn create(&self, _request: CreateWindow) -> Result<WindowInfo> {
        Err(PlatformError::NotSupported("window creation".into()))
    }

    async fn remove(&self, id: WindowId, _origin: CommandOrigin) -> Result<()> {
        Err(PlatformError::WindowNotFound(id))
    }

    async fn last_focused(&self) -> Result<Option<WindowId>> {
        Ok(None)
    }

    fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        // Sender dropped immediately: receivers observe a closed channel.
        let (_tx, rx) = broadcast::channel(1);
        rx
    }
}

/// Durable storage that stores nothing.
pub struct NoopValueStore;

#[async_trait]
impl WindowValueStore for NoopValueStore {
    async fn get_value(&self, _id: WindowId, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn set_value(&self, _id: WindowId, _key: &str, _value: Value) -> Result<()> {
        Ok(())
    }

    async fn remove_value(&self, _id: WindowId, _key: &str) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// A tab-tree provider that never answers.
pub struct NoopTabTree;

#[async_trait]
impl TabTreeProvider for NoopTabTree {
    async fn ping(&self) -> Result<()> {
        Err(PlatformError::CollaboratorUnavailable("no tab-tree provider".into()))
    }

    async fn tabs(&self, _window: WindowId) -> Result<Vec<TabInfo>> {
        Err(PlatformError::CollaboratorUnavailable("no tab-tree provider".into()))
    }

    fn is_available(&self) -> bool {
        false
    }
}
