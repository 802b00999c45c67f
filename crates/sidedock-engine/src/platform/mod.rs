//! Host capability boundary.
//!
//! The engine never talks to a window system directly. It goes through three
//! capability traits: the window/tab management service (required), a
//! durable per-window value store (optional), and the companion page's
//! tab-tree provider (optional). Missing optional capabilities are replaced
//! by null objects once, in [`HostCapabilities::probe`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sidedock_common::errors::PlatformError;
use sidedock_common::{
    CommandOrigin, Geometry, TabInfo, WindowEvent, WindowId, WindowInfo, WindowKind, WindowState,
};
use tokio::sync::broadcast;
use tracing::info;

pub mod noop;
pub mod virtual_host;

pub use noop::{NoopTabTree, NoopValueStore, NoopWindowService};
pub use virtual_host::{HostCommand, VirtualHost};

pub type Result<T> = std::result::Result<T, PlatformError>;

/// A partial window update. Unset fields are left alone by the host.
///
/// `origin` travels with the command so that the events it causes (most
/// importantly focus changes) can be attributed back to their source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    pub left: Option<i32>,
    pub top: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub state: Option<WindowState>,
    pub focused: Option<bool>,
    pub origin: CommandOrigin,
}

impl WindowUpdate {
    pub fn new(origin: CommandOrigin) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    pub fn focus(origin: CommandOrigin) -> Self {
        Self {
            focused: Some(true),
            ..Self::new(origin)
        }
    }

    pub fn state(state: WindowState, origin: CommandOrigin) -> Self {
        Self {
            state: Some(state),
            ..Self::new(origin)
        }
    }

    /// Move and resize to exactly `geometry`.
    pub fn geometry(geometry: Geometry, origin: CommandOrigin) -> Self {
        Self {
            left: Some(geometry.left),
            top: Some(geometry.top),
            width: Some(geometry.width),
            height: Some(geometry.height),
            ..Self::new(origin)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none()
            && self.top.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.state.is_none()
            && self.focused.is_none()
    }
}

/// Parameters for creating a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateWindow {
    pub kind: WindowKind,
    pub url: Option<String>,
    pub left: Option<i32>,
    pub top: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub title_preface: Option<String>,
    pub incognito: bool,
    pub origin: CommandOrigin,
}

/// The window/tab management service.
#[async_trait]
pub trait WindowService: Send + Sync {
    /// Fetch one window. `with_tabs` populates [`WindowInfo::tabs`].
    async fn get(&self, id: WindowId, with_tabs: bool) -> Result<WindowInfo>;
    /// All open windows in host listing order.
    async fn list(&self, with_tabs: bool) -> Result<Vec<WindowInfo>>;
    async fn update(&self, id: WindowId, update: WindowUpdate) -> Result<WindowInfo>;
    async fn create(&self, request: CreateWindow) -> Result<WindowInfo>;
    async fn remove(&self, id: WindowId, origin: CommandOrigin) -> Result<()>;
    /// The window that currently has (or last had) focus.
    async fn last_focused(&self) -> Result<Option<WindowId>>;
    /// Created/removed/focus-changed notifications.
    fn subscribe(&self) -> broadcast::Receiver<WindowEvent>;
}

/// Durable per-window key/value storage that survives host restarts.
#[async_trait]
pub trait WindowValueStore: Send + Sync {
    async fn get_value(&self, id: WindowId, key: &str) -> Result<Option<Value>>;
    async fn set_value(&self, id: WindowId, key: &str, value: Value) -> Result<()>;
    async fn remove_value(&self, id: WindowId, key: &str) -> Result<()>;

    fn is_available(&self) -> bool {
        true
    }
}

/// The companion page's tab-tree provider.
#[async_trait]
pub trait TabTreeProvider: Send + Sync {
    /// Succeeds once the provider is reachable.
    async fn ping(&self) -> Result<()>;
    /// Flat tab list for a window. Tabs may lack a URL when the provider is
    /// not allowed to disclose it.
    async fn tabs(&self, window: WindowId) -> Result<Vec<TabInfo>>;

    fn is_available(&self) -> bool {
        true
    }
}

/// The set of capabilities the engine runs against.
#[derive(Clone)]
pub struct HostCapabilities {
    pub windows: Arc<dyn WindowService>,
    pub values: Arc<dyn WindowValueStore>,
    pub tab_tree: Arc<dyn TabTreeProvider>,
}

impl HostCapabilities {
    /// Pick implementations once. Optional capabilities that are absent or
    /// report themselves unavailable become null objects.
    pub fn probe(
        windows: Arc<dyn WindowService>,
        values: Option<Arc<dyn WindowValueStore>>,
        tab_tree: Option<Arc<dyn TabTreeProvider>>,
    ) -> Self {
        let values: Arc<dyn WindowValueStore> = match values.filter(|v| v.is_available()) {
            Some(values) => values,
            None => {
                info!("durable window storage unavailable, session identities disabled");
                Arc::new(NoopValueStore)
            }
        };
        let tab_tree: Arc<dyn TabTreeProvider> = match tab_tree.filter(|t| t.is_available()) {
            Some(tab_tree) => tab_tree,
            None => {
                info!("tab-tree provider unavailable, discovery limited to window heuristics");
                Arc::new(NoopTabTree)
            }
        };
        Self {
            windows,
            values,
            tab_tree,
        }
    }

    /// All three capabilities served by one in-memory host.
    pub fn from_virtual_host(host: Arc<VirtualHost>) -> Self {
        let values: Arc<dyn WindowValueStore> = host.clone();
        let tab_tree: Arc<dyn TabTreeProvider> = host.clone();
        Self::probe(host, Some(values), Some(tab_tree))
    }

    pub fn has_persistence(&self) -> bool {
        self.values.is_available()
    }
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("persistence", &self.values.is_available())
            .field("tab_tree", &self.tab_tree.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_empty() {
        assert!(WindowUpdate::new(CommandOrigin::Layout).is_empty());
        assert!(!WindowUpdate::focus(CommandOrigin::Focus).is_empty());
    }

    #[test]
    fn geometry_update_sets_all_edges() {
        let update = WindowUpdate::geometry(Geometry::new(1, 2, 3, 4), CommandOrigin::Layout);
        assert_eq!(update.left, Some(1));
        assert_eq!(update.top, Some(2));
        assert_eq!(update.width, Some(3));
        assert_eq!(update.height, Some(4));
        assert_eq!(update.state, None);
    }

    #[test]
    fn probe_substitutes_null_objects() {
        let caps = HostCapabilities::probe(Arc::new(NoopWindowService), None, None);
        assert!(!caps.has_persistence());
        assert!(!caps.tab_tree.is_available());
    }

    #[test]
    fn probe_rejects_unavailable_store() {
        let host = Arc::new(VirtualHost::new());
        host.set_value_store_available(false);
        let caps = HostCapabilities::from_virtual_host(host);
        assert!(!caps.has_persistence());
        assert!(caps.tab_tree.is_available());
    }
}
