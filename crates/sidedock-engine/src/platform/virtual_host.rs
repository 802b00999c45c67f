//! In-memory host implementing every capability.
//!
//! Used by the `sidedock run` simulation and by the engine's tests. Windows
//! keep host listing order, every engine-issued command is recorded, and
//! focus changes caused by a command echo that command's origin.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use sidedock_common::errors::PlatformError;
use sidedock_common::{
    CommandOrigin, EventBus, Geometry, TabInfo, WindowEvent, WindowId, WindowInfo, WindowKind,
    WindowState,
};
use tokio::sync::broadcast;

use super::{
    CreateWindow, Result, TabTreeProvider, WindowService, WindowUpdate, WindowValueStore,
};

const DEFAULT_GEOMETRY: Geometry = Geometry {
    left: 0,
    top: 0,
    width: 800,
    height: 600,
};

/// A command the engine sent to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Update {
        window: WindowId,
        update: WindowUpdate,
    },
    Create {
        window: WindowId,
        kind: WindowKind,
        origin: CommandOrigin,
    },
    Remove {
        window: WindowId,
        origin: CommandOrigin,
    },
}

impl HostCommand {
    pub fn window(&self) -> WindowId {
        match self {
            HostCommand::Update { window, .. }
            | HostCommand::Create { window, .. }
            | HostCommand::Remove { window, .. } => *window,
        }
    }

    pub fn is_focus(&self) -> bool {
        matches!(self, HostCommand::Update { update, .. } if update.focused == Some(true))
    }
}

#[derive(Default)]
struct HostState {
    windows: Vec<WindowInfo>,
    values: HashMap<(WindowId, String), Value>,
    focused: Option<WindowId>,
    commands: Vec<HostCommand>,
    next_window_id: u64,
    next_tab_id: u64,
    value_store_unavailable: bool,
    tab_tree_unavailable: bool,
    tab_tree_hides_urls: bool,
}

impl HostState {
    fn window_mut(&mut self, id: WindowId) -> Result<&mut WindowInfo> {
        self.windows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(PlatformError::WindowNotFound(id))
    }

    fn window(&self, id: WindowId) -> Result<&WindowInfo> {
        self.windows
            .iter()
            .find(|w| w.id == id)
            .ok_or(PlatformError::WindowNotFound(id))
    }

    fn tabs_for(&mut self, urls: &[String]) -> Vec<TabInfo> {
        urls.iter()
            .map(|url| {
                self.next_tab_id += 1;
                TabInfo {
                    id: self.next_tab_id,
                    url: Some(url.clone()),
                }
            })
            .collect()
    }

    fn insert(
        &mut self,
        kind: WindowKind,
        geometry: Geometry,
        urls: &[String],
        incognito: bool,
    ) -> WindowInfo {
        self.next_window_id += 1;
        let tabs = self.tabs_for(urls);
        let info = WindowInfo {
            id: WindowId(self.next_window_id),
            geometry,
            state: WindowState::Normal,
            kind,
            incognito,
            focused: false,
            tabs: Some(tabs),
        };
        self.windows.push(info.clone());
        info
    }

    fn set_focus(&mut self, id: Option<WindowId>) {
        self.focused = id;
        for window in &mut self.windows {
            window.focused = Some(window.id) == id;
        }
    }
}

/// An in-memory window host.
pub struct VirtualHost {
    state: Mutex<HostState>,
    events: EventBus,
}

impl VirtualHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState::default()),
            events: EventBus::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Scenario setup (actions by "the user", not recorded as commands) --

    /// Open a window the way a user would. Publishes `Created`.
    pub fn open_window(&self, kind: WindowKind, geometry: Geometry, tab_urls: &[&str]) -> WindowId {
        let urls: Vec<String> = tab_urls.iter().map(|u| u.to_string()).collect();
        let id = self.state().insert(kind, geometry, &urls, false).id;
        self.events.publish(WindowEvent::Created(id));
        id
    }

    pub fn set_incognito(&self, id: WindowId, incognito: bool) {
        if let Ok(window) = self.state().window_mut(id) {
            window.incognito = incognito;
        }
    }

    /// Move or resize a window without going through the engine.
    pub fn move_window(&self, id: WindowId, geometry: Geometry) {
        if let Ok(window) = self.state().window_mut(id) {
            window.geometry = geometry;
        }
    }

    pub fn set_window_state(&self, id: WindowId, state: WindowState) {
        if let Ok(window) = self.state().window_mut(id) {
            window.state = state;
        }
    }

    pub fn add_tab(&self, id: WindowId, url: &str) {
        let mut state = self.state();
        let tabs = state.tabs_for(&[url.to_string()]);
        if let Ok(window) = state.window_mut(id) {
            window.tabs.get_or_insert_with(Vec::new).extend(tabs);
        }
    }

    /// Close a window as the user would. Its stored values are dropped.
    pub fn close_window(&self, id: WindowId) {
        if self.state().remove(id) {
            self.events.publish(WindowEvent::Removed(id));
        }
    }

    /// Focus a window as the user would.
    pub fn focus_window(&self, id: Option<WindowId>) {
        self.state().set_focus(id);
        self.events.publish(WindowEvent::FocusChanged {
            window_id: id,
            origin: CommandOrigin::External,
        });
    }

    /// Simulate a host restart: every window gets a new id, stored values
    /// move with their windows, and the command log is cleared.
    pub fn restart(&self) -> HashMap<WindowId, WindowId> {
        let mut state = self.state();
        let mut remap = HashMap::new();
        let old_windows = std::mem::take(&mut state.windows);
        for mut window in old_windows {
            state.next_window_id += 1;
            let new_id = WindowId(state.next_window_id);
            remap.insert(window.id, new_id);
            window.id = new_id;
            state.windows.push(window);
        }
        let old_values = std::mem::take(&mut state.values);
        state.values = old_values
            .into_iter()
            .filter_map(|((id, key), value)| remap.get(&id).map(|new| ((*new, key), value)))
            .collect();
        state.focused = state.focused.and_then(|id| remap.get(&id).copied());
        state.commands.clear();
        remap
    }

    pub fn set_value_store_available(&self, available: bool) {
        self.state().value_store_unavailable = !available;
    }

    pub fn set_tab_tree_available(&self, available: bool) {
        self.state().tab_tree_unavailable = !available;
    }

    /// Make the tab-tree provider omit tab URLs.
    pub fn set_tab_tree_hides_urls(&self, hide: bool) {
        self.state().tab_tree_hides_urls = hide;
    }

    // -- Inspection --

    pub fn window(&self, id: WindowId) -> Option<WindowInfo> {
        self.state().window(id).ok().cloned()
    }

    pub fn windows(&self) -> Vec<WindowInfo> {
        self.state().windows.clone()
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.state().focused
    }

    pub fn stored_value(&self, id: WindowId, key: &str) -> Option<Value> {
        self.state().values.get(&(id, key.to_string())).cloned()
    }

    pub fn commands(&self) -> Vec<HostCommand> {
        self.state().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<HostCommand> {
        std::mem::take(&mut self.state().commands)
    }

    pub fn focus_command_count(&self) -> usize {
        self.state().commands.iter().filter(|c| c.is_focus()).count()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

impl HostState {
    fn remove(&mut self, id: WindowId) -> bool {
        let before = self.windows.len();
        self.windows.retain(|w| w.id != id);
        if self.windows.len() == before {
            return false;
        }
        self.values.retain(|(window, _), _| *window != id);
        if self.focused == Some(id) {
            self.set_focus(None);
        }
        true
    }
}

impl Default for VirtualHost {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_tabs(mut info: WindowInfo, with_tabs: bool) -> WindowInfo {
    if !with_tabs {
        info.tabs = None;
    }
    info
}

#[async_trait]
impl WindowService for VirtualHost {
    async fn get(&self, id: WindowId, with_tabs: bool) -> Result<WindowInfo> {
        tokio::task::yield_now().await;
        let info = self.state().window(id)?.clone();
        Ok(strip_tabs(info, with_tabs))
    }

    async fn list(&self, with_tabs: bool) -> Result<Vec<WindowInfo>> {
        tokio::task::yield_now().await;
        Ok(self
            .state()
            .windows
            .iter()
            .cloned()
            .map(|w| strip_tabs(w, with_tabs))
            .collect())
    }

    async fn update(&self, id: WindowId, update: WindowUpdate) -> Result<WindowInfo> {
        tokio::task::yield_now().await;
        let (info, focus_event) = {
            let mut state = self.state();
            let window = state.window_mut(id)?;
            let g = &mut window.geometry;
            g.left = update.left.unwrap_or(g.left);
            g.top = update.top.unwrap_or(g.top);
            g.width = update.width.unwrap_or(g.width);
            g.height = update.height.unwrap_or(g.height);
            if let Some(new_state) = update.state {
                window.state = new_state;
            }
            let info = window.clone();
            let focus_event = update.focused == Some(true);
            if focus_event {
                state.set_focus(Some(id));
            }
            state.commands.push(HostCommand::Update {
                window: id,
                update: update.clone(),
            });
            (info, focus_event)
        };
        if focus_event {
            self.events.publish(WindowEvent::FocusChanged {
                window_id: Some(id),
                origin: update.origin,
            });
        }
        Ok(strip_tabs(info, false))
    }

    async fn create(&self, request: CreateWindow) -> Result<WindowInfo> {
        tokio::task::yield_now().await;
        let info = {
            let mut state = self.state();
            let geometry = Geometry {
                left: request.left.unwrap_or(DEFAULT_GEOMETRY.left),
                top: request.top.unwrap_or(DEFAULT_GEOMETRY.top),
                width: request.width.unwrap_or(DEFAULT_GEOMETRY.width),
                height: request.height.unwrap_or(DEFAULT_GEOMETRY.height),
            };
            let urls: Vec<String> = request.url.iter().cloned().collect();
            let info = state.insert(request.kind, geometry, &urls, request.incognito);
            state.set_focus(Some(info.id));
            state.commands.push(HostCommand::Create {
                window: info.id,
                kind: request.kind,
                origin: request.origin,
            });
            info
        };
        self.events.publish(WindowEvent::Created(info.id));
        self.events.publish(WindowEvent::FocusChanged {
            window_id: Some(info.id),
            origin: request.origin,
        });
        Ok(info)
    }

    async fn remove(&self, id: WindowId, origin: CommandOrigin) -> Result<()> {
        tokio::task::yield_now().await;
        {
            let mut state = self.state();
            if !state.remove(id) {
                return Err(PlatformError::WindowNotFound(id));
            }
            state.commands.push(HostCommand::Remove { window: id, origin });
        }
        self.events.publish(WindowEvent::Removed(id));
        Ok(())
    }

    async fn last_focused(&self) -> Result<Option<WindowId>> {
        Ok(self.state().focused)
    }

    fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl WindowValueStore for VirtualHost {
    async fn get_value(&self, id: WindowId, key: &str) -> Result<Option<Value>> {
        let state = self.state();
        if state.value_store_unavailable {
            return Err(PlatformError::PersistenceUnavailable("store disabled".into()));
        }
        state.window(id)?;
        Ok(state.values.get(&(id, key.to_string())).cloned())
    }

    async fn set_value(&self, id: WindowId, key: &str, value: Value) -> Result<()> {
        let mut state = self.state();
        if state.value_store_unavailable {
            return Err(PlatformError::PersistenceUnavailable("store disabled".into()));
        }
        state.window(id)?;
        state.values.insert((id, key.to_string()), value);
        Ok(())
    }

    async fn remove_value(&self, id: WindowId, key: &str) -> Result<()> {
        let mut state = self.state();
        if state.value_store_unavailable {
            return Err(PlatformError::PersistenceUnavailable("store disabled".into()));
        }
        state.values.remove(&(id, key.to_string()));
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.state().value_store_unavailable
    }
}

#[async_trait]
impl TabTreeProvider for VirtualHost {
    async fn ping(&self) -> Result<()> {
        if self.state().tab_tree_unavailable {
            return Err(PlatformError::CollaboratorUnavailable("not responding".into()));
        }
        Ok(())
    }

    async fn tabs(&self, window: WindowId) -> Result<Vec<TabInfo>> {
        let state = self.state();
        if state.tab_tree_unavailable {
            return Err(PlatformError::CollaboratorUnavailable("not responding".into()));
        }
        let mut tabs = state.window(window)?.tabs.clone().unwrap_or_default();
        if state.tab_tree_hides_urls {
            for tab in &mut tabs {
                tab.url = None;
            }
        }
        Ok(tabs)
    }

    fn is_available(&self) -> bool {
        !self.state().tab_tree_unavailable
    }
}
