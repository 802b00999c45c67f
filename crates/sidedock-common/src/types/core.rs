use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-assigned window identifier. Only valid for the lifetime of the host
/// process; see `SessionId` for identities that survive restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Outer window bounds in screen pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

/// Window type as reported by the host.
///
/// `Panel` windows are only visible to the extension that created them,
/// which makes them a useful hint when the tab-tree collaborator is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    #[default]
    Normal,
    Popup,
    Panel,
    Devtools,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: u64,
    pub url: Option<String>,
}

/// A window as observed through the window-management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub geometry: Geometry,
    pub state: WindowState,
    pub kind: WindowKind,
    pub incognito: bool,
    pub focused: bool,
    /// Only present when the window was fetched with tabs populated.
    pub tabs: Option<Vec<TabInfo>>,
}

impl WindowInfo {
    pub fn tab_count(&self) -> Option<usize> {
        self.tabs.as_ref().map(Vec::len)
    }
}

/// Marker attached to every command sent to the window service so that
/// event handlers can tell their own effects apart from user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandOrigin {
    /// Anything not issued by the docking engine (user input, other agents).
    #[default]
    External,
    Layout,
    Focus,
    Lifecycle,
    Startup,
}

impl CommandOrigin {
    pub fn is_engine(&self) -> bool {
        !matches!(self, CommandOrigin::External)
    }
}
