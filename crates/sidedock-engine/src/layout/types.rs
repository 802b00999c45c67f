//! Placement types and configuration.

use sidedock_common::{CommandOrigin, Geometry};
use sidedock_config::DockConfig;

use crate::platform::WindowUpdate;

/// Geometry rules for docking satellites beside their anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockLayout {
    /// Horizontal gap between satellite and anchor.
    pub gap: i32,
    pub dock_right: bool,
    pub sync_height: bool,
    pub sync_width: bool,
    pub tile_height: bool,
    /// Subtracted from every tiled band except the last.
    pub tile_height_margin: i32,
    pub tile_width: bool,
    /// Explicit floor for `left`. `None` allows half the satellite off-screen.
    pub horizontal_min: Option<i32>,
    /// Ceiling for the satellite's right edge.
    pub horizontal_max: Option<i32>,
}

impl DockLayout {
    pub fn from_config(config: &DockConfig) -> Self {
        let docking = &config.docking;
        Self {
            gap: docking.space_between,
            dock_right: docking.dock_right,
            sync_height: docking.sync_height,
            sync_width: docking.sync_width,
            tile_height: docking.tile_height,
            tile_height_margin: docking.tile_height_margin,
            tile_width: docking.tile_width,
            horizontal_min: docking
                .horizontal_min_enabled
                .then_some(docking.horizontal_min),
            horizontal_max: (docking.horizontal_max >= 0).then_some(docking.horizontal_max),
        }
    }
}

impl Default for DockLayout {
    fn default() -> Self {
        Self::from_config(&DockConfig::default())
    }
}

/// Everything [`DockLayout::place`] needs to know about one satellite.
#[derive(Debug, Clone, Copy)]
pub struct SlotInput<'a> {
    pub satellite: Geometry,
    pub anchor: Geometry,
    /// Position among the anchor's satellites, in registry order.
    pub ordinal: usize,
    /// Number of satellites sharing the anchor, including this one.
    pub sibling_count: usize,
    /// Last known geometry of the satellites with a lower ordinal.
    pub earlier_siblings: &'a [Geometry],
    /// Width to request for the satellite, as decided by width sync.
    pub target_width: Option<i32>,
    /// Uniform satellite width for side-by-side tiling when widths are synced.
    pub uniform_width: Option<i32>,
}

/// Desired satellite geometry. `width`/`height` are only set when they
/// should change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub left: i32,
    pub top: i32,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl Placement {
    /// True if applying this placement would change `current`.
    pub fn differs_from(&self, current: &Geometry) -> bool {
        current.top != self.top
            || current.left != self.left
            || self.height.is_some_and(|h| h != 0 && h != current.height)
            || self.width.is_some_and(|w| w != 0 && w != current.width)
    }

    pub fn to_update(&self, origin: CommandOrigin) -> WindowUpdate {
        WindowUpdate {
            left: Some(self.left),
            top: Some(self.top),
            width: self.width,
            height: self.height,
            ..WindowUpdate::new(origin)
        }
    }
}

/// Outcome of comparing a satellite's width with the configured width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthSync {
    /// Widths agree; nothing to do.
    Keep,
    /// Resize the satellite to this width.
    Request(i32),
    /// The user resized the satellite since the last sync; adopt its width
    /// as the new configured width.
    Adopt(i32),
}
