//! Docking simulation settings: placement, polling cadence, size sync,
//! tiling, and focus/lifecycle behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for keeping satellites docked beside their anchor windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockingConfig {
    /// Master switch for docked satellites.
    pub enabled: bool,
    /// Horizontal gap between satellite and anchor in pixels. Negative values
    /// overlap the invisible resize borders some platforms draw.
    pub space_between: i32,
    /// Dock on the anchor's right edge instead of its left edge.
    pub dock_right: bool,
    pub horizontal_min_enabled: bool,
    /// Minimum satellite `left`, used when `horizontal_min_enabled`.
    pub horizontal_min: i32,
    /// Maximum satellite right edge; negative disables the clamp.
    pub horizontal_max: i32,
    /// Slow polling interval in milliseconds; negative disables polling.
    pub slow_interval_ms: i64,
    /// Fast polling interval in milliseconds; only used while it is
    /// strictly smaller than the slow interval.
    pub fast_interval_ms: i64,
    /// Move and resize satellites. Off keeps only state/focus handling.
    pub control_position: bool,
    /// Mirror minimize/restore between anchor and satellites.
    pub minimize: bool,
    /// Close single-tab satellites when their anchor closes.
    pub auto_close: bool,
    /// Before auto-closing, move the satellite to the anchor's last geometry.
    pub restore_state: bool,
    /// Only restore when no other regular window remains open.
    pub restore_state_only_last_window: bool,
    pub sync_width: bool,
    pub sync_height: bool,
    /// Stack satellites of one anchor vertically, dividing its height.
    pub tile_height: bool,
    /// Subtracted from every tiled band except the last.
    pub tile_height_margin: i32,
    /// Place satellites of one anchor side by side.
    pub tile_width: bool,
    /// Raise satellites when their anchor gains focus.
    pub auto_focus: bool,
    /// Hand focus back to the anchor when a satellite is focused.
    pub refocus_parent: bool,
}

impl DockingConfig {
    pub fn slow_interval(&self) -> Option<Duration> {
        interval_from_ms(self.slow_interval_ms)
    }

    pub fn fast_interval(&self) -> Option<Duration> {
        interval_from_ms(self.fast_interval_ms)
    }

    pub fn tiling(&self) -> bool {
        self.tile_height || self.tile_width
    }
}

fn interval_from_ms(ms: i64) -> Option<Duration> {
    u64::try_from(ms).ok().map(Duration::from_millis)
}

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            space_between: -13,
            dock_right: false,
            horizontal_min_enabled: false,
            horizontal_min: -8,
            horizontal_max: -1,
            slow_interval_ms: 1000,
            fast_interval_ms: 25,
            control_position: true,
            minimize: true,
            auto_close: true,
            restore_state: true,
            restore_state_only_last_window: true,
            sync_width: true,
            sync_height: true,
            tile_height: false,
            tile_height_margin: -8,
            tile_width: true,
            auto_focus: true,
            refocus_parent: true,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docking_config_defaults() {
        let config = DockingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.space_between, -13);
        assert!(!config.dock_right);
        assert_eq!(config.horizontal_max, -1);
        assert_eq!(config.slow_interval_ms, 1000);
        assert_eq!(config.fast_interval_ms, 25);
        assert!(config.auto_close);
        assert!(!config.tile_height);
        assert!(config.tile_width);
        assert_eq!(config.tile_height_margin, -8);
    }

    #[test]
    fn negative_interval_is_disabled() {
        let config = DockingConfig {
            slow_interval_ms: -1,
            fast_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.slow_interval(), None);
        assert_eq!(config.fast_interval(), Some(Duration::ZERO));
    }

    #[test]
    fn tiling_if_either_direction() {
        let mut config = DockingConfig {
            tile_height: false,
            tile_width: false,
            ..Default::default()
        };
        assert!(!config.tiling());
        config.tile_height = true;
        assert!(config.tiling());
    }

    #[test]
    fn docking_config_partial_toml() {
        let toml_str = r#"
dock_right = true
space_between = 10
slow_interval_ms = 500
"#;
        let config: DockingConfig = toml::from_str(toml_str).unwrap();
        assert!(config.dock_right);
        assert_eq!(config.space_between, 10);
        assert_eq!(config.slow_interval(), Some(Duration::from_millis(500)));
        // Defaults preserved
        assert_eq!(config.fast_interval_ms, 25);
        assert!(config.sync_height);
    }
}
