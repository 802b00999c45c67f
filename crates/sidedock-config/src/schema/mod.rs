//! Configuration schema types for sidedock.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the docking engine was
//! tuned against.

mod companion;
mod docking;
mod logging;
mod startup;
mod window;

pub use companion::*;
pub use docking::*;
pub use logging::*;
pub use startup::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for sidedock.
///
/// All options have sensible defaults. Only override what you want to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DockConfig {
    pub window: WindowConfig,
    pub docking: DockingConfig,
    pub startup: StartupConfig,
    pub companion: CompanionConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_correct_docking() {
        let config = DockConfig::default();
        assert!(config.docking.enabled);
        assert_eq!(config.docking.space_between, -13);
        assert_eq!(config.docking.slow_interval_ms, 1000);
        assert_eq!(config.docking.fast_interval_ms, 25);
        assert!(config.docking.auto_focus);
        assert!(config.docking.refocus_parent);
    }

    #[test]
    fn default_config_has_correct_window() {
        let config = DockConfig::default();
        assert_eq!(config.window.width, -1);
        assert!(config.window.popup);
    }

    #[test]
    fn default_config_has_correct_startup() {
        let config = DockConfig::default();
        assert!(!config.startup.auto_open);
        assert!(!config.startup.auto_detect);
        assert!(config.startup.session_data);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config: DockConfig = toml::from_str("").unwrap();
        assert_eq!(config, DockConfig::default());
    }

    #[test]
    fn partial_toml_mixes_sections() {
        let toml_str = r#"
[window]
width = 300

[docking]
dock_right = true
tile_height = true

[logging]
level = "debug"
"#;
        let config: DockConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.window.width, 300);
        assert!(config.docking.dock_right);
        assert!(config.docking.tile_height);
        assert_eq!(config.logging.level, LogLevel::Debug);
        // Untouched sections keep defaults
        assert_eq!(config.startup, StartupConfig::default());
        assert_eq!(config.companion, CompanionConfig::default());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = DockConfig::default();
        config.docking.space_between = 4;
        config.companion.page_title = Some("Tabs".into());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: DockConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
