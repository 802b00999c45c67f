//! sidedock configuration system.
//!
//! Provides TOML-based configuration with live reload, validation, and a
//! shared in-process handle that the docking engine reads from and writes
//! width changes back into. All config sections use sensible defaults so
//! partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sidedock_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod reload;
pub mod schema;
pub mod shared;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;
pub mod watcher;

// Re-export core types for convenience
pub use reload::ReloadManager;
pub use schema::{DockConfig, CONFIG_SCHEMA_VERSION};
pub use shared::SharedConfig;
pub use toml_writer::{save_config, save_config_to_path};
pub use watcher::ConfigWatcher;

use sidedock_common::ConfigError;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creates a default
/// if none exists, and validates the result.
pub fn load_config() -> Result<DockConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &DockConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let config = DockConfig::default();
        let json = config_to_json(&config);
        assert!(json.contains("\"window\""));
        assert!(json.contains("\"docking\""));
        assert!(json.contains("\"startup\""));
        assert!(json.contains("\"companion\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let config = DockConfig::default();
        let json = config_to_json(&config);
        let parsed: DockConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
