//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use sidedock_common::ConfigError;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_sidedock_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[window]
width = 300

[docking]
dock_right = true
space_between = 4
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.window.width, 300);
    assert!(config.docking.dock_right);
    assert_eq!(config.docking.space_between, 4);
    // Defaults preserved
    assert_eq!(config.docking.slow_interval_ms, 1000);
    assert!(config.window.popup);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_keeps_them() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[docking]
space_between = 9000
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.docking.space_between, 9000);
}

#[test]
fn load_or_create_writes_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sidedock").join("config.toml");

    let config = load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config, crate::schema::DockConfig::default());

    let reloaded = load_from_path(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::DockConfig;

    let content = default_config_toml();
    let config: DockConfig = toml::from_str(&content).unwrap();
    assert_eq!(config, DockConfig::default());
}

#[test]
fn default_config_path_is_reasonable() {
    if std::env::var_os(CONFIG_PATH_ENV).is_some() {
        return;
    }
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("sidedock"));
        assert!(path_str.ends_with("config.toml"));
    }
}
