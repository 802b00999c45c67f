//! Tests for the reload manager.

use super::*;
use crate::schema::DockConfig;
use std::path::PathBuf;

#[tokio::test]
async fn start_with_nonexistent_path_uses_defaults() {
    let path = PathBuf::from("/tmp/nonexistent_sidedock_reload_test.toml");
    let shared = ReloadManager::start(path).await;
    assert_eq!(shared.snapshot(), DockConfig::default());
}

#[tokio::test]
async fn start_with_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[docking]
dock_right = true
"#,
    )
    .unwrap();

    let shared = ReloadManager::start(path.clone()).await;
    let config = shared.snapshot();
    assert!(config.docking.dock_right);
    assert_eq!(config.docking.space_between, -13); // default
    assert_eq!(shared.persist_path(), Some(path.as_path()));
}
