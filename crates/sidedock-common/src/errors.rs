use std::path::PathBuf;

use crate::types::WindowId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config watch error: {0}")]
    WatchError(String),
}

/// Failures reported by host capabilities (window service, durable
/// per-window store, tab-tree collaborator).
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The window vanished between two steps of an operation.
    #[error("window not found: {0}")]
    WindowNotFound(WindowId),

    /// An update/create/remove call was rejected by the host.
    #[error("window command failed: {0}")]
    CommandFailed(String),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("not supported: {0}")]
    NotSupported(String),
}

impl PlatformError {
    /// True for failures caused by a window disappearing mid-operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::WindowNotFound(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DockError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("{0}")]
    Other(String),
}
