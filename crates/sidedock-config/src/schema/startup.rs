//! Startup reattachment configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to satellites when the process (re)starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Open a satellite for every anchor that lacks one after a host restart.
    pub auto_open: bool,
    /// Rediscover satellites that were open before the restart.
    pub auto_detect: bool,
    /// Persist window identities in host session data so pairs can be
    /// recovered exactly.
    pub session_data: bool,
    /// How long to wait for the tab-tree collaborator to answer pings.
    pub collaborator_timeout_ms: u64,
}

impl StartupConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn reattach_enabled(&self) -> bool {
        self.auto_open || self.auto_detect
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            auto_open: false,
            auto_detect: false,
            session_data: true,
            collaborator_timeout_ms: 30_000,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
