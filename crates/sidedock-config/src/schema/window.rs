//! Satellite window creation settings.

use serde::{Deserialize, Serialize};

/// Width used for a new satellite when `width` is not set.
pub const DEFAULT_SATELLITE_WIDTH: i32 = 235;

/// How new satellite windows are created.
///
/// `width` doubles as the shared target width when width sync is enabled:
/// the engine writes the user's last manual resize back into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Satellite width in pixels, `-1` for the default.
    pub width: i32,
    /// Satellite height in pixels, `-1` to match the anchor.
    pub height: i32,
    /// Create satellites as popup windows (no toolbars).
    pub popup: bool,
    /// With `popup`, hide the window from other extensions (panel type).
    pub popup_hidden: bool,
    /// Prefix for the satellite's window title.
    pub title_preface: String,
}

impl WindowConfig {
    /// The width a freshly created satellite should get.
    pub fn effective_width(&self) -> i32 {
        if self.width > 0 {
            self.width
        } else {
            DEFAULT_SATELLITE_WIDTH
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: -1,
            height: -1,
            popup: true,
            popup_hidden: true,
            title_preface: String::new(),
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
    fn window_config_defaults() {
        let config = WindowConfig::default();
        assert_eq!(config.width, -1);
        assert_eq!(config.height, -1);
        assert!(config.popup);
        assert!(config.popup_hidden);
        assert!(config.title_preface.is_empty());
    }

    #[test]
    fn effective_width_falls_back_to_default() {
        let mut config = WindowConfig::default();
        assert_eq!(config.effective_width(), DEFAULT_SATELLITE_WIDTH);
        config.width = 300;
        assert_eq!(config.effective_width(), 300);
    }

    #[test]
    fn window_config_partial_toml() {
        let toml_str = r#"
width = 280
title_preface = "Tabs - "
"#;
        let config: WindowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.width, 280);
        assert_eq!(config.title_preface, "Tabs - ");
        // Defaults preserved
        assert_eq!(config.height, -1);
        assert!(config.popup);
    }
}
