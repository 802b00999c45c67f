//! Companion page addressing.

use serde::{Deserialize, Serialize};

/// Where the companion page lives. Satellites are recognized by their tabs
/// pointing at one of these two URL forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Public URL of the companion page.
    pub page_url: String,
    /// Scheme of the provider's internal URL form (`<scheme>://<id>/<path>`).
    pub internal_scheme: String,
    /// Path of the page inside the provider's internal URL form.
    pub internal_page_path: String,
    /// Optional title passed to the page.
    pub page_title: Option<String>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            page_url: "ext+treestyletab:tabbar".into(),
            internal_scheme: "moz-extension".into(),
            internal_page_path: "sidebar/sidebar.html".into(),
            page_title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_config_defaults() {
        let config = CompanionConfig::default();
        assert_eq!(config.page_url, "ext+treestyletab:tabbar");
        assert_eq!(config.internal_scheme, "moz-extension");
        assert_eq!(config.internal_page_path, "sidebar/sidebar.html");
        assert!(config.page_title.is_none());
    }

    #[test]
    fn companion_config_partial_toml() {
        let config: CompanionConfig = toml::from_str(r#"page_title = "Tabs""#).unwrap();
        assert_eq!(config.page_title.as_deref(), Some("Tabs"));
        assert_eq!(config.page_url, "ext+treestyletab:tabbar");
    }
}
