//! Companion page URLs.
//!
//! The companion page is addressed either by its public URL or by the
//! provider's internal `<scheme>://<id>/<path>` form. Both accept the same
//! query parameters: `windowId` (the anchor to show), `style` and `title`.

use sidedock_common::{DockError, WindowId};
use sidedock_config::schema::CompanionConfig;
use url::Url;

/// Parameters encoded in a companion page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanionPage {
    /// Provider id for the internal URL form. `None` selects the public URL.
    pub internal_id: Option<String>,
    pub window_id: Option<WindowId>,
    pub style: Option<String>,
    pub title: Option<String>,
}

/// Builds and recognizes companion page URLs.
#[derive(Debug, Clone)]
pub struct CompanionUrls {
    page_url: String,
    internal_scheme: String,
    internal_page_path: String,
    page_title: Option<String>,
}

impl CompanionUrls {
    pub fn from_config(config: &CompanionConfig) -> Self {
        Self {
            page_url: config.page_url.clone(),
            internal_scheme: config.internal_scheme.clone(),
            internal_page_path: config.internal_page_path.trim_start_matches('/').to_string(),
            page_title: config.page_title.clone(),
        }
    }

    /// URL of the page showing `anchor`'s tabs, with the configured title.
    pub fn for_anchor(&self, anchor: WindowId) -> Result<String, DockError> {
        self.build(&CompanionPage {
            window_id: Some(anchor),
            title: self.page_title.clone(),
            ..Default::default()
        })
    }

    pub fn build(&self, page: &CompanionPage) -> Result<String, DockError> {
        let base = match &page.internal_id {
            Some(id) => format!(
                "{}://{}/{}",
                self.internal_scheme, id, self.internal_page_path
            ),
            None => self.page_url.clone(),
        };
        let mut url = Url::parse(&base)
            .map_err(|e| DockError::Other(format!("invalid companion url {base}: {e}")))?;

        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(style) = &page.style {
            pairs.push(("style", style.clone()));
        }
        if let Some(window_id) = page.window_id {
            pairs.push(("windowId", window_id.0.to_string()));
        }
        if let Some(title) = &page.title {
            pairs.push(("title", title.clone()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url.to_string())
    }

    /// Parse `url` if it addresses the companion page. The first occurrence
    /// of each query parameter wins.
    pub fn parse(&self, url: &str) -> Option<CompanionPage> {
        let (internal_id, rest) = match url.strip_prefix(self.page_url.as_str()) {
            Some(rest) => (None, rest),
            None => {
                let rest = url
                    .strip_prefix(self.internal_scheme.as_str())?
                    .strip_prefix("://")?;
                let (id, rest) = rest.split_once('/')?;
                let rest = rest.strip_prefix(self.internal_page_path.as_str())?;
                (Some(id.to_string()), rest)
            }
        };

        let mut page = CompanionPage {
            internal_id,
            ..Default::default()
        };
        let Some(query) = rest.strip_prefix('?') else {
            return Some(page);
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "windowId" if page.window_id.is_none() => {
                    page.window_id = value.trim().parse().ok().map(WindowId);
                }
                "style" if page.style.is_none() => {
                    page.style = Some(value.trim().to_lowercase());
                }
                "title" if page.title.is_none() => page.title = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(page)
    }

    pub fn is_companion_url(&self, url: &str) -> bool {
        self.parse(url).is_some()
    }
}

impl Default for CompanionUrls {
    fn default() -> Self {
        Self::from_config(&CompanionConfig::default())
    }
}
