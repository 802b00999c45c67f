//! Finding satellites that are already open.
//!
//! Windows are classified in two passes. Stored session identities are
//! exact: a window whose identity names a parent is a satellite of the
//! window carrying that parent identity. Windows without stored identities
//! fall back to heuristics: single-tab windows whose only page is the
//! companion page are satellites, paired with the nearest normal window on
//! the docking side.

use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use sidedock_common::{TabInfo, WindowId, WindowInfo, WindowKind};
use tracing::{debug, info, warn};

use crate::companion::CompanionUrls;
use crate::platform::{HostCapabilities, TabTreeProvider};
use crate::session::SessionIdentityStore;

/// Maximum distance at which the nearest anchor is accepted on Euclidean
/// distance alone.
const EXACT_MATCH_DISTANCE: f64 = 3.0;
/// Maximum horizontal distance between expected and actual anchor edge.
const HORIZONTAL_TOLERANCE: i32 = 10;
/// Interval between readiness pings to the tab-tree provider.
const PING_INTERVAL: Duration = Duration::from_secs(1);

/// How discovery should look for satellites.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Upper bound for waiting on the tab-tree provider.
    pub collaborator_timeout: Duration,
    /// Configured gap between satellite and anchor.
    pub gap: i32,
    pub dock_right: bool,
    /// Classify by stored session identities before falling back to
    /// heuristics.
    pub use_session_data: bool,
}

/// How a satellite was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    SessionData,
    CompanionPage,
    /// The tab-tree provider could not be asked; the window's hidden panel
    /// type was taken as evidence.
    PanelWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredSatellite {
    pub window: WindowInfo,
    /// The anchor, if one was found.
    pub anchor: Option<WindowInfo>,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Discovery {
    pub satellites: Vec<DiscoveredSatellite>,
    /// Normal windows that are not satellites.
    pub possible_anchors: Vec<WindowInfo>,
    pub collaborator_available: bool,
}

impl Discovery {
    pub fn is_satellite(&self, id: WindowId) -> bool {
        self.satellites.iter().any(|s| s.window.id == id)
    }
}

/// Ping the tab-tree provider now and then once per second until it
/// answers or `timeout` elapses.
pub async fn wait_for_collaborator(tab_tree: &dyn TabTreeProvider, timeout: Duration) -> bool {
    let probe = async {
        let mut ticker = tokio::time::interval(PING_INTERVAL);
        loop {
            ticker.tick().await;
            if tab_tree.ping().await.is_ok() {
                return;
            }
        }
    };
    match tokio::time::timeout(timeout, probe).await {
        Ok(()) => true,
        Err(_) => {
            warn!(?timeout, "tab-tree provider did not respond");
            false
        }
    }
}

/// Classify `all_windows` (listed with tabs) into satellites and possible
/// anchors.
pub async fn find_sidebar_windows(
    host: &HostCapabilities,
    sessions: &SessionIdentityStore,
    companion: &CompanionUrls,
    all_windows: Vec<WindowInfo>,
    options: &DiscoveryOptions,
) -> Discovery {
    let collaborator_available =
        wait_for_collaborator(host.tab_tree.as_ref(), options.collaborator_timeout).await;

    let mut candidates: Vec<&WindowInfo> = all_windows
        .iter()
        .filter(|w| w.tab_count() == Some(1))
        .collect();

    let from_session = if options.use_session_data {
        classify_by_session(sessions, &all_windows, &mut candidates).await
    } else {
        Vec::new()
    };

    let checks = join_all(candidates.iter().map(|window| async {
        let classification =
            classify_candidate(host, companion, window, collaborator_available).await;
        classification.map(|c| ((*window).clone(), c))
    }))
    .await;
    let heuristic: Vec<(WindowInfo, Classification)> = checks.into_iter().flatten().collect();

    let possible_anchors: Vec<WindowInfo> = all_windows
        .iter()
        .filter(|w| {
            w.kind == WindowKind::Normal
                && !heuristic.iter().any(|(s, _)| s.id == w.id)
                && !from_session.iter().any(|s| s.window.id == w.id)
        })
        .cloned()
        .collect();

    let mut satellites = from_session;
    for (window, classification) in heuristic {
        let anchor = match_anchor(&window, &possible_anchors, options.gap, options.dock_right)
            .map(|m| m.anchor.clone());
        satellites.push(DiscoveredSatellite {
            window,
            anchor,
            classification,
        });
    }

    info!(
        satellites = satellites.len(),
        possible_anchors = possible_anchors.len(),
        collaborator_available,
        "window discovery finished"
    );
    Discovery {
        satellites,
        possible_anchors,
        collaborator_available,
    }
}

/// Pair windows via stored identities. Every window with an identity is
/// removed from the heuristic `candidates`.
async fn classify_by_session(
    sessions: &SessionIdentityStore,
    all_windows: &[WindowInfo],
    candidates: &mut Vec<&WindowInfo>,
) -> Vec<DiscoveredSatellite> {
    let identities = join_all(all_windows.iter().map(|w| sessions.read(w.id))).await;

    let mut found = Vec::new();
    for (window, identity) in all_windows.iter().zip(&identities) {
        let Some(identity) = identity else {
            continue;
        };
        candidates.retain(|c| c.id != window.id);

        // Multi-tab windows are never treated as satellites.
        if window.tab_count().unwrap_or(0) > 1 {
            continue;
        }
        let Some(parent_id) = &identity.parent_id else {
            continue;
        };
        let anchor = all_windows
            .iter()
            .zip(&identities)
            .find(|(_, other)| other.as_ref().is_some_and(|o| &o.id == parent_id))
            .map(|(w, _)| w.clone());
        debug!(window = %window.id, anchor = ?anchor.as_ref().map(|a| a.id), "satellite from session data");
        found.push(DiscoveredSatellite {
            window: window.clone(),
            anchor,
            classification: Classification::SessionData,
        });
    }
    found
}

async fn classify_candidate(
    host: &HostCapabilities,
    companion: &CompanionUrls,
    window: &WindowInfo,
    collaborator_available: bool,
) -> Option<Classification> {
    let tabs = if collaborator_available {
        match host.tab_tree.tabs(window.id).await {
            Ok(tabs) => Some(tabs),
            Err(e) => {
                debug!(window = %window.id, error = %e, "tab-tree provider could not list tabs");
                None
            }
        }
    } else {
        None
    };

    let Some(tabs) = tabs else {
        return (window.kind == WindowKind::Panel).then_some(Classification::PanelWindow);
    };

    for tab in &tabs {
        let url = match &tab.url {
            Some(url) => Some(url.clone()),
            None => host_tab_url(window, tab),
        };
        if !url.is_some_and(|u| companion.is_companion_url(&u)) {
            return None;
        }
    }
    Some(Classification::CompanionPage)
}

/// The provider may omit URLs; look the tab up in the host's own listing.
fn host_tab_url(window: &WindowInfo, tab: &TabInfo) -> Option<String> {
    window
        .tabs
        .as_ref()?
        .iter()
        .find(|t| t.id == tab.id)
        .and_then(|t| t.url.clone())
}

/// A candidate anchor and its distance from where the anchor should be.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorMatch<'a> {
    pub anchor: &'a WindowInfo,
    pub dx: i32,
    pub dy: i32,
    pub distance: f64,
}

/// Pick the anchor `satellite` is most plausibly docked to.
///
/// The expected anchor edge is derived from the satellite's position, the
/// gap and the docking side. Candidates are ranked by Euclidean distance to
/// it; if even the best is off by more than a few pixels they are re-ranked
/// by horizontal distance alone. Matches further than the horizontal
/// tolerance away are rejected. Equal distances keep host listing order.
pub fn match_anchor<'a>(
    satellite: &WindowInfo,
    candidates: &'a [WindowInfo],
    gap: i32,
    dock_right: bool,
) -> Option<AnchorMatch<'a>> {
    let s = satellite.geometry;
    let expected_x = if dock_right {
        s.left - gap
    } else {
        s.right() + gap
    };
    let expected_y = s.top;

    let mut ranked: Vec<AnchorMatch<'a>> = candidates
        .iter()
        .filter(|c| c.id != satellite.id && c.incognito == satellite.incognito)
        .map(|c| {
            let edge = if dock_right {
                c.geometry.right()
            } else {
                c.geometry.left
            };
            let dx = (edge - expected_x).abs();
            let dy = (c.geometry.top - expected_y).abs();
            AnchorMatch {
                anchor: c,
                dx,
                dy,
                distance: f64::from(dx).hypot(f64::from(dy)),
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    if ranked.first()?.distance > EXACT_MATCH_DISTANCE {
        ranked.sort_by_key(|m| m.dx);
    }

    let best = ranked.into_iter().next()?;
    (best.dx <= HORIZONTAL_TOLERANCE).then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{VirtualHost, WindowValueStore};
    use crate::session::DOCKING_INFO_KEY;
    use sidedock_common::Geometry;
    use std::sync::Arc;

    fn window(id: u64, geometry: Geometry) -> WindowInfo {
        WindowInfo {
            id: WindowId(id),
            geometry,
            state: Default::default(),
            kind: WindowKind::Normal,
            incognito: false,
            focused: false,
            tabs: None,
        }
    }

    fn options() -> DiscoveryOptions {
        DiscoveryOptions {
            collaborator_timeout: Duration::from_millis(50),
            gap: 10,
            dock_right: false,
            use_session_data: true,
        }
    }

    #[test]
    fn geometric_match_prefers_adjacent_window() {
        let satellite = window(1, Geometry::new(100 - 10 - 235, 100, 235, 600));
        let candidates = vec![
            window(2, Geometry::new(400, 100, 800, 600)),
            window(3, Geometry::new(100, 100, 800, 600)),
            window(4, Geometry::new(108, 500, 800, 600)),
        ];
        let m = match_anchor(&satellite, &candidates, 10, false).unwrap();
        assert_eq!(m.anchor.id, WindowId(3));
        assert_eq!(m.dx, 0);
        assert_eq!(m.distance, 0.0);
    }

    #[test]
    fn geometric_match_rejects_far_windows() {
        let satellite = window(1, Geometry::new(0, 100, 235, 600));
        let candidates = vec![window(2, Geometry::new(400, 100, 800, 600))];
        assert!(match_anchor(&satellite, &candidates, 10, false).is_none());
    }

    #[test]
    fn geometric_match_reranks_by_horizontal_distance() {
        let satellite = window(1, Geometry::new(0, 0, 200, 600));
        // Expected anchor left edge: 210.
        let candidates = vec![
            window(2, Geometry::new(230, 0, 800, 600)),  // dx 20, dy 0
            window(3, Geometry::new(215, 300, 800, 600)), // dx 5, dy 300
        ];
        let m = match_anchor(&satellite, &candidates, 10, false).unwrap();
        assert_eq!(m.anchor.id, WindowId(3));
    }

    #[test]
    fn geometric_match_docked_right() {
        let satellite = window(1, Geometry::new(910, 50, 235, 600));
        let candidates = vec![window(2, Geometry::new(100, 50, 800, 600))];
        let m = match_anchor(&satellite, &candidates, 10, true).unwrap();
        assert_eq!(m.anchor.id, WindowId(2));
    }

    #[test]
    fn geometric_match_requires_same_incognito() {
        let mut satellite = window(1, Geometry::new(-145, 100, 235, 600));
        satellite.incognito = true;
        let candidates = vec![window(2, Geometry::new(100, 100, 800, 600))];
        assert!(match_anchor(&satellite, &candidates, 10, false).is_none());
    }

    #[test]
    fn equidistant_candidates_keep_listing_order() {
        let satellite = window(1, Geometry::new(0, 100, 200, 600));
        let candidates = vec![
            window(5, Geometry::new(210, 98, 800, 600)),
            window(4, Geometry::new(210, 102, 800, 600)),
        ];
        let m = match_anchor(&satellite, &candidates, 10, false).unwrap();
        assert_eq!(m.anchor.id, WindowId(5));
    }

    #[tokio::test]
    async fn session_data_classifies_regardless_of_geometry() {
        let host = Arc::new(VirtualHost::new());
        let a = host.open_window(WindowKind::Normal, Geometry::new(100, 100, 800, 600), &["https://a"]);
        let b = host.open_window(WindowKind::Popup, Geometry::new(2000, 900, 235, 300), &["https://b"]);
        host.set_value(a, DOCKING_INFO_KEY, serde_json::json!({"id": "A"}))
            .await
            .unwrap();
        host.set_value(b, DOCKING_INFO_KEY, serde_json::json!({"id": "B", "parentId": "A"}))
            .await
            .unwrap();

        let caps = HostCapabilities::from_virtual_host(host.clone());
        let sessions = SessionIdentityStore::new(caps.values.clone(), true);
        let windows = host.windows();
        let discovery = find_sidebar_windows(
            &caps,
            &sessions,
            &CompanionUrls::default(),
            windows,
            &options(),
        )
        .await;

        assert_eq!(discovery.satellites.len(), 1);
        let satellite = &discovery.satellites[0];
        assert_eq!(satellite.window.id, b);
        assert_eq!(satellite.anchor.as_ref().map(|w| w.id), Some(a));
        assert_eq!(satellite.classification, Classification::SessionData);
        assert_eq!(
            discovery.possible_anchors.iter().map(|w| w.id).collect::<Vec<_>>(),
            vec![a]
        );
    }

    #[tokio::test]
    async fn companion_page_windows_are_matched_geometrically() {
        let host = Arc::new(VirtualHost::new());
        let companion = CompanionUrls::default();
        let anchor = host.open_window(
            WindowKind::Normal,
            Geometry::new(100, 100, 800, 600),
            &["https://a", "https://b"],
        );
        let url = companion.for_anchor(WindowId(999)).unwrap();
        let satellite = host.open_window(
            WindowKind::Popup,
            Geometry::new(100 - 10 - 235, 100, 235, 600),
            &[url.as_str()],
        );
        // A single-tab regular window is not a satellite.
        host.open_window(WindowKind::Normal, Geometry::new(0, 0, 500, 500), &["https://c"]);
        host.set_tab_tree_hides_urls(true);

        let caps = HostCapabilities::from_virtual_host(host.clone());
        let sessions = SessionIdentityStore::new(caps.values.clone(), false);
        let discovery =
            find_sidebar_windows(&caps, &sessions, &companion, host.windows(), &options()).await;

        assert!(discovery.collaborator_available);
        assert_eq!(discovery.satellites.len(), 1);
        assert_eq!(discovery.satellites[0].window.id, satellite);
        assert_eq!(discovery.satellites[0].classification, Classification::CompanionPage);
        assert_eq!(
            discovery.satellites[0].anchor.as_ref().map(|w| w.id),
            Some(anchor)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_collaborator_falls_back_to_panel_type() {
        let host = Arc::new(VirtualHost::new());
        host.open_window(WindowKind::Normal, Geometry::new(100, 100, 800, 600), &["x", "y"]);
        let panel = host.open_window(WindowKind::Panel, Geometry::new(-145, 100, 235, 600), &["p"]);
        host.open_window(WindowKind::Popup, Geometry::new(-145, 100, 235, 600), &["q"]);
        host.set_tab_tree_available(false);

        let caps = HostCapabilities::probe(host.clone(), None, Some(host.clone()));
        let sessions = SessionIdentityStore::new(caps.values.clone(), true);
        let discovery = find_sidebar_windows(
            &caps,
            &sessions,
            &CompanionUrls::default(),
            host.windows(),
            &options(),
        )
        .await;

        assert!(!discovery.collaborator_available);
        assert_eq!(discovery.satellites.len(), 1);
        assert_eq!(discovery.satellites[0].window.id, panel);
        assert_eq!(discovery.satellites[0].classification, Classification::PanelWindow);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_collaborator_times_out() {
        let host = VirtualHost::new();
        host.set_tab_tree_available(false);
        assert!(!wait_for_collaborator(&host, Duration::from_secs(3)).await);
        host.set_tab_tree_available(true);
        assert!(wait_for_collaborator(&host, Duration::from_secs(3)).await);
    }
}
