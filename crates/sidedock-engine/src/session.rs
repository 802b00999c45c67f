//! Durable per-window identities.
//!
//! Host window ids do not survive a host restart, so every window gets a
//! random identity stored in the host's per-window value store. A satellite
//! additionally records its anchor's identity, which lets startup
//! reattachment pair windows exactly.
//!
//! Each window has its own async mutex: resolving an identity and writing a
//! parent link for the same window never interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use sidedock_common::{SessionId, WindowId};
use tracing::{debug, warn};

use crate::platform::WindowValueStore;

/// Key under which docking identities are stored.
pub const DOCKING_INFO_KEY: &str = "docking-info";

/// The value stored for each window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub id: SessionId,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<SessionId>,
}

impl SessionIdentity {
    pub fn fresh() -> Self {
        Self {
            id: SessionId::new(),
            parent_id: None,
        }
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<SessionIdentity>>>;

/// Assigns and persists [`SessionIdentity`] values.
pub struct SessionIdentityStore {
    store: Arc<dyn WindowValueStore>,
    enabled: AtomicBool,
    slots: Mutex<HashMap<WindowId, Slot>>,
}

impl SessionIdentityStore {
    pub fn new(store: Arc<dyn WindowValueStore>, enabled: bool) -> Self {
        Self {
            store,
            enabled: AtomicBool::new(enabled),
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<WindowId, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot(&self, window: WindowId) -> Slot {
        self.slots().entry(window).or_default().clone()
    }

    /// Persistence is requested and the host can provide it.
    pub fn is_active(&self) -> bool {
        self.enabled.load(Ordering::Acquire) && self.store.is_available()
    }

    /// Switch persistence on or off. Returns the previous setting. Turning
    /// it off forgets every cached identity; clearing what is already stored
    /// is up to the caller, who knows which windows are open.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let previous = self.enabled.swap(enabled, Ordering::AcqRel);
        if !enabled {
            self.slots().clear();
        }
        previous
    }

    /// Resolve `window`'s identity, reading it from the store or creating
    /// and persisting a new one. `None` while persistence is inactive.
    pub async fn observe(&self, window: WindowId) -> Option<SessionIdentity> {
        if !self.is_active() {
            return None;
        }
        let slot = self.slot(window);
        let mut guard = slot.lock().await;
        self.resolve(window, &mut guard).await
    }

    async fn resolve(
        &self,
        window: WindowId,
        slot: &mut Option<SessionIdentity>,
    ) -> Option<SessionIdentity> {
        if let Some(identity) = slot {
            return Some(identity.clone());
        }
        let identity = match self.read(window).await {
            Some(stored) => stored,
            None => {
                let fresh = SessionIdentity::fresh();
                self.write(window, &fresh).await;
                fresh
            }
        };
        *slot = Some(identity.clone());
        Some(identity)
    }

    /// Record that `window` is docked to `parent`. The parent's identity is
    /// resolved first, without holding `window`'s lock.
    pub async fn set_parent(&self, window: WindowId, parent: WindowId) {
        if !self.is_active() {
            return;
        }
        let Some(parent_identity) = self.observe(parent).await else {
            warn!(%window, %parent, "failed to resolve parent session identity");
            return;
        };

        let slot = self.slot(window);
        let mut guard = slot.lock().await;
        let Some(mut identity) = self.resolve(window, &mut guard).await else {
            return;
        };
        if identity.parent_id.as_ref() == Some(&parent_identity.id) {
            return;
        }
        identity.parent_id = Some(parent_identity.id);
        if self.is_active() {
            self.write(window, &identity).await;
            *guard = Some(identity);
        }
    }

    /// Rewrite every cached identity to the store.
    pub async fn force_persist_all(&self) {
        if !self.is_active() {
            return;
        }
        let slots: Vec<(WindowId, Slot)> = self
            .slots()
            .iter()
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();
        join_all(slots.into_iter().map(|(window, slot)| async move {
            let guard = slot.lock().await;
            if let Some(identity) = guard.as_ref() {
                self.write(window, identity).await;
            }
        }))
        .await;
    }

    /// Drop the cached identity of a closed window.
    pub fn forget(&self, window: WindowId) {
        self.slots().remove(&window);
    }

    /// Read the stored identity without creating one.
    pub async fn read(&self, window: WindowId) -> Option<SessionIdentity> {
        match self.store.get_value(window, DOCKING_INFO_KEY).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    debug!(%window, error = %e, "ignoring malformed session identity");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(%window, error = %e, "failed to read session identity");
                None
            }
        }
    }

    /// Remove the stored identity from `window`.
    pub async fn clear(&self, window: WindowId) {
        self.forget(window);
        if let Err(e) = self.store.remove_value(window, DOCKING_INFO_KEY).await {
            debug!(%window, error = %e, "failed to clear session identity");
        }
    }

    async fn write(&self, window: WindowId, identity: &SessionIdentity) {
        let value = match serde_json::to_value(identity) {
            Ok(value) => value,
            Err(e) => {
                warn!(%window, error = %e, "failed to encode session identity");
                return;
            }
        };
        if let Err(e) = self.store.set_value(window, DOCKING_INFO_KEY, value).await {
            warn!(%window, error = %e, "failed to store session identity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{NoopValueStore, VirtualHost};
    use sidedock_common::{Geometry, WindowKind};

    fn host_with_windows(n: usize) -> (Arc<VirtualHost>, Vec<WindowId>) {
        let host = Arc::new(VirtualHost::new());
        let ids = (0..n)
            .map(|_| host.open_window(WindowKind::Normal, Geometry::new(0, 0, 100, 100), &[]))
            .collect();
        (host, ids)
    }

    #[test]
    fn identity_json_shape() {
        let identity = SessionIdentity {
            id: SessionId::from("A"),
            parent_id: Some(SessionId::from("B")),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json, serde_json::json!({"id": "A", "parentId": "B"}));

        let bare: SessionIdentity = serde_json::from_value(serde_json::json!({"id": "C"})).unwrap();
        assert_eq!(bare.parent_id, None);
        let json = serde_json::to_value(&bare).unwrap();
        assert_eq!(json, serde_json::json!({"id": "C"}));
    }

    #[tokio::test]
    async fn observe_creates_and_persists_once() {
        let (host, ids) = host_with_windows(1);
        let sessions = SessionIdentityStore::new(host.clone(), true);

        let first = sessions.observe(ids[0]).await.unwrap();
        let second = sessions.observe(ids[0]).await.unwrap();
        assert_eq!(first, second);

        let stored = host.stored_value(ids[0], DOCKING_INFO_KEY).unwrap();
        assert_eq!(stored["id"], first.id.as_str());
    }

    #[tokio::test]
    async fn observe_reuses_stored_identity() {
        let (host, ids) = host_with_windows(1);
        host.set_value(
            ids[0],
            DOCKING_INFO_KEY,
            serde_json::json!({"id": "existing"}),
        )
        .await
        .unwrap();
        let sessions = SessionIdentityStore::new(host, true);
        let identity = sessions.observe(ids[0]).await.unwrap();
        assert_eq!(identity.id.as_str(), "existing");
    }

    #[tokio::test]
    async fn set_parent_links_to_parent_identity() {
        let (host, ids) = host_with_windows(2);
        let (anchor, satellite) = (ids[0], ids[1]);
        let sessions = SessionIdentityStore::new(host.clone(), true);

        sessions.set_parent(satellite, anchor).await;

        let anchor_identity = sessions.read(anchor).await.unwrap();
        let satellite_identity = sessions.read(satellite).await.unwrap();
        assert_eq!(satellite_identity.parent_id, Some(anchor_identity.id));
        assert_eq!(anchor_identity.parent_id, None);
    }

    #[tokio::test]
    async fn concurrent_parent_writes_settle_on_one_value() {
        let (host, ids) = host_with_windows(3);
        let sessions = Arc::new(SessionIdentityStore::new(host, true));

        let a = sessions.clone();
        let b = sessions.clone();
        let (satellite, p1, p2) = (ids[0], ids[1], ids[2]);
        tokio::join!(a.set_parent(satellite, p1), b.set_parent(satellite, p2));

        let identity = sessions.read(satellite).await.unwrap();
        let p1_id = sessions.read(p1).await.unwrap().id;
        let p2_id = sessions.read(p2).await.unwrap().id;
        let parent = identity.parent_id.unwrap();
        assert!(parent == p1_id || parent == p2_id);
        // Cached and stored copies agree.
        assert_eq!(sessions.observe(satellite).await.unwrap().parent_id, Some(parent));
    }

    #[tokio::test]
    async fn inactive_without_persistence() {
        let sessions = SessionIdentityStore::new(Arc::new(NoopValueStore), true);
        assert!(!sessions.is_active());
        assert_eq!(sessions.observe(WindowId(1)).await, None);
        sessions.set_parent(WindowId(1), WindowId(2)).await;
    }

    #[tokio::test]
    async fn disabled_store_writes_nothing() {
        let (host, ids) = host_with_windows(1);
        let sessions = SessionIdentityStore::new(host.clone(), false);
        assert_eq!(sessions.observe(ids[0]).await, None);
        assert_eq!(host.stored_value(ids[0], DOCKING_INFO_KEY), None);
    }

    #[tokio::test]
    async fn force_persist_rewrites_cleared_values() {
        let (host, ids) = host_with_windows(1);
        let sessions = SessionIdentityStore::new(host.clone(), true);
        let identity = sessions.observe(ids[0]).await.unwrap();

        host.remove_value(ids[0], DOCKING_INFO_KEY).await.unwrap();
        sessions.force_persist_all().await;
        assert_eq!(sessions.read(ids[0]).await, Some(identity));
    }

    #[tokio::test]
    async fn clear_removes_stored_value() {
        let (host, ids) = host_with_windows(1);
        let sessions = SessionIdentityStore::new(host.clone(), true);
        sessions.observe(ids[0]).await;
        sessions.clear(ids[0]).await;
        assert_eq!(host.stored_value(ids[0], DOCKING_INFO_KEY), None);
    }
}
