//! The authoritative set of tracked satellite/anchor pairs.
//!
//! Records are kept in insertion order, which is also the order sibling
//! ordinals are assigned in. Async consumers iterate over a [`snapshot`]
//! taken at the start of their operation and never hold the lock across an
//! await.
//!
//! [`snapshot`]: WindowRegistry::snapshot

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use sidedock_common::{DockError, WindowId, WindowInfo};
use tokio::sync::watch;

/// One satellite and the anchor it is docked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedWindow {
    pub satellite_id: WindowId,
    pub anchor_id: WindowId,
    /// Last observed satellite window.
    pub satellite: Option<WindowInfo>,
    /// Last observed anchor window, kept so a satellite can take over the
    /// anchor's geometry after the anchor closes.
    pub anchor: Option<WindowInfo>,
    /// Last width this engine itself pushed into the shared config.
    pub synced_width: Option<i32>,
    /// Pending removal. Never reset once set.
    pub forget: bool,
}

impl TrackedWindow {
    pub fn new(satellite_id: WindowId, anchor_id: WindowId) -> Self {
        Self {
            satellite_id,
            anchor_id,
            satellite: None,
            anchor: None,
            synced_width: None,
            forget: false,
        }
    }

    pub fn with_windows(mut self, satellite: Option<WindowInfo>, anchor: Option<WindowInfo>) -> Self {
        self.satellite = satellite;
        self.anchor = anchor;
        self
    }
}

/// Thread-safe registry of [`TrackedWindow`] records.
pub struct WindowRegistry {
    records: Mutex<Vec<TrackedWindow>>,
    generation: watch::Sender<u64>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            records: Mutex::new(Vec::new()),
            generation,
        }
    }

    fn records(&self) -> MutexGuard<'_, Vec<TrackedWindow>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.generation.send_modify(|g| *g = g.wrapping_add(1));
    }

    /// Register a pair. Rejects a satellite docked to itself and a satellite
    /// that is already tracked.
    pub fn add(&self, record: TrackedWindow) -> Result<(), DockError> {
        if record.satellite_id == record.anchor_id {
            return Err(DockError::Registry(format!(
                "{} cannot be docked to itself",
                record.satellite_id
            )));
        }
        {
            let mut records = self.records();
            if records.iter().any(|r| r.satellite_id == record.satellite_id) {
                return Err(DockError::Registry(format!(
                    "{} is already tracked",
                    record.satellite_id
                )));
            }
            records.push(record);
        }
        self.bump();
        Ok(())
    }

    pub fn remove(&self, satellite_id: WindowId) -> Option<TrackedWindow> {
        let removed = {
            let mut records = self.records();
            let index = records.iter().position(|r| r.satellite_id == satellite_id)?;
            records.remove(index)
        };
        self.bump();
        Some(removed)
    }

    /// Keep only records for which `keep` returns true. Returns the dropped
    /// records.
    pub fn retain(&self, mut keep: impl FnMut(&TrackedWindow) -> bool) -> Vec<TrackedWindow> {
        let dropped: Vec<TrackedWindow> = {
            let mut records = self.records();
            let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut *records)
                .into_iter()
                .partition(|r| keep(r));
            *records = kept;
            dropped
        };
        if !dropped.is_empty() {
            self.bump();
        }
        dropped
    }

    /// Apply `edit` to the record for `satellite_id` under the lock. Returns
    /// `false` if the satellite is not tracked.
    pub fn update(&self, satellite_id: WindowId, edit: impl FnOnce(&mut TrackedWindow)) -> bool {
        match self.records().iter_mut().find(|r| r.satellite_id == satellite_id) {
            Some(record) => {
                edit(record);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, satellite_id: WindowId) -> Option<TrackedWindow> {
        self.records()
            .iter()
            .find(|r| r.satellite_id == satellite_id)
            .cloned()
    }

    /// True if `id` is any tracked satellite.
    pub fn is_tracked(&self, id: WindowId) -> bool {
        self.records().iter().any(|r| r.satellite_id == id)
    }

    /// True if `id` is the anchor of any tracked satellite.
    pub fn is_anchor(&self, id: WindowId) -> bool {
        self.records().iter().any(|r| r.anchor_id == id)
    }

    /// True if `id` is either side of any pair.
    pub fn involves(&self, id: WindowId) -> bool {
        self.records()
            .iter()
            .any(|r| r.satellite_id == id || r.anchor_id == id)
    }

    pub fn anchor_of(&self, satellite_id: WindowId) -> Option<WindowId> {
        self.records()
            .iter()
            .find(|r| r.satellite_id == satellite_id)
            .map(|r| r.anchor_id)
    }

    /// Satellites of `anchor_id` in registry order.
    pub fn satellites_of(&self, anchor_id: WindowId) -> Vec<WindowId> {
        self.records()
            .iter()
            .filter(|r| r.anchor_id == anchor_id)
            .map(|r| r.satellite_id)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<TrackedWindow> {
        self.records().clone()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Counter bumped on every membership change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Wait until `done` holds for the current records, re-checking after
    /// every membership change. Returns `false` if `timeout` elapsed first.
    pub async fn wait_until(
        &self,
        timeout: Duration,
        mut done: impl FnMut(&[TrackedWindow]) -> bool,
    ) -> bool {
        let mut changes = self.changes();
        let wait = async {
            loop {
                let satisfied = done(&self.records());
                if satisfied {
                    return true;
                }
                if changes.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pair(satellite: u64, anchor: u64) -> TrackedWindow {
        TrackedWindow::new(WindowId(satellite), WindowId(anchor))
    }

    #[test]
    fn add_and_query() {
        let registry = WindowRegistry::new();
        registry.add(pair(2, 1)).unwrap();
        registry.add(pair(3, 1)).unwrap();

        assert!(registry.is_tracked(WindowId(2)));
        assert!(!registry.is_tracked(WindowId(1)));
        assert!(registry.is_anchor(WindowId(1)));
        assert!(!registry.is_anchor(WindowId(2)));
        assert_eq!(registry.satellites_of(WindowId(1)), vec![WindowId(2), WindowId(3)]);
        assert_eq!(registry.anchor_of(WindowId(3)), Some(WindowId(1)));
    }

    #[test]
    fn rejects_self_anchor() {
        let registry = WindowRegistry::new();
        let err = registry.add(pair(4, 4)).unwrap_err();
        assert!(matches!(err, DockError::Registry(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_duplicate_satellite() {
        let registry = WindowRegistry::new();
        registry.add(pair(2, 1)).unwrap();
        assert!(registry.add(pair(2, 5)).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_is_detached() {
        let registry = WindowRegistry::new();
        registry.add(pair(2, 1)).unwrap();
        let snapshot = registry.snapshot();
        registry.remove(WindowId(2));
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn retain_returns_dropped() {
        let registry = WindowRegistry::new();
        registry.add(pair(2, 1)).unwrap();
        registry.add(pair(3, 1)).unwrap();
        registry.update(WindowId(3), |r| r.forget = true);
        let dropped = registry.retain(|r| !r.forget);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].satellite_id, WindowId(3));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn changes_bump_on_membership() {
        let registry = WindowRegistry::new();
        let rx = registry.changes();
        registry.add(pair(2, 1)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn wait_until_sees_removal() {
        let registry = Arc::new(WindowRegistry::new());
        registry.add(pair(2, 1)).unwrap();
        registry.add(pair(3, 1)).unwrap();

        let remover = registry.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            remover.remove(WindowId(3));
        });

        let done = registry
            .wait_until(Duration::from_secs(1), |records| {
                !records.iter().any(|r| r.satellite_id == WindowId(3))
            })
            .await;
        assert!(done);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_times_out() {
        let registry = WindowRegistry::new();
        registry.add(pair(2, 1)).unwrap();
        let done = registry
            .wait_until(Duration::from_secs(5), |records| records.is_empty())
            .await;
        assert!(!done);
    }
}
