//! Poll scheduling.
//!
//! The slow timer runs whenever docking is simulated. Any applied change
//! sets the dirty flag; a slow tick that finds it set starts the fast timer
//! and still runs its own pass. The fast timer keeps running until one of
//! its ticks changes nothing. Listener tasks are installed and removed here
//! as well, following the derived [`ActiveFeatures`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::{Arc, MutexGuard};
use std::time::Duration;

use sidedock_common::{WindowEvent, WindowId};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::types::{Activity, CheckOptions, FocusState, Inner, Listener, Timer};
use crate::features::ActiveFeatures;

/// Timers never run faster than this.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Slow,
    Fast,
}

impl Inner {
    pub(crate) fn activity(&self) -> MutexGuard<'_, Activity> {
        self.activity.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn focus(&self) -> MutexGuard<'_, FocusState> {
        self.focus.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Token of the current run. Every timer and listener token is a child.
    pub(crate) fn run_token(&self) -> CancellationToken {
        self.run.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.run_token().is_cancelled()
    }

    /// Re-derive which timers and listeners should run, optionally after
    /// dropping records whose windows are gone.
    pub(crate) async fn check(self: &Arc<Self>, options: CheckOptions) {
        if options.revalidate && !self.registry.is_empty() {
            self.revalidate().await;
        }
        self.apply_features(options.reset);
    }

    pub(crate) fn apply_features(self: &Arc<Self>, reset: bool) {
        let features = if self.is_stopped() {
            ActiveFeatures::idle()
        } else {
            ActiveFeatures::derive(&self.config.snapshot(), !self.registry.is_empty())
        };

        let mut activity = self.activity();
        match features.slow_interval {
            Some(period) => {
                let period = period.max(MIN_PERIOD);
                let current = matches!(&activity.slow, Some(timer) if timer.period == period);
                if reset || !current {
                    activity.slow = Some(self.spawn_timer(TimerKind::Slow, period));
                    self.mark_dirty();
                    debug!(?period, "slow polling started");
                }
            }
            None => {
                if activity.slow.take().is_some() {
                    debug!("docking simulation stopped");
                }
                activity.fast = None;
            }
        }

        let fast_current = match (&activity.fast, features.fast_interval) {
            (Some(timer), Some(period)) => timer.period == period.max(MIN_PERIOD),
            (Some(_), None) => false,
            (None, _) => true,
        };
        if !fast_current {
            activity.fast = None;
        }

        if !features.focus_listener {
            activity.focus_listener = None;
        } else if activity.focus_listener.is_none() {
            activity.focus_listener = Some(self.spawn_focus_listener());
        }
        if !features.removed_listener {
            activity.removed_listener = None;
        } else if activity.removed_listener.is_none() {
            activity.removed_listener = Some(self.spawn_removed_listener());
        }

        activity.features = features;
    }

    /// Drop records whose satellite or anchor no longer exists, or that are
    /// pending removal. Returns how many were dropped.
    pub(crate) async fn revalidate(&self) -> usize {
        let windows = match self.host.windows.list(false).await {
            Ok(windows) => windows,
            Err(e) => {
                warn!(error = %e, "failed to list windows for revalidation");
                return 0;
            }
        };
        let open: HashSet<WindowId> = windows.iter().map(|w| w.id).collect();
        let dropped = self.registry.retain(|r| {
            !r.forget && open.contains(&r.satellite_id) && open.contains(&r.anchor_id)
        });
        for record in &dropped {
            debug!(
                satellite = %record.satellite_id,
                anchor = %record.anchor_id,
                "stopped tracking docked window"
            );
        }
        dropped.len()
    }

    pub(crate) async fn slow_tick(self: &Arc<Self>) {
        let fast_running = self.activity().fast.is_some();
        if fast_running {
            return;
        }
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.start_fast();
        }
        self.layout_pass().await;
        if self.dirty.load(Ordering::SeqCst) {
            self.start_fast();
        }
    }

    pub(crate) async fn fast_tick(self: &Arc<Self>) {
        self.dirty.store(false, Ordering::SeqCst);
        self.layout_pass().await;
        if !self.dirty.load(Ordering::SeqCst) && self.activity().fast.take().is_some() {
            trace!("fast polling stopped");
        }
    }

    /// Start the fast timer if one is configured. Returns `true` if fast
    /// polling is running afterwards.
    fn start_fast(self: &Arc<Self>) -> bool {
        let mut activity = self.activity();
        if activity.fast.is_some() {
            return true;
        }
        let Some(period) = activity.features.fast_interval else {
            return false;
        };
        if activity.slow.is_none() {
            return false;
        }
        activity.fast = Some(self.spawn_timer(TimerKind::Fast, period.max(MIN_PERIOD)));
        trace!(?period, "fast polling started");
        true
    }

    fn spawn_timer(self: &Arc<Self>, kind: TimerKind, period: Duration) -> Timer {
        let cancel = self.run_token().child_token();
        let token = cancel.clone();
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        match kind {
                            TimerKind::Slow => inner.slow_tick().await,
                            TimerKind::Fast => inner.fast_tick().await,
                        }
                    }
                }
            }
            trace!(?kind, "timer stopped");
        });
        Timer { period, cancel }
    }

    /// Run `on_event` for every window event until the returned listener is
    /// dropped. Events are handled one at a time, in order.
    pub(crate) fn spawn_event_listener<F, Fut>(
        self: &Arc<Self>,
        name: &'static str,
        mut on_event: F,
    ) -> Listener
    where
        F: FnMut(Arc<Inner>, WindowEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.run_token().child_token();
        let token = cancel.clone();
        let weak = Arc::downgrade(self);
        let mut events = self.host.windows.subscribe();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) => {
                        let Some(inner) = weak.upgrade() else { break };
                        on_event(inner, event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(listener = name, skipped, "window events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            trace!(listener = name, "listener stopped");
        });
        Listener { cancel }
    }
}
