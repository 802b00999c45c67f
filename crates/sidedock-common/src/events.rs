use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{CommandOrigin, WindowId};

/// Notifications published by the window-management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WindowEvent {
    Created(WindowId),
    Removed(WindowId),
    /// `window_id` is `None` when no window of the host has focus.
    FocusChanged {
        window_id: Option<WindowId>,
        origin: CommandOrigin,
    },
}

pub struct EventBus {
    sender: broadcast::Sender<WindowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: WindowEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
