// [apps/mimosa-server/src/services/event_bus.rs]
//! Broadcasts `LiveEvent`s to every connected `/ws/live` client (C10,
//! §4.10). Backed by `tokio::sync::broadcast`, which drops the oldest
//! unread message once a slow subscriber falls behind rather than
//! blocking the publisher.

use mimosa_models::LiveEvent;
use tokio::sync::broadcast;
use tracing::{instrument, trace};

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    #[instrument(skip(self, event))]
    pub fn publish(&self, event: LiveEvent) {
        match self.sender.send(event) {
            Ok(subscribers) => trace!("published live event to {} subscribers", subscribers),
            Err(_) => trace!("published live event with no subscribers"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
