use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::types::ChangeEvent;

/// In-process change feed backed by `tokio::broadcast`, one channel per
/// watched table, created lazily on first use.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    capacity: usize,
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>>,
}

impl ChangeBus {
    /// Create a new bus; `capacity` bounds each per-table channel.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn sender(&self, table: &str) -> broadcast::Sender<ChangeEvent> {
        let mut channels = self.channels.lock().expect("change bus lock poisoned");
        channels
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish a change to every current subscriber of its table. Returns
    /// the number of subscribers reached; zero when nobody is listening.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        match self.sender(&event.table).send(event) {
            Ok(delivered) => delivered,
            Err(dropped) => {
                tracing::trace!(table = %dropped.0.table, "change event had no subscribers");
                0
            }
        }
    }

    /// Subscribe to one table's change stream.
    pub fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent> {
        self.sender(table).subscribe()
    }

    /// Number of active subscribers on one table.
    pub fn subscriber_count(&self, table: &str) -> usize {
        let channels = self.channels.lock().expect("change bus lock poisoned");
        channels
            .get(table)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
