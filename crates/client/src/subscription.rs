use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use lab_sync_core::events::types::ChangeEvent;

use crate::backend::Backend;

const CHANNEL_CAPACITY: usize = 256;

/// Shared change-feed registry: one upstream backend channel per table name,
/// no matter how many views are mounted on it. The first subscriber opens
/// the channel and a fan-out task; later subscribers only add local
/// receivers. Dropping the last [`Subscription`] for a table closes the
/// upstream channel again.
#[derive(Clone)]
pub struct Subscriptions {
    backend: Arc<dyn Backend>,
    channels: Arc<Mutex<HashMap<String, TableChannel>>>,
}

struct TableChannel {
    sender: broadcast::Sender<ChangeEvent>,
    listeners: usize,
    forward: JoinHandle<()>,
}

impl Subscriptions {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Attach a listener to a table's change feed, opening the upstream
    /// channel if this is the first one. Must be called from within a tokio
    /// runtime.
    pub fn subscribe(&self, table: &str) -> Subscription {
        let mut channels = self.channels.lock().expect("subscription registry poisoned");
        let channel = channels
            .entry(table.to_string())
            .or_insert_with(|| self.open_channel(table));
        channel.listeners += 1;
        Subscription {
            table: table.to_string(),
            receiver: channel.sender.subscribe(),
            channels: Arc::clone(&self.channels),
        }
    }

    /// Number of local listeners currently attached to a table.
    pub fn listener_count(&self, table: &str) -> usize {
        let channels = self.channels.lock().expect("subscription registry poisoned");
        channels.get(table).map(|c| c.listeners).unwrap_or(0)
    }

    fn open_channel(&self, table: &str) -> TableChannel {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let mut upstream = self.backend.changes(table);
        let fan_out = sender.clone();
        let table_name = table.to_string();
        let forward = tokio::spawn(async move {
            loop {
                match upstream.recv().await {
                    Ok(event) => {
                        // Nobody listening locally is fine; the event is
                        // simply dropped.
                        let _ = fan_out.send(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(table = %table_name, missed, "change feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        tracing::debug!(table, "opened upstream change channel");
        TableChannel {
            sender,
            listeners: 0,
            forward,
        }
    }
}

/// One view's handle on a table's change feed. Dropping it detaches the
/// listener; the last drop for a table tears down the upstream channel.
pub struct Subscription {
    table: String,
    receiver: broadcast::Receiver<ChangeEvent>,
    channels: Arc<Mutex<HashMap<String, TableChannel>>>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<ChangeEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut channels = self.channels.lock().expect("subscription registry poisoned");
        let remove = match channels.get_mut(&self.table) {
            Some(channel) => {
                channel.listeners -= 1;
                channel.listeners == 0
            }
            None => false,
        };
        if remove {
            if let Some(channel) = channels.remove(&self.table) {
                channel.forward.abort();
                tracing::debug!(table = %self.table, "closed upstream change channel");
            }
        }
    }
}
