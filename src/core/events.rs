// src/core/events.rs
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::network::contact::{ContactCredentials, RemoteContact};
use crate::storage::types::PluginRecord;
use crate::utils::error::Result;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceEventType {
    ResourceAdded,
}

/// Lifecycle notification republished once a device joins the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub event_type: DeviceEventType,
    pub plugin_id: String,
    pub address: String,
    pub timestamp: DateTime<Utc>,
}

/// Creates the plugin-side event subscription and republishes lifecycle
/// events in-process. Everything here is best-effort: a failure after the
/// record is persisted is logged, never rolled back.
pub struct EventBridge {
    contact: Arc<dyn RemoteContact>,
    destination: String,
    events_tx: broadcast::Sender<DeviceEvent>,
    // Message-bus topics this aggregator listens on; the bus transport
    // itself lives behind an external collaborator.
    emb_topics: Mutex<HashSet<String>>,
}

impl EventBridge {
    pub fn new(contact: Arc<dyn RemoteContact>, destination: String) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            contact,
            destination,
            events_tx,
            emb_topics: Mutex::new(HashSet::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events_tx.subscribe()
    }

    pub async fn create_subscription(
        &self,
        record: &PluginRecord,
        credentials: &ContactCredentials,
    ) -> Result<()> {
        self.contact
            .create_subscription(&record.address, credentials, &self.destination)
            .await?;
        info!("Created event subscription on plugin {}", record.id);
        Ok(())
    }

    /// Registers the message-bus topics advertised by the plugin's status
    /// response.
    pub fn subscribe_emb(&self, topics: &[String]) {
        let mut registered = self.emb_topics.lock();
        for topic in topics {
            if registered.insert(topic.clone()) {
                info!("Subscribed to event message bus topic {}", topic);
            }
        }
    }

    pub fn emb_topics(&self) -> Vec<String> {
        self.emb_topics.lock().iter().cloned().collect()
    }

    pub fn publish_resource_added(&self, plugin_id: &str, address: &str) {
        let event = DeviceEvent {
            event_type: DeviceEventType::ResourceAdded,
            plugin_id: plugin_id.to_string(),
            address: address.to_string(),
            timestamp: Utc::now(),
        };

        match self.events_tx.send(event) {
            Ok(receivers) => info!(
                "Published ResourceAdded for plugin {} to {} subscriber(s)",
                plugin_id, receivers
            ),
            // No live subscribers is not a fault.
            Err(_) => debug!("No subscribers for ResourceAdded event of {}", plugin_id),
        }
    }
}
