//! In-process pub/sub broker.
//!
//! Topic-keyed fan-out over `tokio::sync::broadcast`. Publishing is
//! fire-and-forget: a publish with no live subscribers is reported as
//! `BrokerError::NoSubscribers` so callers can log it, but delivery is
//! never retried. Lagging subscribers lose the oldest messages (broadcast
//! ring semantics).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::error::BrokerError;

/// Default per-topic broadcast capacity.
const DEFAULT_TOPIC_CAPACITY: usize = 256;

/// Topic-keyed in-process message broker.
pub struct Broker {
    topics: RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>,
    capacity: usize,
}

impl Broker {
    /// Create a broker with the default per-topic capacity.
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    /// Create a broker with an explicit per-topic capacity.
    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
        })
    }

    /// Subscribe to a topic, creating it if it does not exist yet.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        let mut topics = self.topics.write().await;
        match topics.get(topic) {
            Some(tx) => tx.subscribe(),
            None => {
                debug!(topic = %topic, "Creating topic on first subscribe");
                let (tx, rx) = broadcast::channel(self.capacity);
                topics.insert(topic.to_string(), tx);
                rx
            }
        }
    }

    /// Publish a message to a topic.
    ///
    /// Returns the number of subscribers the message was delivered to.
    /// A topic with no live subscribers yields `NoSubscribers`; the message
    /// is dropped either way.
    pub async fn publish(
        &self,
        topic: &str,
        message: serde_json::Value,
    ) -> Result<usize, BrokerError> {
        let topics = self.topics.read().await;
        let Some(tx) = topics.get(topic) else {
            return Err(BrokerError::NoSubscribers {
                topic: topic.to_string(),
            });
        };

        tx.send(message).map_err(|_| BrokerError::NoSubscribers {
            topic: topic.to_string(),
        })
    }

    /// Number of live subscribers on a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}
