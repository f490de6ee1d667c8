//! Dispatcher — ingest and tick loops.
//!
//! The ingest loop subscribes to the inbound topic and turns raw events
//! into pending tasks. The tick loop drains a bounded, priority-ordered
//! batch on a fixed interval and emits each task to its worker topic.
//!
//! Emission is fire-and-forget: a failed publish is logged and the task is
//! still considered dispatched — there is no retry, acknowledgement
//! tracking, or dead-letter handling. Tasks still pending at shutdown are
//! discarded.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::config::DispatcherConfig;
use crate::dispatch::classify::Classifier;
use crate::dispatch::queue::PendingQueue;
use crate::dispatch::task::{Priority, Task, TaskEvent};
use crate::error::{BrokerError, DispatchError, Result};

/// Periodic batch dispatcher over an in-process broker.
pub struct Dispatcher {
    config: DispatcherConfig,
    broker: Arc<Broker>,
    queue: Arc<PendingQueue>,
    classifier: Classifier,
}

impl Dispatcher {
    /// Create a dispatcher with the default classification rules.
    pub fn new(config: DispatcherConfig, broker: Arc<Broker>, queue: Arc<PendingQueue>) -> Self {
        Self::with_classifier(config, broker, queue, Classifier::default_rules())
    }

    /// Create a dispatcher with a custom classifier.
    pub fn with_classifier(
        config: DispatcherConfig,
        broker: Arc<Broker>,
        queue: Arc<PendingQueue>,
        classifier: Classifier,
    ) -> Self {
        Self {
            config,
            broker,
            queue,
            classifier,
        }
    }

    /// Classify an inbound event and submit the resulting task.
    ///
    /// Returns the task ID on success. The payload is forwarded opaque.
    pub async fn ingest_event(&self, event: TaskEvent) -> Result<uuid::Uuid> {
        let (kind, target_worker) = self.classifier.classify(&event.event_type);
        let priority = Priority::parse_or_default(event.priority.as_deref());

        let task = Task::new(kind, target_worker, event.payload, priority);
        let task_id = task.id;
        self.queue.submit(task).await?;
        Ok(task_id)
    }

    /// Run one dispatch tick. Returns the number of tasks dispatched.
    ///
    /// No-op on an empty queue. Otherwise drains up to `batch_size` tasks,
    /// highest priority first, and publishes each full task record as JSON
    /// to `agents/<worker>/tasks/new`.
    pub async fn tick(&self) -> usize {
        let batch = self.queue.drain_batch(self.config.batch_size).await;
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        for task in batch {
            let topic = task.worker_topic();
            let record = match serde_json::to_value(&task) {
                Ok(v) => v,
                Err(e) => {
                    // Task is already out of the queue; nothing to redeliver.
                    let err = BrokerError::Serialization {
                        topic: topic.clone(),
                        reason: e.to_string(),
                    };
                    warn!(task_id = %task.id, error = %err, "Dropping task");
                    continue;
                }
            };

            match self.broker.publish(&topic, record).await {
                Ok(delivered) => {
                    debug!(
                        task_id = %task.id,
                        topic = %topic,
                        delivered,
                        "Task dispatched"
                    );
                }
                Err(e) => {
                    // Log and continue: the task stays dispatched and is
                    // dropped, matching the no-redelivery policy.
                    warn!(task_id = %task.id, topic = %topic, error = %e, "Publish failed");
                }
            }
        }

        info!(count, "Dispatch tick completed");
        count
    }

    /// Access the pending queue (for status reporting).
    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    /// Access the broker.
    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Inbound topic this dispatcher ingests from.
    pub fn inbound_topic(&self) -> &str {
        &self.config.inbound_topic
    }
}

/// Spawn the periodic tick loop.
pub fn spawn_tick_loop(dispatcher: Arc<Dispatcher>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = dispatcher.config.tick_interval.as_secs(),
            batch_size = dispatcher.config.batch_size,
            "Dispatch tick loop started"
        );

        let mut interval = tokio::time::interval(dispatcher.config.tick_interval);
        loop {
            interval.tick().await;
            dispatcher.tick().await;
        }
    })
}

/// Spawn the ingest loop on the configured inbound topic.
///
/// Malformed events are logged and skipped. The loop exits when the
/// inbound topic's channel closes.
pub fn spawn_ingest_loop(dispatcher: Arc<Dispatcher>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let topic = dispatcher.config.inbound_topic.clone();
        let mut rx = dispatcher.broker.subscribe(&topic).await;
        info!(topic = %topic, "Ingest loop started");

        loop {
            match rx.recv().await {
                Ok(raw) => {
                    let event: TaskEvent = match serde_json::from_value(raw) {
                        Ok(e) => e,
                        Err(e) => {
                            let err = DispatchError::MalformedEvent {
                                topic: topic.clone(),
                                reason: e.to_string(),
                            };
                            warn!(error = %err, "Skipping task event");
                            continue;
                        }
                    };
                    if let Err(e) = dispatcher.ingest_event(event).await {
                        warn!(topic = %topic, error = %e, "Rejected task event");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(topic = %topic, missed, "Ingest loop lagged, events lost");
                }
                Err(RecvError::Closed) => {
                    info!(topic = %topic, "Inbound topic closed, ingest loop exiting");
                    break;
                }
            }
        }
    })
}
