//! Worker subscriber harness.
//!
//! Workers are external collaborators from the dispatcher's point of view:
//! each one subscribes to its own task topic, handles tasks through a
//! `TaskHandler`, and publishes a completion notice to its status topic.
//! The dispatcher never consumes those notices.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::broker::Broker;
use crate::dispatch::task::Task;

/// Trait for task handlers — the worker-side business logic seam.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Handle a dispatched task. Errors are reported in the completion
    /// notice; the dispatcher never sees them.
    async fn handle(&self, task: &Task) -> Result<(), String>;
}

/// Handler that just logs each task.
pub struct LogHandler;

#[async_trait]
impl TaskHandler for LogHandler {
    async fn handle(&self, task: &Task) -> Result<(), String> {
        info!(
            task_id = %task.id,
            kind = task.kind.label(),
            "Worker handled task"
        );
        Ok(())
    }
}

/// Spawn a worker loop for the named worker queue.
///
/// Subscribes to `agents/<name>/tasks/new`, runs the handler per task and
/// publishes `{task_id, worker, success, completed_at}` to
/// `agents/<name>/status`. Exits when the task topic closes.
pub fn spawn_worker(
    broker: Arc<Broker>,
    name: &str,
    handler: Arc<dyn TaskHandler>,
) -> JoinHandle<()> {
    let name = name.to_string();
    tokio::spawn(async move {
        let task_topic = format!("agents/{name}/tasks/new");
        let status_topic = format!("agents/{name}/status");
        let mut rx = broker.subscribe(&task_topic).await;
        info!(worker = %name, topic = %task_topic, "Worker started");

        loop {
            match rx.recv().await {
                Ok(raw) => {
                    let task: Task = match serde_json::from_value(raw) {
                        Ok(t) => t,
                        Err(e) => {
                            warn!(worker = %name, error = %e, "Malformed task record, skipping");
                            continue;
                        }
                    };

                    let result = handler.handle(&task).await;
                    if let Err(ref reason) = result {
                        error!(worker = %name, task_id = %task.id, reason = %reason, "Task handler failed");
                    }

                    let notice = json!({
                        "task_id": task.id,
                        "worker": name,
                        "success": result.is_ok(),
                        "completed_at": Utc::now(),
                    });
                    // Nobody may be listening on the status topic; that's fine.
                    if let Err(e) = broker.publish(&status_topic, notice).await {
                        debug!(worker = %name, error = %e, "Status notice dropped");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(worker = %name, missed, "Worker lagged, tasks lost");
                }
                Err(RecvError::Closed) => {
                    info!(worker = %name, "Task topic closed, worker exiting");
                    break;
                }
            }
        }
    })
}
