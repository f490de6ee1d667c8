//! Pending task queue — single-owner buffer between ingest and dispatch.
//!
//! `submit()` and `drain_batch()` are the only mutation points. All access
//! goes through one lock so a submit interleaved with a drain can neither
//! lose nor duplicate a task.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::dispatch::task::{Task, TaskStatus};
use crate::error::DispatchError;

/// Snapshot of queue activity, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    /// Tasks currently pending.
    pub pending: usize,
    /// Tasks accepted since startup.
    pub submitted_total: u64,
    /// Tasks dispatched since startup, per worker queue.
    pub dispatched_by_worker: HashMap<String, u64>,
}

#[derive(Default)]
struct Counters {
    submitted_total: u64,
    dispatched_by_worker: HashMap<String, u64>,
}

/// In-memory pending queue.
pub struct PendingQueue {
    tasks: RwLock<VecDeque<Task>>,
    counters: RwLock<Counters>,
}

impl PendingQueue {
    /// Create a new empty queue.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(VecDeque::new()),
            counters: RwLock::new(Counters::default()),
        })
    }

    /// Append a task to the pending collection.
    ///
    /// The only validation is that the target worker is non-empty; the
    /// payload is opaque and never inspected.
    pub async fn submit(&self, task: Task) -> Result<(), DispatchError> {
        if task.target_worker.is_empty() {
            return Err(DispatchError::InvalidTask {
                reason: "target_worker is empty".to_string(),
            });
        }

        info!(
            task_id = %task.id,
            kind = task.kind.label(),
            worker = %task.target_worker,
            priority = ?task.priority,
            "Task submitted"
        );

        self.tasks.write().await.push_back(task);
        self.counters.write().await.submitted_total += 1;
        Ok(())
    }

    /// Remove and return up to `n` tasks, highest priority first, marking
    /// each dispatched.
    ///
    /// The sort is stable: tasks of equal priority keep their relative
    /// submission order. Tasks beyond the batch bound stay pending for the
    /// next drain.
    pub async fn drain_batch(&self, n: usize) -> Vec<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.is_empty() || n == 0 {
            return Vec::new();
        }

        tasks
            .make_contiguous()
            .sort_by_key(|t| std::cmp::Reverse(t.priority.rank()));

        let take = n.min(tasks.len());
        let mut batch: Vec<Task> = tasks.drain(..take).collect();
        drop(tasks);

        let mut counters = self.counters.write().await;
        for task in &mut batch {
            task.status = TaskStatus::Dispatched;
            *counters
                .dispatched_by_worker
                .entry(task.target_worker.clone())
                .or_insert(0) += 1;
        }
        batch
    }

    /// Number of pending tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Check if the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Snapshot current queue activity.
    pub async fn status_summary(&self) -> QueueStatus {
        let pending = self.tasks.read().await.len();
        let counters = self.counters.read().await;
        QueueStatus {
            pending,
            submitted_total: counters.submitted_total,
            dispatched_by_worker: counters.dispatched_by_worker.clone(),
        }
    }
}
