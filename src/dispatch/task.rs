//! Shared types for the dispatch pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Priority ────────────────────────────────────────────────────────

/// Dispatch priority. Higher values drain first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    /// Numeric rank used for batch ordering (high=3, medium=2, low=1).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Parse a priority label case-insensitively.
    ///
    /// Absent or unrecognized labels default to `Medium`.
    pub fn parse_or_default(label: Option<&str>) -> Self {
        match label.map(str::to_ascii_lowercase).as_deref() {
            Some("high") => Self::High,
            Some("low") => Self::Low,
            Some("medium") => Self::Medium,
            _ => Self::Medium,
        }
    }
}

// ── Task kind ───────────────────────────────────────────────────────

/// Category a task is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Financial,
    Design,
    Support,
    Marketing,
    General,
}

impl TaskKind {
    /// Short label for logging.
    pub fn label(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Design => "design",
            Self::Support => "support",
            Self::Marketing => "marketing",
            Self::General => "general",
        }
    }
}

// ── Task status ─────────────────────────────────────────────────────

/// Task lifecycle state. The only transition is Pending → Dispatched,
/// performed exactly once by the dispatch tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Dispatched,
}

// ── Task ────────────────────────────────────────────────────────────

/// A unit of routable work.
///
/// Created on event arrival, mutated only by the dispatch step (status
/// flip), and dropped from memory immediately after dispatch. No history
/// is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique ID, generated at creation.
    pub id: Uuid,
    /// Classified category.
    pub kind: TaskKind,
    /// Worker queue this task routes to (e.g. "finance-worker").
    pub target_worker: String,
    /// Opaque payload — never interpreted by the dispatcher.
    pub payload: serde_json::Value,
    /// Dispatch priority.
    pub priority: Priority,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: TaskStatus,
}

impl Task {
    /// Create a pending task with a fresh ID.
    pub fn new(
        kind: TaskKind,
        target_worker: impl Into<String>,
        payload: serde_json::Value,
        priority: Priority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target_worker: target_worker.into(),
            payload,
            priority,
            created_at: Utc::now(),
            status: TaskStatus::Pending,
        }
    }

    /// Outbound topic this task is emitted on when dispatched.
    pub fn worker_topic(&self) -> String {
        format!("agents/{}/tasks/new", self.target_worker)
    }
}

// ── Inbound event ───────────────────────────────────────────────────

/// Wire shape of an inbound task event on the inbound topic.
///
/// `priority` is optional and defaults to medium; unknown fields are
/// ignored so producers can attach extra metadata freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Event descriptor, matched against the classification rules.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Opaque payload forwarded to the worker untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Priority label ("high" | "medium" | "low"), if any.
    #[serde(default)]
    pub priority: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn priority_ranks() {
        assert_eq!(Priority::High.rank(), 3);
        assert_eq!(Priority::Medium.rank(), 2);
        assert_eq!(Priority::Low.rank(), 1);
        assert!(Priority::High > Priority::Low);
    }

    #[test]
    fn priority_parse_defaults_to_medium() {
        assert_eq!(Priority::parse_or_default(None), Priority::Medium);
        assert_eq!(Priority::parse_or_default(Some("urgent")), Priority::Medium);
        assert_eq!(Priority::parse_or_default(Some("")), Priority::Medium);
    }

    #[test]
    fn priority_parse_case_insensitive() {
        assert_eq!(Priority::parse_or_default(Some("HIGH")), Priority::High);
        assert_eq!(Priority::parse_or_default(Some("Low")), Priority::Low);
        assert_eq!(Priority::parse_or_default(Some("medium")), Priority::Medium);
    }

    #[test]
    fn task_starts_pending_with_unique_id() {
        let a = Task::new(TaskKind::General, "general-worker", json!({}), Priority::Medium);
        let b = Task::new(TaskKind::General, "general-worker", json!({}), Priority::Medium);
        assert_eq!(a.status, TaskStatus::Pending);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn worker_topic_shape() {
        let task = Task::new(
            TaskKind::Financial,
            "finance-worker",
            json!({"amount": 42}),
            Priority::High,
        );
        assert_eq!(task.worker_topic(), "agents/finance-worker/tasks/new");
    }

    #[test]
    fn task_event_ignores_unknown_fields() {
        let event: TaskEvent = serde_json::from_value(json!({
            "type": "payment_received",
            "payload": {"invoice": "INV-1"},
            "priority": "high",
            "source": "webhook",
        }))
        .unwrap();
        assert_eq!(event.event_type, "payment_received");
        assert_eq!(event.priority.as_deref(), Some("high"));
    }

    #[test]
    fn task_event_payload_defaults_to_null() {
        let event: TaskEvent = serde_json::from_value(json!({"type": "x"})).unwrap();
        assert!(event.payload.is_null());
        assert!(event.priority.is_none());
    }

    #[test]
    fn task_serializes_full_record() {
        let task = Task::new(
            TaskKind::Design,
            "design-worker",
            json!({"screen": "checkout"}),
            Priority::Low,
        );
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["kind"], "design");
        assert_eq!(value["priority"], "low");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["target_worker"], "design-worker");
        assert!(value["id"].is_string());
    }
}
