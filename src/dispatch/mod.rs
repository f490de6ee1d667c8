//! Task dispatch pipeline.
//!
//! All inbound task events flow through:
//! 1. `Broker` subscription on the inbound topic — raw JSON events
//! 2. `Classifier::classify()` — ordered keyword rule table, first match wins
//! 3. `PendingQueue::submit()` — single-owner pending buffer
//! 4. `Dispatcher` tick — priority-ordered bounded batch to per-worker topics
//!
//! No feedback loop exists: workers report completions on their own status
//! topics and the dispatcher never consumes them.

pub mod classify;
pub mod dispatcher;
pub mod queue;
pub mod task;

pub use classify::Classifier;
pub use dispatcher::Dispatcher;
pub use queue::PendingQueue;
pub use task::{Priority, Task, TaskEvent, TaskKind, TaskStatus};
