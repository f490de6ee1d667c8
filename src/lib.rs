//! Agent Dispatch — lean task-routing core.

pub mod broker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod worker;
