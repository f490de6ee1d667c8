//! Configuration types.

use std::time::Duration;

/// Well-known inbound topic for new task events.
pub const DEFAULT_INBOUND_TOPIC: &str = "tasks/new";

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Interval between dispatch ticks.
    pub tick_interval: Duration,
    /// Maximum tasks dispatched per tick.
    pub batch_size: usize,
    /// Topic the ingest loop subscribes to.
    pub inbound_topic: String,
    /// Capacity of each per-topic broadcast channel.
    pub topic_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            batch_size: 5,
            inbound_topic: DEFAULT_INBOUND_TOPIC.to_string(),
            topic_capacity: 256,
        }
    }
}

impl DispatcherConfig {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Reads `DISPATCH_TICK_SECS`, `DISPATCH_BATCH_SIZE` and
    /// `DISPATCH_INBOUND_TOPIC`. Unparseable or zero values fall back
    /// silently, matching the rest of the env-driven startup path. A zero
    /// tick interval must never reach the interval timer.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tick_secs = std::env::var("DISPATCH_TICK_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.tick_interval.as_secs());

        let batch_size = std::env::var("DISPATCH_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.batch_size);

        let inbound_topic =
            std::env::var("DISPATCH_INBOUND_TOPIC").unwrap_or(defaults.inbound_topic);

        Self {
            tick_interval: Duration::from_secs(tick_secs),
            batch_size,
            inbound_topic,
            topic_capacity: defaults.topic_capacity,
        }
    }
}
