//! Error types for Agent Dispatch.

/// Top-level error type for the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Pub/sub transport errors.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("No subscribers on topic {topic}")]
    NoSubscribers { topic: String },

    #[error("Failed to serialize message for topic {topic}: {reason}")]
    Serialization { topic: String, reason: String },
}

/// Task routing errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid task: {reason}")]
    InvalidTask { reason: String },

    #[error("Malformed event on topic {topic}: {reason}")]
    MalformedEvent { topic: String, reason: String },
}

/// Result type alias for the dispatcher.
pub type Result<T> = std::result::Result<T, Error>;
