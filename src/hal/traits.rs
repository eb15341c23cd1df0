use async_trait::async_trait;
use thiserror::Error;
use crate::core::RawMessage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("subscribe to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("disconnect failed: {0}")]
    Disconnect(String),

    #[error("connection closed")]
    Closed,
}

/// Outbound half of a publish/subscribe connection.
///
/// Implementations are shared between the session, the command encoder and
/// the shutdown coordinator, so every method takes `&self`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short identifier used in log lines (e.g. "mqtt", "mock")
    fn transport_id(&self) -> &str;

    async fn subscribe(&self, topic_pattern: &str) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Release the connection. After this the paired [`InboundStream`]
    /// drains and returns `None`.
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Inbound half: yields deliveries in arrival order.
#[async_trait]
pub trait InboundStream: Send {
    /// Next delivered message, or `None` once the connection is closed
    async fn next_message(&mut self) -> Option<RawMessage>;
}
