// ============================================================================
// Messaging - notification events towards the downstream worker
// ============================================================================
//
// - EventEmitter     - publish one event, no retries
// - KafkaEmitter     - rdkafka producer behind a circuit breaker
// - RecordingEmitter - in-memory emitter for local runs and tests
// - BulkDispatcher   - concurrent fan-out of one order's line items, joined
//
// ============================================================================

mod dispatcher;
mod kafka;
mod recording;

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::order::NotificationEvent;
use crate::health::{ComponentHealth, HealthStatus};

pub use dispatcher::{BulkDispatcher, DispatchFailure, DispatchOutcome};
pub use kafka::KafkaEmitter;
pub use recording::RecordingEmitter;

/// Default notification channel.
pub const NOTIFY_TOPIC: &str = "email_queue";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("failed to serialize notification: {0}")]
    Serialization(String),

    #[error("broker rejected notification: {0}")]
    Broker(String),

    #[error("broker circuit breaker is open")]
    CircuitOpen,

    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("publish task aborted: {0}")]
    TaskAborted(String),
}

impl EmitError {
    pub fn reason(&self) -> &'static str {
        match self {
            EmitError::Serialization(_) => "serialization",
            EmitError::Broker(_) => "broker",
            EmitError::CircuitOpen => "circuit_open",
            EmitError::Timeout(_) => "timeout",
            EmitError::TaskAborted(_) => "aborted",
        }
    }
}

/// Publishes a single notification event. Must tolerate concurrent calls from
/// many tasks on the same instance.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Delivers one message to [`EventEmitter::topic`]. Success means the
    /// broker accepted it; the emitter never retries.
    async fn publish(&self, event: &NotificationEvent) -> Result<(), EmitError>;

    fn topic(&self) -> &str;

    async fn health(&self) -> ComponentHealth {
        ComponentHealth::new("broker", HealthStatus::Healthy)
    }
}
