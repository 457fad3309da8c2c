use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    message::{Header, OwnedHeaders},
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use std::sync::Arc;
use std::time::Duration;

use super::{EmitError, EventEmitter};
use crate::domain::order::NotificationEvent;
use crate::health::{ComponentHealth, HealthStatus};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

/// How long `send` may wait for room in the local producer queue.
const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide Kafka producer. One instance is created at start-up and
/// shared by every publish task; `FutureProducer` is safe for concurrent use.
pub struct KafkaEmitter {
    producer: FutureProducer,
    topic: String,
    circuit_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
}

impl KafkaEmitter {
    pub fn new(brokers: &str, topic: &str, metrics: Arc<Metrics>) -> Result<Self, EmitError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            // wait for all in-sync replicas so accepted messages survive a broker restart
            .set("acks", "all")
            .create()
            .map_err(|e| EmitError::Broker(format!("failed to create producer: {e}")))?;

        tracing::info!(brokers = %brokers, topic = %topic, "Kafka producer created");

        Ok(Self {
            producer,
            topic: topic.to_string(),
            circuit_breaker: CircuitBreaker::new(CircuitBreakerConfig::default()),
            metrics,
        })
    }
}

fn json_headers() -> OwnedHeaders {
    OwnedHeaders::new().insert(Header {
        key: "content-type",
        value: Some("application/json"),
    })
}

#[async_trait]
impl EventEmitter for KafkaEmitter {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), EmitError> {
        let payload = event
            .to_json()
            .map_err(|e| EmitError::Serialization(e.to_string()))?;

        let result = self
            .circuit_breaker
            .call(async {
                let record = FutureRecord::to(&self.topic)
                    .key(event.customer_id.as_str())
                    .payload(&payload)
                    .headers(json_headers());

                self.producer
                    .send(record, Timeout::After(QUEUE_TIMEOUT))
                    .await
                    .map_err(|(e, _)| e)
            })
            .await;

        self.metrics
            .update_circuit_breaker_state(self.circuit_breaker.state().await.as_gauge());

        match result {
            Ok(_) => {
                tracing::info!(
                    topic = %self.topic,
                    product_id = %event.product_id,
                    customer_id = %event.customer_id,
                    "Published notification"
                );
                Ok(())
            }
            Err(CircuitBreakerError::Open) => {
                tracing::error!(topic = %self.topic, "Circuit breaker open - broker unavailable");
                Err(EmitError::CircuitOpen)
            }
            Err(CircuitBreakerError::Inner(e)) => {
                tracing::error!(
                    error = %e,
                    topic = %self.topic,
                    product_id = %event.product_id,
                    "Failed to publish notification"
                );
                Err(EmitError::Broker(e.to_string()))
            }
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    async fn health(&self) -> ComponentHealth {
        let status = match self.circuit_breaker.state().await {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded("circuit breaker half-open".into()),
            CircuitState::Open => HealthStatus::Degraded("circuit breaker open".into()),
        };
        ComponentHealth::new("broker", status)
    }
}
