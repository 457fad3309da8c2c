use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{EmitError, EventEmitter};
use crate::domain::order::NotificationEvent;

/// Logs every published event and, unless built with [`RecordingEmitter::log_only`],
/// keeps it in memory. Backs `BROKER_BACKEND=log`; the tests use it to
/// observe dispatch.
pub struct RecordingEmitter {
    topic: String,
    retain: bool,
    published: Mutex<Vec<NotificationEvent>>,
    attempts: AtomicUsize,
    failing_products: HashSet<String>,
    delay: Option<Duration>,
}

impl RecordingEmitter {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            retain: true,
            published: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            failing_products: HashSet::new(),
            delay: None,
        }
    }

    /// Log events without keeping them.
    pub fn log_only(topic: impl Into<String>) -> Self {
        Self {
            retain: false,
            ..Self::new(topic)
        }
    }

    /// Reject every event for `product_id` with a broker error.
    pub fn failing_on(mut self, product_id: impl Into<String>) -> Self {
        self.failing_products.insert(product_id.into());
        self
    }

    /// Sleep this long inside every publish.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn published(&self) -> Vec<NotificationEvent> {
        self.published.lock().await.clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventEmitter for RecordingEmitter {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), EmitError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_products.contains(&event.product_id) {
            return Err(EmitError::Broker(format!(
                "{} rejected by recording emitter",
                event.product_id
            )));
        }

        let payload = event
            .to_json()
            .map_err(|e| EmitError::Serialization(e.to_string()))?;

        tracing::info!(
            topic = %self.topic,
            payload = %String::from_utf8_lossy(&payload),
            "Recorded notification"
        );

        if self.retain {
            self.published.lock().await.push(event.clone());
        }
        Ok(())
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
