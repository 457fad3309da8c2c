use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::{EmitError, EventEmitter};
use crate::domain::order::{NotificationEvent, Order};
use crate::metrics::Metrics;

// ============================================================================
// Bulk Dispatcher
// ============================================================================
//
// Spawns one publish task per line item, then joins all of them before
// returning. Every task has its own deadline; a task that times out, fails or
// panics is recorded against its index and never affects its siblings.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub index: usize,
    pub error: EmitError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub succeeded: usize,
    pub failed: Vec<DispatchFailure>,
}

impl DispatchOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct BulkDispatcher {
    emitter: Arc<dyn EventEmitter>,
    publish_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl BulkDispatcher {
    pub fn new(emitter: Arc<dyn EventEmitter>, publish_timeout: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            emitter,
            publish_timeout,
            metrics,
        }
    }

    pub fn emitter(&self) -> &Arc<dyn EventEmitter> {
        &self.emitter
    }

    /// Publish one event per line item concurrently and wait for all of them.
    pub async fn dispatch_all(&self, order: &Order) -> DispatchOutcome {
        let deadline = self.publish_timeout;

        let handles: Vec<_> = NotificationEvent::for_order(order)
            .into_iter()
            .map(|event| {
                let emitter = Arc::clone(&self.emitter);
                tokio::spawn(async move {
                    match tokio::time::timeout(deadline, emitter.publish(&event)).await {
                        Ok(result) => result,
                        Err(_) => Err(EmitError::Timeout(deadline)),
                    }
                })
            })
            .collect();

        let results = join_all(handles).await;

        let mut outcome = DispatchOutcome::default();
        for (index, joined) in results.into_iter().enumerate() {
            let result = joined.unwrap_or_else(|e| Err(EmitError::TaskAborted(e.to_string())));
            match result {
                Ok(()) => {
                    outcome.succeeded += 1;
                    self.metrics.record_notification(self.emitter.topic());
                }
                Err(error) => {
                    tracing::warn!(
                        order_id = ?order.id,
                        index,
                        product_id = %order.line_items[index].product_id,
                        error = %error,
                        "Notification dispatch failed"
                    );
                    self.metrics.record_notification_failure(error.reason());
                    outcome.failed.push(DispatchFailure { index, error });
                }
            }
        }

        if outcome.is_complete() {
            tracing::debug!(dispatched = outcome.succeeded, "All notifications dispatched");
        } else {
            tracing::warn!(
                succeeded = outcome.succeeded,
                failed = outcome.failed.len(),
                "Partial notification dispatch"
            );
        }

        outcome
    }
}
