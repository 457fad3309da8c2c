use std::sync::Arc;

use super::commands::{IngestMode, OrderPayload};
use super::errors::IngestError;
use super::value_objects::{Order, OrderId};
use crate::health::ComponentHealth;
use crate::messaging::{BulkDispatcher, DispatchOutcome};
use crate::metrics::Metrics;
use crate::store::{OrderStore, StoreError};

// ============================================================================
// Order Command Handler - the ingestion pipeline
// ============================================================================
//
// validate → dispatch (joined fan-out) → persist → respond
//
// Notification and persistence are not transactional. Dispatch failures are
// reported next to the persisted order, never abort it. If persistence fails
// after events went out, those events stay sent: consumers may see
// notifications for an order that was never stored.
//
// ============================================================================

/// Result of a successful ingestion: the stored order and, separately, how
/// its notifications fared.
#[derive(Debug)]
pub struct IngestReport {
    pub order: Order,
    pub dispatch: DispatchOutcome,
}

pub struct OrderCommandHandler {
    store: Arc<dyn OrderStore>,
    dispatcher: BulkDispatcher,
    metrics: Arc<Metrics>,
}

impl OrderCommandHandler {
    pub fn new(store: Arc<dyn OrderStore>, dispatcher: BulkDispatcher, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            dispatcher,
            metrics,
        }
    }

    pub async fn store_health(&self) -> ComponentHealth {
        self.store.health().await
    }

    pub fn dispatcher(&self) -> &BulkDispatcher {
        &self.dispatcher
    }

    pub async fn ingest(&self, payload: OrderPayload, mode: IngestMode) -> Result<IngestReport, IngestError> {
        let order = payload.into_order(mode).map_err(|e| {
            tracing::warn!(mode = mode.as_str(), error = %e, "Rejected order request");
            self.metrics.record_rejected(e.reason());
            e
        })?;

        tracing::info!(
            customer_id = %order.customer_id,
            item_count = order.item_count(),
            mode = mode.as_str(),
            "Ingesting order"
        );

        let dispatch = self.dispatcher.dispatch_all(&order).await;

        let order = self.store.create(order).await.map_err(|e| {
            tracing::error!(
                error = %e,
                notified = dispatch.succeeded,
                "Failed to persist order after dispatching notifications"
            );
            e
        })?;

        self.metrics.record_ingested(mode.as_str());

        tracing::info!(
            order_id = ?order.id,
            notified = dispatch.succeeded,
            failed = dispatch.failed.len(),
            "✅ Order persisted"
        );

        Ok(IngestReport { order, dispatch })
    }

    pub async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        self.store.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<Order>, StoreError> {
        self.store.list().await
    }

    /// Replace the whole order. The body must be a valid order; any id it
    /// carries is ignored in favour of `id`.
    pub async fn update(&self, id: OrderId, payload: OrderPayload) -> Result<(), IngestError> {
        let order = payload.into_order(IngestMode::Bulk)?;
        self.store.update(id, order).await?;

        tracing::info!(order_id = %id, "Order updated");
        Ok(())
    }

    /// Get-then-delete, so a missing order surfaces as `NotFound`.
    pub async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        self.store.get(id).await?;
        self.store.delete(id).await?;

        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{LineItem, NotificationEvent, ValidationError};
    use crate::messaging::{EmitError, RecordingEmitter};
    use crate::store::MemoryOrderStore;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Harness {
        handler: OrderCommandHandler,
        store: Arc<MemoryOrderStore>,
        emitter: Arc<RecordingEmitter>,
        metrics: Arc<Metrics>,
    }

    fn harness_with(emitter: RecordingEmitter) -> Harness {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = Arc::new(MemoryOrderStore::new());
        let emitter = Arc::new(emitter);
        let dispatcher = BulkDispatcher::new(emitter.clone(), Duration::from_secs(10), metrics.clone());
        Harness {
            handler: OrderCommandHandler::new(store.clone(), dispatcher, metrics.clone()),
            store,
            emitter,
            metrics,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingEmitter::new("email_queue"))
    }

    fn payload(customer: &str, pids: &[&str], qty: &[i64]) -> OrderPayload {
        OrderPayload {
            id: None,
            customer_id: customer.into(),
            product_ids: Some(pids.iter().map(|s| s.to_string()).collect()),
            quantities: Some(qty.to_vec()),
        }
    }

    #[tokio::test]
    async fn test_single_order_persists_one_record_and_one_event() {
        let h = harness();

        let report = h
            .handler
            .ingest(payload("c1", &["p1"], &[4]), IngestMode::Single)
            .await
            .unwrap();

        assert!(report.order.id.is_some());
        assert_eq!(report.order.line_items, vec![LineItem { product_id: "p1".into(), quantity: 4 }]);
        assert_eq!(h.store.len().await, 1);
        assert_eq!(
            h.emitter.published().await,
            vec![NotificationEvent { product_id: "p1".into(), quantity: 4, customer_id: "c1".into() }]
        );
        assert_eq!(h.metrics.orders_ingested.with_label_values(&["single"]).get(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bulk_order_dispatches_every_line_item() {
        let h = harness();

        let report = h
            .handler
            .ingest(payload("c1", &["p1", "p2", "p3"], &[2, 3, 5]), IngestMode::Bulk)
            .await
            .unwrap();

        assert_eq!(report.dispatch.succeeded, 3);
        assert_eq!(h.emitter.attempts(), 3);

        let stored = h.store.get(report.order.id.unwrap()).await.unwrap();
        assert_eq!(stored, report.order);

        let mut events = h.emitter.published().await;
        events.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        let expected: Vec<_> = [("p1", 2), ("p2", 3), ("p3", 5)]
            .iter()
            .map(|(p, q)| NotificationEvent { product_id: p.to_string(), quantity: *q, customer_id: "c1".into() })
            .collect();
        assert_eq!(events, expected);
    }

    #[tokio::test]
    async fn test_validation_failure_has_no_side_effects() {
        let h = harness();
        let cases = [
            (payload("", &["p1"], &[1]), IngestMode::Bulk),
            (payload("c1", &[], &[]), IngestMode::Bulk),
            (payload("c1", &["p1", "p2"], &[1, 1]), IngestMode::Single),
            (payload("c1", &["p1", "p2"], &[1]), IngestMode::Bulk),
        ];

        for (p, mode) in cases {
            let err = h.handler.ingest(p, mode).await.unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)));
        }

        assert_eq!(h.store.len().await, 0);
        assert_eq!(h.emitter.attempts(), 0);
        assert_eq!(
            h.metrics.orders_rejected.with_label_values(&["length_mismatch"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_does_not_block_persistence() {
        let h = harness_with(RecordingEmitter::new("email_queue").failing_on("p2"));

        let report = h
            .handler
            .ingest(payload("c1", &["p1", "p2"], &[1, 1]), IngestMode::Bulk)
            .await
            .unwrap();

        assert_eq!(report.dispatch.succeeded, 1);
        assert_eq!(report.dispatch.failed.len(), 1);
        assert_eq!(report.dispatch.failed[0].index, 1);
        assert!(matches!(report.dispatch.failed[0].error, EmitError::Broker(_)));
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal_after_dispatch() {
        struct BrokenStore;

        #[async_trait]
        impl OrderStore for BrokenStore {
            async fn create(&self, _order: Order) -> Result<Order, StoreError> {
                Err(StoreError::Backend("node down".into()))
            }
            async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
                Err(StoreError::NotFound(id))
            }
            async fn list(&self) -> Result<Vec<Order>, StoreError> {
                Ok(vec![])
            }
            async fn update(&self, id: OrderId, _order: Order) -> Result<(), StoreError> {
                Err(StoreError::NotFound(id))
            }
            async fn delete(&self, _id: OrderId) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let metrics = Arc::new(Metrics::new().unwrap());
        let emitter = Arc::new(RecordingEmitter::new("email_queue"));
        let dispatcher = BulkDispatcher::new(emitter.clone(), Duration::from_secs(10), metrics.clone());
        let handler = OrderCommandHandler::new(Arc::new(BrokenStore), dispatcher, metrics);

        let err = handler
            .ingest(payload("c1", &["p1"], &[1]), IngestMode::Single)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Store(StoreError::Backend(_))));
        // already-sent notifications are not retracted
        assert_eq!(emitter.published().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_forces_path_id_and_validates_body() {
        let h = harness();
        let id = h
            .handler
            .ingest(payload("c1", &["p1"], &[1]), IngestMode::Single)
            .await
            .unwrap()
            .order
            .id
            .unwrap();

        let mut body = payload("c2", &["p9", "p8"], &[3, 4]);
        body.id = Some(OrderId::generate());
        h.handler.update(id, body).await.unwrap();

        let fetched = h.handler.get(id).await.unwrap();
        assert_eq!(fetched.id, Some(id));
        assert_eq!(fetched.customer_id, "c2");
        assert_eq!(fetched.item_count(), 2);

        let err = h.handler.update(id, payload("c2", &["p9"], &[])).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Validation(ValidationError::LengthMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let h = harness();
        let id = h
            .handler
            .ingest(payload("c1", &["p1"], &[1]), IngestMode::Single)
            .await
            .unwrap()
            .order
            .id
            .unwrap();

        h.handler.delete(id).await.unwrap();
        assert!(matches!(h.handler.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(h.handler.delete(id).await, Err(StoreError::NotFound(_))));
    }
}
