use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{OrderStore, StoreError};
use crate::domain::order::{Order, OrderId};
use crate::health::{ComponentHealth, HealthStatus};
use crate::metrics::Metrics;

/// Puts a deadline on every call to the inner store and records its latency.
/// Expiry cancels only the call that overran.
pub struct TimedStore<S> {
    inner: S,
    deadline: Duration,
    metrics: Arc<Metrics>,
}

impl<S: OrderStore> TimedStore<S> {
    pub fn new(inner: S, deadline: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            inner,
            deadline,
            metrics,
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Store operation exceeded deadline"
                );
                Err(StoreError::Timeout {
                    operation,
                    after: self.deadline,
                })
            }
        };

        self.metrics
            .record_store_operation(operation, started.elapsed().as_secs_f64(), result.is_ok());
        result
    }
}

#[async_trait]
impl<S: OrderStore> OrderStore for TimedStore<S> {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        self.bounded("create", self.inner.create(order)).await
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        self.bounded("get", self.inner.get(id)).await
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        self.bounded("list", self.inner.list()).await
    }

    async fn update(&self, id: OrderId, order: Order) -> Result<(), StoreError> {
        self.bounded("update", self.inner.update(id, order)).await
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        self.bounded("delete", self.inner.delete(id)).await
    }

    async fn health(&self) -> ComponentHealth {
        match tokio::time::timeout(self.deadline, self.inner.health()).await {
            Ok(report) => report,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Store health check exceeded deadline"
                );
                ComponentHealth::new(
                    "store",
                    HealthStatus::Unhealthy(format!("no answer within {:?}", self.deadline)),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::LineItem;
    use crate::store::MemoryOrderStore;

    /// Never answers `get` or `health`; everything else is delegated.
    struct StalledStore(MemoryOrderStore);

    #[async_trait]
    impl OrderStore for StalledStore {
        async fn create(&self, order: Order) -> Result<Order, StoreError> {
            self.0.create(order).await
        }
        async fn get(&self, _id: OrderId) -> Result<Order, StoreError> {
            std::future::pending().await
        }
        async fn list(&self) -> Result<Vec<Order>, StoreError> {
            self.0.list().await
        }
        async fn update(&self, id: OrderId, order: Order) -> Result<(), StoreError> {
            self.0.update(id, order).await
        }
        async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
            self.0.delete(id).await
        }
        async fn health(&self) -> ComponentHealth {
            std::future::pending().await
        }
    }

    fn sample() -> Order {
        Order {
            id: None,
            customer_id: "c1".into(),
            line_items: vec![LineItem { product_id: "p1".into(), quantity: 1 }],
        }
    }

    #[tokio::test]
    async fn test_overrunning_call_times_out() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = TimedStore::new(
            StalledStore(MemoryOrderStore::new()),
            Duration::from_millis(50),
            metrics.clone(),
        );

        let result = store.get(OrderId::generate()).await;
        assert!(matches!(
            result,
            Err(StoreError::Timeout { operation: "get", after }) if after == Duration::from_millis(50)
        ));
        assert_eq!(metrics.store_failures("get"), 1);
    }

    #[tokio::test]
    async fn test_timeout_does_not_affect_other_operations() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = TimedStore::new(
            StalledStore(MemoryOrderStore::new()),
            Duration::from_millis(50),
            metrics,
        );

        let created = store.create(sample()).await.unwrap();
        assert!(store.get(created.id.unwrap()).await.is_err());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_passes_through_results() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = TimedStore::new(MemoryOrderStore::new(), Duration::from_secs(10), metrics);

        let id = store.create(sample()).await.unwrap().id.unwrap();
        assert_eq!(store.get(id).await.unwrap().customer_id, "c1");
        store.delete(id).await.unwrap();
        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overrunning_health_check_is_unhealthy() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let stalled = TimedStore::new(
            StalledStore(MemoryOrderStore::new()),
            Duration::from_millis(50),
            metrics.clone(),
        );
        let report = stalled.health().await;
        assert_eq!(report.name, "store");
        assert!(report.status.is_unhealthy());

        let responsive = TimedStore::new(MemoryOrderStore::new(), Duration::from_millis(50), metrics);
        assert!(responsive.health().await.status.is_healthy());
    }
}
