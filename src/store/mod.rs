// ============================================================================
// Order Store
// ============================================================================
//
// Canonical owner of order records. One document per order, written whole.
//
// Backends:
// - scylla  - ScyllaDB, JSON document per row
// - memory  - in-process map, for local runs and tests
//
// TimedStore wraps either backend with the per-operation deadline and
// latency metrics.
//
// ============================================================================

mod document;
mod memory;
mod scylladb;
mod timed;

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::order::{Order, OrderId};
use crate::health::{ComponentHealth, HealthStatus};

pub use document::OrderDocument;
pub use memory::MemoryOrderStore;
pub use scylladb::ScyllaOrderStore;
pub use timed::TimedStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order already exists: {0}")]
    AlreadyExists(OrderId),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("order document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the full record, assigning a fresh id when the order has none.
    /// Never replaces an existing record: a taken id is `AlreadyExists`.
    /// Returns the order as stored.
    async fn create(&self, order: Order) -> Result<Order, StoreError>;

    async fn get(&self, id: OrderId) -> Result<Order, StoreError>;

    async fn list(&self) -> Result<Vec<Order>, StoreError>;

    /// Full-document replace. `id` overrides whatever id `order` carries.
    async fn update(&self, id: OrderId, order: Order) -> Result<(), StoreError>;

    /// Removes the record if present. Absence is not an error here.
    async fn delete(&self, id: OrderId) -> Result<(), StoreError>;

    async fn health(&self) -> ComponentHealth {
        ComponentHealth::new("store", HealthStatus::Healthy)
    }
}
