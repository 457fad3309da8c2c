use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{OrderDocument, OrderStore, StoreError};
use crate::domain::order::{Order, OrderId};

/// In-process order store. Keeps the same document layout as the Scylla
/// backend so both behave identically at the trait boundary.
#[derive(Default)]
pub struct MemoryOrderStore {
    documents: RwLock<HashMap<OrderId, OrderDocument>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, mut order: Order) -> Result<Order, StoreError> {
        let id = *order.id.get_or_insert_with(OrderId::generate);
        match self.documents.write().await.entry(id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(OrderDocument::from_order(id, &order));
                Ok(order)
            }
        }
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        self.documents
            .read()
            .await
            .get(&id)
            .cloned()
            .map(OrderDocument::into_order)
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .cloned()
            .map(OrderDocument::into_order)
            .collect())
    }

    async fn update(&self, id: OrderId, order: Order) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&id) {
            Some(doc) => {
                *doc = OrderDocument::from_order(id, &order);
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        self.documents.write().await.remove(&id);
        Ok(())
    }
}
