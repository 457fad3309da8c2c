use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;
use uuid::Uuid;

use super::{OrderDocument, OrderStore, StoreError};
use crate::domain::order::{Order, OrderId};
use crate::health::{ComponentHealth, HealthStatus};
use crate::utils::{retry_with_backoff, RetryConfig};

// ============================================================================
// ScyllaDB Order Store
// ============================================================================
//
// One row per order: the uuid key plus the JSON record layout in `document`.
// Writing the whole document in a single INSERT keeps every write
// all-or-nothing per order.
//
// ============================================================================

const TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS orders (id uuid PRIMARY KEY, document text)";

pub struct ScyllaOrderStore {
    session: Arc<Session>,
}

impl ScyllaOrderStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Connect (with backoff), make sure keyspace and table exist, and switch
    /// the session to the keyspace.
    pub async fn connect(node: &str, keyspace: &str, retry: RetryConfig) -> anyhow::Result<Self> {
        let session = retry_with_backoff(retry, |attempt| async move {
            tracing::info!(node = %node, attempt, "Connecting to ScyllaDB");
            SessionBuilder::new().known_node(node).build().await
        })
        .await?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
                ),
                &[],
            )
            .await?;
        session.use_keyspace(keyspace, false).await?;
        session.query_unpaged(TABLE_DDL, &[]).await?;

        tracing::info!(keyspace = %keyspace, "ScyllaDB order store ready");
        Ok(Self::new(Arc::new(session)))
    }

    async fn insert(&self, id: OrderId, order: &Order) -> Result<(), StoreError> {
        let document = serde_json::to_string(&OrderDocument::from_order(id, order))?;
        self.session
            .query_unpaged(
                "INSERT INTO orders (id, document) VALUES (?, ?)",
                (id.as_uuid(), document),
            )
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    /// Lightweight-transaction insert. Returns whether the row was written;
    /// `false` means the id was already taken.
    async fn insert_new(&self, id: OrderId, order: &Order) -> Result<bool, StoreError> {
        let document = serde_json::to_string(&OrderDocument::from_order(id, order))?;
        let result = self
            .session
            .query_unpaged(
                "INSERT INTO orders (id, document) VALUES (?, ?) IF NOT EXISTS",
                (id.as_uuid(), document),
            )
            .await
            .map_err(StoreError::backend)?;

        // first column is [applied]; the existing row follows when it is false
        let row = result
            .into_rows_result()
            .map_err(StoreError::backend)?
            .first_row::<Row>()
            .map_err(StoreError::backend)?;
        applied(&row)
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let result = self
            .session
            .query_unpaged("SELECT document FROM orders WHERE id = ?", (id.as_uuid(),))
            .await
            .map_err(StoreError::backend)?;

        let row = result
            .into_rows_result()
            .map_err(StoreError::backend)?
            .maybe_first_row::<(String,)>()
            .map_err(StoreError::backend)?;

        match row {
            Some((document,)) => Ok(Some(decode(&document)?)),
            None => Ok(None),
        }
    }
}

fn applied(row: &Row) -> Result<bool, StoreError> {
    match row.columns.first() {
        Some(Some(CqlValue::Boolean(applied))) => Ok(*applied),
        other => Err(StoreError::Backend(format!(
            "unexpected conditional insert result: {other:?}"
        ))),
    }
}

fn decode(document: &str) -> Result<Order, StoreError> {
    let doc: OrderDocument = serde_json::from_str(document)?;
    Ok(doc.into_order())
}

#[async_trait]
impl OrderStore for ScyllaOrderStore {
    async fn create(&self, mut order: Order) -> Result<Order, StoreError> {
        let id = *order.id.get_or_insert_with(OrderId::generate);
        if !self.insert_new(id, &order).await? {
            return Err(StoreError::AlreadyExists(id));
        }

        tracing::debug!(order_id = %id, item_count = order.item_count(), "Inserted order document");
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        self.find(id).await?.ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let result = self
            .session
            .query_unpaged("SELECT id, document FROM orders", &[])
            .await
            .map_err(StoreError::backend)?;

        let rows_result = result.into_rows_result().map_err(StoreError::backend)?;

        let mut orders = Vec::new();
        for row in rows_result
            .rows::<(Uuid, String)>()
            .map_err(StoreError::backend)?
        {
            let (_, document) = row.map_err(StoreError::backend)?;
            orders.push(decode(&document)?);
        }

        tracing::debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    async fn update(&self, id: OrderId, mut order: Order) -> Result<(), StoreError> {
        // INSERT is an upsert in CQL, so check first to keep update from
        // creating records.
        if self.find(id).await?.is_none() {
            return Err(StoreError::NotFound(id));
        }

        order.id = Some(id);
        self.insert(id, &order).await
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        self.session
            .query_unpaged("DELETE FROM orders WHERE id = ?", (id.as_uuid(),))
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn health(&self) -> ComponentHealth {
        let status = match self
            .session
            .query_unpaged("SELECT now() FROM system.local", &[])
            .await
        {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                tracing::warn!(error = %e, "ScyllaDB health check failed");
                HealthStatus::Unhealthy(format!("scylla unreachable: {e}"))
            }
        };
        ComponentHealth::new("store", status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::LineItem;

    // Database round-trips need a running ScyllaDB; these cover the row codec.

    #[test]
    fn test_decode_row_document() {
        let id = OrderId::generate();
        let order = Order {
            id: Some(id),
            customer_id: "c1".into(),
            line_items: vec![LineItem { product_id: "p1".into(), quantity: 5 }],
        };
        let stored = serde_json::to_string(&OrderDocument::from_order(id, &order)).unwrap();

        assert_eq!(decode(&stored).unwrap(), order);
    }

    #[test]
    fn test_applied_column_reports_conflict() {
        let written = Row { columns: vec![Some(CqlValue::Boolean(true))] };
        assert!(applied(&written).unwrap());

        let existing = Row {
            columns: vec![
                Some(CqlValue::Boolean(false)),
                Some(CqlValue::Uuid(OrderId::generate().as_uuid())),
                Some(CqlValue::Text("{}".into())),
            ],
        };
        assert!(!applied(&existing).unwrap());

        let empty = Row { columns: vec![] };
        assert!(matches!(applied(&empty), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_decode_rejects_corrupt_document() {
        assert!(matches!(decode("{\"cId\":1}"), Err(StoreError::Encoding(_))));
    }
}
