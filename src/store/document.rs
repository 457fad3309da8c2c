use serde::{Deserialize, Serialize};

use crate::domain::order::{LineItem, Order, OrderId};

/// Persisted record layout, one per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
    #[serde(rename = "_id")]
    pub id: OrderId,

    #[serde(rename = "cId")]
    pub customer_id: String,

    #[serde(rename = "_pid")]
    pub product_ids: Vec<String>,

    pub product_quantity: Vec<i64>,
}

impl OrderDocument {
    pub fn from_order(id: OrderId, order: &Order) -> Self {
        Self {
            id,
            customer_id: order.customer_id.clone(),
            product_ids: order.line_items.iter().map(|i| i.product_id.clone()).collect(),
            product_quantity: order.line_items.iter().map(|i| i.quantity).collect(),
        }
    }

    pub fn into_order(self) -> Order {
        let line_items = self
            .product_ids
            .into_iter()
            .zip(self.product_quantity)
            .map(|(product_id, quantity)| LineItem { product_id, quantity })
            .collect();

        Order {
            id: Some(self.id),
            customer_id: self.customer_id,
            line_items,
        }
    }
}
