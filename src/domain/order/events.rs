use serde::{Deserialize, Serialize};

use super::value_objects::{LineItem, Order};

// ============================================================================
// Notification Events - one per line item, never persisted
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "productID")]
    pub product_id: String,
    pub quantity: i64,
    #[serde(rename = "userID")]
    pub customer_id: String,
}

impl NotificationEvent {
    pub fn new(item: &LineItem, customer_id: &str) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            customer_id: customer_id.to_string(),
        }
    }

    /// One event per line item, in line-item order.
    pub fn for_order(order: &Order) -> Vec<Self> {
        order
            .line_items
            .iter()
            .map(|item| Self::new(item, &order.customer_id))
            .collect()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
