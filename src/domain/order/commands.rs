use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::value_objects::{LineItem, Order, OrderId};

// ============================================================================
// Order Commands - inbound request shape and its validation
// ============================================================================

/// Which create endpoint the request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Exactly one line item.
    Single,
    /// Any number of line items, product and quantity arrays of equal length.
    Bulk,
}

impl IngestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestMode::Single => "single",
            IngestMode::Bulk => "bulk",
        }
    }
}

/// Order as it travels over HTTP: parallel product / quantity arrays.
///
/// The same shape is used for responses, where every field is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,

    #[serde(rename = "cId", default)]
    pub customer_id: String,

    #[serde(rename = "pid", default)]
    pub product_ids: Option<Vec<String>>,

    #[serde(rename = "product_quantity", default)]
    pub quantities: Option<Vec<i64>>,
}

impl OrderPayload {
    /// Check the payload against `mode` and zip it into an [`Order`].
    pub fn into_order(self, mode: IngestMode) -> Result<Order, ValidationError> {
        let (product_ids, quantities) = match (self.product_ids, self.quantities) {
            (Some(p), Some(q)) => (p, q),
            _ => return Err(ValidationError::MissingFields),
        };

        if self.customer_id.is_empty() {
            return Err(ValidationError::EmptyCustomer);
        }

        match mode {
            IngestMode::Single if product_ids.len() != 1 || quantities.len() != 1 => {
                return Err(ValidationError::SingleItemRequired {
                    products: product_ids.len(),
                    quantities: quantities.len(),
                });
            }
            IngestMode::Bulk if product_ids.len() != quantities.len() => {
                return Err(ValidationError::LengthMismatch {
                    products: product_ids.len(),
                    quantities: quantities.len(),
                });
            }
            _ => {}
        }

        if product_ids.is_empty() {
            return Err(ValidationError::NoLineItems);
        }

        if let Some(index) = product_ids.iter().position(|p| p.is_empty()) {
            return Err(ValidationError::EmptyProductId(index));
        }

        let line_items = product_ids
            .into_iter()
            .zip(quantities)
            .map(|(product_id, quantity)| LineItem { product_id, quantity })
            .collect();

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            line_items,
        })
    }
}

impl From<&Order> for OrderPayload {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id.clone(),
            product_ids: Some(order.line_items.iter().map(|i| i.product_id.clone()).collect()),
            quantities: Some(order.line_items.iter().map(|i| i.quantity).collect()),
        }
    }
}
