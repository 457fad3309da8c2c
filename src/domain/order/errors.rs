use crate::store::StoreError;

// ============================================================================
// Order Errors
// ============================================================================

/// Request rejected before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("some of the fields of the body are not provided")]
    MissingFields,

    #[error("customer id must not be empty")]
    EmptyCustomer,

    #[error("order must contain at least one line item")]
    NoLineItems,

    #[error("only 1 pid and 1 product quantity needed, got {products} and {quantities}")]
    SingleItemRequired { products: usize, quantities: usize },

    #[error("length of order id and order quantity not the same ({products} != {quantities})")]
    LengthMismatch { products: usize, quantities: usize },

    #[error("product id at index {0} must not be empty")]
    EmptyProductId(usize),
}

impl ValidationError {
    /// Short label used for the rejection counter.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => "missing_fields",
            ValidationError::EmptyCustomer => "empty_customer",
            ValidationError::NoLineItems => "no_line_items",
            ValidationError::SingleItemRequired { .. } => "single_item_required",
            ValidationError::LengthMismatch { .. } => "length_mismatch",
            ValidationError::EmptyProductId(_) => "empty_product_id",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
