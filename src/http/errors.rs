use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::IngestError;
use crate::store::StoreError;

/// Error surfaced to HTTP clients. The message is a short diagnostic; the
/// underlying cause is logged, not returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    /// `NotFound` becomes 404 with `not_found`; anything else is logged and
    /// becomes 500 with `internal`.
    pub fn from_store(err: StoreError, not_found: &str, internal: &str) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(not_found.to_string()),
            other => {
                tracing::error!(error = %other, "{internal}");
                ApiError::Internal(internal.to_string())
            }
        }
    }

    pub fn from_ingest(err: IngestError, not_found: &str, internal: &str) -> Self {
        match err {
            IngestError::Validation(e) => ApiError::BadRequest(format!("request body invalid ({e})")),
            IngestError::Store(e) => Self::from_store(e, not_found, internal),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(format!("{self}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderId, ValidationError};
    use std::time::Duration;

    #[test]
    fn test_store_errors_map_to_status() {
        let not_found = ApiError::from_store(StoreError::NotFound(OrderId::generate()), "nf", "boom");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let timeout = ApiError::from_store(
            StoreError::Timeout { operation: "get", after: Duration::from_secs(10) },
            "nf",
            "error finding order",
        );
        assert_eq!(timeout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.to_string(), "error finding order");
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = ApiError::from_ingest(ValidationError::EmptyCustomer.into(), "nf", "boom");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("request body invalid"));
    }
}
