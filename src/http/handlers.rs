use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::errors::ApiError;
use super::AppState;
use crate::domain::order::{IngestError, IngestMode, IngestReport, OrderId, OrderPayload};
use crate::health::{ComponentHealth, HealthStatus, SystemHealth};
use crate::messaging::DispatchOutcome;

#[derive(Serialize)]
struct FailedNotification {
    index: usize,
    error: String,
}

#[derive(Serialize)]
struct NotificationSummary {
    succeeded: usize,
    failed: Vec<FailedNotification>,
}

impl From<&DispatchOutcome> for NotificationSummary {
    fn from(outcome: &DispatchOutcome) -> Self {
        Self {
            succeeded: outcome.succeeded,
            failed: outcome
                .failed
                .iter()
                .map(|f| FailedNotification {
                    index: f.index,
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Create response: the order plus how its notifications fared.
#[derive(Serialize)]
struct CreatedOrder {
    #[serde(flatten)]
    order: OrderPayload,
    notifications: NotificationSummary,
}

impl From<&IngestReport> for CreatedOrder {
    fn from(report: &IngestReport) -> Self {
        Self {
            order: OrderPayload::from(&report.order),
            notifications: NotificationSummary::from(&report.dispatch),
        }
    }
}

fn parse_id(raw: &str, msg: &str) -> Result<OrderId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request(msg))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<HttpResponse, ApiError> {
    let bytes = serde_json::to_vec(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode response");
        ApiError::Internal("error encoding response".into())
    })?;

    Ok(HttpResponse::build(status)
        .insert_header(ContentType::json())
        .body(bytes))
}

fn text_response(message: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(ContentType::plaintext())
        .body(message)
}

async fn create(state: &AppState, payload: OrderPayload, mode: IngestMode) -> Result<HttpResponse, ApiError> {
    let report = state
        .orders
        .ingest(payload, mode)
        .await
        .map_err(|e| match e {
            IngestError::Store(err) => {
                tracing::error!(error = %err, "Error inserting order");
                ApiError::bad_request("error inserting order")
            }
            other => ApiError::from_ingest(other, "order not found", "error inserting order"),
        })?;

    json_response(StatusCode::CREATED, &CreatedOrder::from(&report))
}

pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<OrderPayload>,
) -> Result<HttpResponse, ApiError> {
    create(&state, body.into_inner(), IngestMode::Single).await
}

pub async fn create_bulk_order(
    state: web::Data<AppState>,
    body: web::Json<OrderPayload>,
) -> Result<HttpResponse, ApiError> {
    create(&state, body.into_inner(), IngestMode::Bulk).await
}

pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "invalid order id")?;
    let order = state
        .orders
        .get(id)
        .await
        .map_err(|e| ApiError::from_store(e, "order not found", "error finding order"))?;

    json_response(StatusCode::OK, &OrderPayload::from(&order))
}

pub async fn list_orders(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let orders = state
        .orders
        .list()
        .await
        .map_err(|e| ApiError::from_store(e, "no orders", "error finding orders"))?;

    let body: Vec<OrderPayload> = orders.iter().map(OrderPayload::from).collect();
    json_response(StatusCode::OK, &body)
}

pub async fn update_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<OrderPayload>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "invalid order id for update")?;
    state
        .orders
        .update(id, body.into_inner())
        .await
        .map_err(|e| ApiError::from_ingest(e, "no order with this ID", "error updating order"))?;

    Ok(text_response(format!("Updated order with ID: {id}\n")))
}

pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "invalid order id")?;
    state
        .orders
        .delete(id)
        .await
        .map_err(|e| ApiError::from_store(e, "no order with this ID", "error deleting order"))?;

    Ok(text_response(format!("Deleted order with ID: {id}\n")))
}

pub async fn metrics(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let buffer = state.metrics.render().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode metrics");
        ApiError::Internal("error encoding metrics".into())
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}

pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let broker = state.orders.dispatcher().emitter().health().await;
    let store = state.orders.store_health().await;
    let api = ComponentHealth::new("api", HealthStatus::Healthy);
    let report = SystemHealth::from_components(vec![api, store, broker]);

    let status = if report.overall.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    json_response(status, &report)
}
