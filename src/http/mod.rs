// ============================================================================
// HTTP API
// ============================================================================
//
//   GET    /order/{id}   fetch one order
//   GET    /order        list orders
//   POST   /order        create a single-item order
//   POST   /bulkorder    create a multi-item order
//   PUT    /order/{id}   replace an order
//   DELETE /order/{id}   delete an order
//   GET    /metrics      Prometheus exposition
//   GET    /health       component health
//
// ============================================================================

mod errors;
mod handlers;

use actix_web::web;
use std::sync::Arc;

use crate::domain::order::OrderCommandHandler;
use crate::metrics::Metrics;

pub use errors::ApiError;

pub struct AppState {
    pub orders: Arc<OrderCommandHandler>,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected undecodable request body");
            ApiError::bad_request("request body invalid").into()
        });

    cfg.app_data(json)
        .route("/order", web::get().to(handlers::list_orders))
        .route("/order", web::post().to(handlers::create_order))
        .route("/bulkorder", web::post().to(handlers::create_bulk_order))
        .route("/order/{id}", web::get().to(handlers::get_order))
        .route("/order/{id}", web::put().to(handlers::update_order))
        .route("/order/{id}", web::delete().to(handlers::delete_order))
        .route("/metrics", web::get().to(handlers::metrics))
        .route("/health", web::get().to(handlers::health));
}
