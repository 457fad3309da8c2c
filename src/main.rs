use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod health;
mod http;
mod messaging;
mod metrics;
mod store;
mod utils;

use config::{BrokerBackend, Config, StoreBackend};
use domain::order::OrderCommandHandler;
use messaging::{BulkDispatcher, EventEmitter, KafkaEmitter, RecordingEmitter};
use store::{MemoryOrderStore, OrderStore, ScyllaOrderStore, TimedStore};
use utils::RetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter, e.g. RUST_LOG=debug
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_ingest=debug")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "🚀 Starting order ingestion service");

    let metrics = Arc::new(metrics::Metrics::new()?);

    // === Order store ===
    let store: Arc<dyn OrderStore> = match config.store_backend {
        StoreBackend::Scylla => {
            let scylla = ScyllaOrderStore::connect(
                &config.scylla_node,
                &config.scylla_keyspace,
                RetryConfig::default(),
            )
            .await?;
            Arc::new(TimedStore::new(scylla, config.store_timeout, metrics.clone()))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store; orders are lost on restart");
            Arc::new(TimedStore::new(
                MemoryOrderStore::new(),
                config.store_timeout,
                metrics.clone(),
            ))
        }
    };

    // === Notification emitter (one producer for the whole process) ===
    let emitter: Arc<dyn EventEmitter> = match config.broker_backend {
        BrokerBackend::Kafka => Arc::new(KafkaEmitter::new(
            &config.kafka_brokers,
            &config.notify_topic,
            metrics.clone(),
        )?),
        BrokerBackend::Log => {
            tracing::warn!("Broker backend is 'log'; notifications are only logged");
            Arc::new(RecordingEmitter::log_only(config.notify_topic.clone()))
        }
    };

    let dispatcher = BulkDispatcher::new(emitter, config.publish_timeout, metrics.clone());
    let orders = Arc::new(OrderCommandHandler::new(store, dispatcher, metrics.clone()));
    let state = web::Data::new(http::AppState { orders, metrics });

    tracing::info!(addr = %config.http_addr, "Starting HTTP server");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(http::configure))
        .bind(config.http_addr)?
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
