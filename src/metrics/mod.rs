use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics - Prometheus instrumentation for the ingestion pipeline
// ============================================================================
//
// Covers:
// - accepted and rejected orders
// - per-line-item notification outcomes
// - order store latency and failures
// - broker circuit breaker state
//
// Exposed in text format on GET /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_ingested: IntCounterVec,
    pub orders_rejected: IntCounterVec,

    pub notifications_published: IntCounterVec,
    pub notifications_failed: IntCounterVec,

    pub store_duration: HistogramVec,
    pub store_failures: IntCounterVec,

    pub circuit_breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_ingested = IntCounterVec::new(
            Opts::new("orders_ingested_total", "Orders persisted through ingestion"),
            &["mode"],
        )?;
        registry.register(Box::new(orders_ingested.clone()))?;

        let orders_rejected = IntCounterVec::new(
            Opts::new("orders_rejected_total", "Orders rejected by validation"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_rejected.clone()))?;

        let notifications_published = IntCounterVec::new(
            Opts::new("notifications_published_total", "Notification events accepted by the broker"),
            &["topic"],
        )?;
        registry.register(Box::new(notifications_published.clone()))?;

        let notifications_failed = IntCounterVec::new(
            Opts::new("notifications_failed_total", "Notification events that failed to publish"),
            &["reason"],
        )?;
        registry.register(Box::new(notifications_failed.clone()))?;

        let store_duration = HistogramVec::new(
            HistogramOpts::new("store_operation_duration_seconds", "Order store call latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
            &["operation"],
        )?;
        registry.register(Box::new(store_duration.clone()))?;

        let store_failures = IntCounterVec::new(
            Opts::new("store_operation_failures_total", "Order store calls that returned an error"),
            &["operation"],
        )?;
        registry.register(Box::new(store_failures.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Broker circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            orders_ingested,
            orders_rejected,
            notifications_published,
            notifications_failed,
            store_duration,
            store_failures,
            circuit_breaker_state,
        })
    }

    pub fn record_ingested(&self, mode: &str) {
        self.orders_ingested.with_label_values(&[mode]).inc();
    }

    pub fn record_rejected(&self, reason: &str) {
        self.orders_rejected.with_label_values(&[reason]).inc();
    }

    pub fn record_notification(&self, topic: &str) {
        self.notifications_published.with_label_values(&[topic]).inc();
    }

    pub fn record_notification_failure(&self, reason: &str) {
        self.notifications_failed.with_label_values(&[reason]).inc();
    }

    pub fn record_store_operation(&self, operation: &str, duration_secs: f64, success: bool) {
        self.store_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
        if !success {
            self.store_failures.with_label_values(&[operation]).inc();
        }
    }

    pub fn store_failures(&self, operation: &str) -> u64 {
        self.store_failures.with_label_values(&[operation]).get()
    }

    pub fn update_circuit_breaker_state(&self, state: i64) {
        self.circuit_breaker_state.set(state);
    }

    /// Text exposition of everything registered.
    pub fn render(&self) -> anyhow::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_ingested("bulk");
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_ingested_by_mode() {
        let metrics = Metrics::new().unwrap();
        metrics.record_ingested("bulk");
        metrics.record_ingested("bulk");
        metrics.record_ingested("single");

        assert_eq!(metrics.orders_ingested.with_label_values(&["bulk"]).get(), 2);
        assert_eq!(metrics.orders_ingested.with_label_values(&["single"]).get(), 1);
    }

    #[test]
    fn test_store_failures_only_count_errors() {
        let metrics = Metrics::new().unwrap();
        metrics.record_store_operation("create", 0.01, true);
        metrics.record_store_operation("create", 0.02, false);

        assert_eq!(metrics.store_failures("create"), 1);
        assert_eq!(
            metrics.store_duration.with_label_values(&["create"]).get_sample_count(),
            2
        );
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.record_notification("email_queue");
        metrics.record_notification_failure("broker");
        metrics.update_circuit_breaker_state(1);

        let text = String::from_utf8(metrics.render().unwrap()).unwrap();
        assert!(text.contains("notifications_published_total{topic=\"email_queue\"} 1"));
        assert!(text.contains("notifications_failed_total{reason=\"broker\"} 1"));
        assert!(text.contains("circuit_breaker_state 1"));
    }
}
