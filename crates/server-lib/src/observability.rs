//! Observability infrastructure for the model server
//!
//! Provides:
//! - Prometheus metrics (prediction counts, inference latency, model version)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{error, info};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ServiceMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    validation_rejections_total: IntCounter,
    model_version_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "model_server_inference_latency_seconds",
                "Time spent running model inference per prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_total: register_int_counter!(
                "model_server_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "model_server_prediction_errors_total",
                "Total number of internal prediction failures"
            )
            .expect("Failed to register prediction_errors_total"),

            validation_rejections_total: register_int_counter!(
                "model_server_validation_rejections_total",
                "Total number of requests rejected by validation"
            )
            .expect("Failed to register validation_rejections_total"),

            model_version_info: register_gauge_vec!(
                "model_server_model_version_info",
                "Information about the currently loaded model",
                &["version", "model_type"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    // This is just a marker - we use the global instance
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record an inference latency observation
    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    /// Increment predictions served counter
    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    /// Increment internal prediction failure counter
    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    /// Increment validation rejection counter
    pub fn inc_validation_rejections(&self) {
        self.inner().validation_rejections_total.inc();
    }

    /// Update model version info
    pub fn set_model_version(&self, version: &str, model_type: &str) {
        // Reset previous version
        self.inner().model_version_info.reset();
        // Set new version with value 1
        self.inner()
            .model_version_info
            .with_label_values(&[version, model_type])
            .set(1.0);
    }

    /// Total predictions served since startup
    pub fn total_predictions(&self) -> u64 {
        self.inner().predictions_total.get()
    }

    /// Mean inference latency in milliseconds, 0 when nothing was served yet
    pub fn avg_inference_time_ms(&self) -> f64 {
        let histogram = &self.inner().inference_latency_seconds;
        let count = histogram.get_sample_count();
        if count == 0 {
            return 0.0;
        }
        histogram.get_sample_sum() * 1000.0 / count as f64
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for predictions and
/// lifecycle events.
#[derive(Clone)]
pub struct ServiceLogger {
    environment: String,
}

impl ServiceLogger {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    /// Log a served prediction
    pub fn log_prediction(
        &self,
        prediction: i64,
        confidence: f64,
        inference_time_ms: f64,
        model_version: &str,
    ) {
        info!(
            event = "prediction_served",
            environment = %self.environment,
            prediction = prediction,
            confidence = confidence,
            inference_time_ms = inference_time_ms,
            model_version = %model_version,
            "Prediction served"
        );
    }

    /// Log a request rejected by validation (client-caused, informational)
    pub fn log_validation_rejection(&self, detail: &str) {
        info!(
            event = "validation_rejected",
            environment = %self.environment,
            detail = %detail,
            "Prediction request rejected"
        );
    }

    /// Log an internal prediction failure with full context
    pub fn log_prediction_error(&self, err: &anyhow::Error) {
        error!(
            event = "prediction_failed",
            environment = %self.environment,
            error = %err,
            error_chain = ?err,
            "Prediction failed"
        );
    }

    /// Log server startup
    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "server_started",
            environment = %self.environment,
            server_version = %version,
            model_version = %model_version,
            "Model server started"
        );
    }

    /// Log server shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            environment = %self.environment,
            reason = %reason,
            "Model server shutting down"
        );
    }
}
