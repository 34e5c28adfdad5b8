//! HTTP API: prediction, health, model info, and metrics endpoints

use crate::error::{PredictError, ValidationError};
use crate::health::HealthResponse;
use crate::models::{FeatureInput, PredictionRequest, PredictionResult};
use crate::observability::ServiceMetrics;
use crate::service::PredictionService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

const SERVICE_BANNER: &str = "Model Serving API";

/// Shared application state
pub struct AppState {
    pub service: PredictionService,
    pub version: String,
    pub metrics: ServiceMetrics,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        service: PredictionService,
        version: impl Into<String>,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            service,
            version: version.into(),
            metrics,
            started_at: Instant::now(),
        }
    }
}

/// Wire shape of a successful prediction.
///
/// Object-form requests get the full probability vector plus confidence;
/// array-form requests get a scalar probability for compatibility.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub probability: Probability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub model_version: String,
    pub inference_time_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Probability {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl PredictResponse {
    fn shape(result: PredictionResult, input: &FeatureInput) -> Self {
        if input.is_named() {
            Self {
                prediction: result.prediction,
                probability: Probability::Vector(result.probabilities),
                confidence: Some(result.confidence),
                model_version: result.model_version,
                inference_time_ms: result.inference_time_ms,
            }
        } else {
            Self {
                prediction: result.prediction,
                probability: Probability::Scalar(result.confidence),
                confidence: None,
                model_version: result.model_version,
                inference_time_ms: result.inference_time_ms,
            }
        }
    }
}

/// Error envelope: status code plus a `detail` message
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let status = match err {
            ValidationError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Validation(err) => err.into(),
            // Internal detail stays generic; the full chain was already
            // logged at error level by the service.
            PredictError::Internal(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: "Prediction failed".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Service banner
async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "message": SERVICE_BANNER,
        "version": state.version,
        "docs": "/docs",
    }))
}

/// Liveness probe: healthy whenever the process can respond
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_loaded = state.service.adapter().info().is_loaded;
    Json(HealthResponse::healthy(model_loaded, state.version.as_str()))
}

/// Metadata of the currently held model
async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.adapter().info())
}

/// Prediction endpoint
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ValidationError::Malformed(rejection.body_text()))?;
    let result = state.service.handle_predict(&request)?;
    Ok(Json(PredictResponse::shape(result, &request.features)))
}

/// Lightweight JSON counters for dashboards
async fn metrics_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "model_version": state.version,
        "uptime_seconds": state.started_at.elapsed().as_secs_f64(),
        "total_predictions": state.metrics.total_predictions(),
        "avg_inference_time_ms": state.metrics.avg_inference_time_ms(),
    }))
}

/// Prometheus metrics endpoint
async fn metrics_prometheus() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/model/info", get(model_info))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics_summary))
        .route("/metrics/prometheus", get(metrics_prometheus))
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn serve(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
