//! Serving library for the model server
//!
//! This crate provides the core functionality for:
//! - Model loading with a deterministic fallback classifier
//! - Request validation and prediction response shaping
//! - HTTP API surface
//! - Health reporting and observability

pub mod api;
pub mod error;
pub mod health;
pub mod model;
pub mod models;
pub mod observability;
pub mod service;

pub use error::{ModelError, PredictError, ValidationError};
pub use health::{HealthResponse, HealthStatus};
pub use model::{FallbackClassifier, ModelAdapter};
pub use models::*;
pub use observability::{ServiceLogger, ServiceMetrics};
pub use service::PredictionService;
