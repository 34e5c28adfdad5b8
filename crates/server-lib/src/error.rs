//! Error taxonomy for the serving pipeline
//!
//! Validation errors are client-caused and surface as 4xx responses with a
//! human-readable detail message. Everything else is reclassified at the
//! service boundary into an internal error that surfaces as a generic 500.

use thiserror::Error;

/// Rejections of a prediction request, checked in order at the service
/// boundary.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("request body does not match the expected schema: {0}")]
    Malformed(String),

    #[error("features cannot be empty")]
    EmptyFeatures,

    #[error("feature '{name}' is not a finite number")]
    NonFiniteValue { name: String },

    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors surfaced by a model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("feature at index {index} is not a finite number")]
    NonFiniteValue { index: usize },

    #[error("inference failed")]
    Inference(#[source] anyhow::Error),
}

/// Outcome of a failed prediction, as classified by the service boundary.
///
/// The HTTP layer never sees a raw backend error; anything that is not a
/// recognized validation condition becomes `Internal`.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("prediction failed")]
    Internal(#[source] anyhow::Error),
}
