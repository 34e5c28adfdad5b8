//! Prediction service: validation, inference, and response shaping
//!
//! Sits between the HTTP surface and the model adapter. Validation rules
//! run in order and short-circuit on the first failure; adapter errors
//! that are not a recognized validation condition are reclassified as
//! internal so the HTTP layer never sees a raw backend error.

use crate::error::{ModelError, PredictError, ValidationError};
use crate::model::ModelAdapter;
use crate::models::{FeatureInput, PredictionRequest, PredictionResult};
use crate::observability::{ServiceLogger, ServiceMetrics};
use std::sync::Arc;
use std::time::Instant;

/// Decimal places kept for predictions and probabilities
const VALUE_PRECISION: i32 = 4;

/// Decimal places kept for reported latency
const LATENCY_PRECISION: i32 = 2;

pub struct PredictionService {
    adapter: Arc<ModelAdapter>,
    metrics: ServiceMetrics,
    logger: ServiceLogger,
}

impl PredictionService {
    pub fn new(adapter: Arc<ModelAdapter>, metrics: ServiceMetrics, logger: ServiceLogger) -> Self {
        Self {
            adapter,
            metrics,
            logger,
        }
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }

    /// Validate a prediction request, run inference, and shape the result.
    pub fn handle_predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictError> {
        let features = match self.validate(&request.features) {
            Ok(features) => features,
            Err(err) => {
                self.metrics.inc_validation_rejections();
                self.logger.log_validation_rejection(&err.to_string());
                return Err(err.into());
            }
        };

        // Latency covers inference only, never validation.
        let start = Instant::now();
        let prediction = match self.adapter.predict(&features) {
            Ok(prediction) => prediction,
            Err(err) => return Err(self.classify(&request.features, err)),
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.metrics.inc_predictions();
        self.metrics.observe_inference_latency(elapsed_ms / 1000.0);

        let result = PredictionResult {
            prediction: prediction.label,
            probabilities: prediction
                .probabilities
                .iter()
                .map(|&p| round_to(p, VALUE_PRECISION))
                .collect(),
            confidence: round_to(prediction.confidence, VALUE_PRECISION),
            model_version: self.adapter.version().to_string(),
            inference_time_ms: round_to(elapsed_ms, LATENCY_PRECISION),
        };
        self.logger.log_prediction(
            result.prediction,
            result.confidence,
            result.inference_time_ms,
            &result.model_version,
        );
        Ok(result)
    }

    /// Validation rules in contract order, short-circuiting on the first
    /// failure.
    fn validate(&self, features: &FeatureInput) -> Result<Vec<f64>, ValidationError> {
        if features.is_empty() {
            return Err(ValidationError::EmptyFeatures);
        }

        let vector = features.to_vector();
        if let Some(index) = vector.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue {
                name: features.name_at(index),
            });
        }

        let expected = self.adapter.expected_features();
        if vector.len() != expected {
            return Err(ValidationError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }

    /// Adapter failures that restate a validation condition surface as
    /// such; anything else becomes an internal error.
    fn classify(&self, features: &FeatureInput, err: ModelError) -> PredictError {
        match err {
            ModelError::DimensionMismatch { expected, actual } => {
                ValidationError::DimensionMismatch { expected, actual }.into()
            }
            ModelError::NonFiniteValue { index } => ValidationError::NonFiniteValue {
                name: features.name_at(index),
            }
            .into(),
            ModelError::Inference(err) => {
                self.metrics.inc_prediction_errors();
                self.logger.log_prediction_error(&err);
                PredictError::Internal(err)
            }
        }
    }
}

/// Round to a fixed number of decimal places for stable client consumption.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn test_service() -> PredictionService {
        let adapter = Arc::new(ModelAdapter::load("/nonexistent/model.onnx", "v1.0.0", 4));
        PredictionService::new(adapter, ServiceMetrics::new(), ServiceLogger::new("test"))
    }

    fn named_request(pairs: &[(&str, f64)]) -> PredictionRequest {
        let map: BTreeMap<String, f64> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        PredictionRequest {
            features: FeatureInput::Named(map),
        }
    }

    #[test]
    fn valid_request_returns_shaped_result() {
        let service = test_service();
        let request = named_request(&[("f1", 1.0), ("f2", 2.0), ("f3", 3.0), ("f4", 4.0)]);

        let result = service.handle_predict(&request).unwrap();

        assert_eq!(result.model_version, "v1.0.0");
        assert!(result.inference_time_ms >= 0.0);
        let max = result
            .probabilities
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.confidence, max);
    }

    #[test]
    fn empty_features_rejected_first() {
        let service = test_service();
        let request = PredictionRequest {
            features: FeatureInput::Named(BTreeMap::new()),
        };

        let err = service.handle_predict(&request).unwrap_err();
        assert!(matches!(
            err,
            PredictError::Validation(ValidationError::EmptyFeatures)
        ));
    }

    #[test]
    fn non_finite_value_rejected_with_feature_name() {
        let service = test_service();
        let request = named_request(&[
            ("f1", 1.0),
            ("f2", f64::NAN),
            ("f3", 3.0),
            ("f4", 4.0),
        ]);

        match service.handle_predict(&request).unwrap_err() {
            PredictError::Validation(ValidationError::NonFiniteValue { name }) => {
                assert_eq!(name, "f2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_finite_checked_before_dimensions() {
        let service = test_service();
        let request = PredictionRequest {
            features: FeatureInput::Ordered(vec![f64::INFINITY]),
        };

        let err = service.handle_predict(&request).unwrap_err();
        assert!(matches!(
            err,
            PredictError::Validation(ValidationError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let service = test_service();
        let request = named_request(&[("f1", 1.0), ("f2", 2.0)]);

        match service.handle_predict(&request).unwrap_err() {
            PredictError::Validation(ValidationError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ordered_features_accepted() {
        let service = test_service();
        let request = PredictionRequest {
            features: FeatureInput::Ordered(vec![1.0, 2.0, 3.0, 4.0]),
        };

        assert!(service.handle_predict(&request).is_ok());
    }

    #[test]
    fn results_are_rounded_idempotently() {
        let service = test_service();
        let request = named_request(&[("f1", 0.1), ("f2", 0.2), ("f3", 0.3), ("f4", 0.4)]);

        let result = service.handle_predict(&request).unwrap();

        for p in &result.probabilities {
            assert_eq!(round_to(*p, 4), *p);
        }
        assert_eq!(round_to(result.confidence, 4), result.confidence);
        assert_eq!(
            round_to(result.inference_time_ms, 2),
            result.inference_time_ms
        );
    }

    #[test]
    fn round_to_truncates_at_requested_precision() {
        assert_eq!(round_to(1.234_567_89, 4), 1.2346);
        assert_eq!(round_to(1.234_567_89, 2), 1.23);
        assert_eq!(round_to(0.123_456, 3), 0.123);
        assert_eq!(round_to(-1.234_56, 2), -1.23);
    }
}
