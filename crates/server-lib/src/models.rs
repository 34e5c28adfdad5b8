//! Core data models for the model server

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature payload accepted by the predict endpoint.
///
/// Clients may send either a name/value mapping or an ordered array.
/// Named features are coerced to ascending key order before inference, so
/// the position of each probability entry is stable regardless of the JSON
/// key order the client happened to use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureInput {
    Named(BTreeMap<String, f64>),
    Ordered(Vec<f64>),
}

impl FeatureInput {
    pub fn is_empty(&self) -> bool {
        match self {
            FeatureInput::Named(map) => map.is_empty(),
            FeatureInput::Ordered(values) => values.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeatureInput::Named(map) => map.len(),
            FeatureInput::Ordered(values) => values.len(),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, FeatureInput::Named(_))
    }

    /// Resolve to a single canonical ordered vector.
    pub fn to_vector(&self) -> Vec<f64> {
        match self {
            FeatureInput::Named(map) => map.values().copied().collect(),
            FeatureInput::Ordered(values) => values.clone(),
        }
    }

    /// Name used in error messages for the value at `index` of the
    /// canonical vector.
    pub fn name_at(&self, index: usize) -> String {
        match self {
            FeatureInput::Named(map) => map
                .keys()
                .nth(index)
                .cloned()
                .unwrap_or_else(|| index.to_string()),
            FeatureInput::Ordered(_) => index.to_string(),
        }
    }
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub features: FeatureInput,
}

/// Raw output of a model backend.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: i64,
    pub probabilities: Vec<f64>,
    pub confidence: f64,
}

/// Fully shaped prediction produced by the prediction service.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub prediction: i64,
    pub probabilities: Vec<f64>,
    pub confidence: f64,
    pub model_version: String,
    pub inference_time_ms: f64,
}

/// Information about the currently held model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub model_path: String,
    pub is_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_features_resolve_in_key_order() {
        let input: FeatureInput =
            serde_json::from_str(r#"{"f2": 2.0, "f1": 1.0, "f3": 3.0}"#).unwrap();
        assert!(input.is_named());
        assert_eq!(input.to_vector(), vec![1.0, 2.0, 3.0]);
        assert_eq!(input.name_at(1), "f2");
    }

    #[test]
    fn ordered_features_resolve_as_given() {
        let input: FeatureInput = serde_json::from_str("[4.0, 2.0, 3.0]").unwrap();
        assert!(!input.is_named());
        assert_eq!(input.to_vector(), vec![4.0, 2.0, 3.0]);
        assert_eq!(input.name_at(2), "2");
    }

    #[test]
    fn request_accepts_both_feature_forms() {
        let named: PredictionRequest =
            serde_json::from_str(r#"{"features": {"a": 1.0}}"#).unwrap();
        assert_eq!(named.features.len(), 1);

        let ordered: PredictionRequest =
            serde_json::from_str(r#"{"features": [1.0, 2.0]}"#).unwrap();
        assert_eq!(ordered.features.len(), 2);
    }

    #[test]
    fn empty_feature_forms_report_empty() {
        let named: FeatureInput = serde_json::from_str("{}").unwrap();
        assert!(named.is_empty());

        let ordered: FeatureInput = serde_json::from_str("[]").unwrap();
        assert!(ordered.is_empty());
    }
}
