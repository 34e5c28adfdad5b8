//! Model loading and inference
//!
//! Wraps a tract-onnx plan loaded from disk, downgrading to the synthetic
//! fallback classifier when no usable artifact is found. The handle is
//! built once at startup and never mutated afterward, so it can be shared
//! across request handlers without locking.

use super::fallback::{FallbackClassifier, FALLBACK_FEATURES};
use crate::error::ModelError;
use crate::models::{ModelMetadata, Prediction};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tracing::{info, warn};

/// Artifact file name looked up when the configured path is a directory
const MODEL_FILE_NAME: &str = "model.onnx";

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

enum Backend {
    Onnx(TractModel),
    Fallback(FallbackClassifier),
}

/// Read-only handle to the loaded model.
pub struct ModelAdapter {
    backend: Backend,
    model_path: PathBuf,
    version: String,
    n_features: usize,
}

impl ModelAdapter {
    /// Load a model from `path`.
    ///
    /// A missing or unreadable artifact downgrades to the fallback
    /// classifier instead of failing, so the service can always answer
    /// predict requests.
    pub fn load(path: impl AsRef<Path>, version: &str, n_features: usize) -> Self {
        let artifact = resolve_artifact(path.as_ref());

        match Self::load_onnx(&artifact, n_features) {
            Ok(model) => {
                info!(path = %artifact.display(), n_features, "Loaded ONNX model");
                Self {
                    backend: Backend::Onnx(model),
                    model_path: artifact,
                    version: version.to_string(),
                    n_features,
                }
            }
            Err(err) => {
                warn!(
                    path = %artifact.display(),
                    error = %err,
                    "Model artifact unavailable, using fallback classifier"
                );
                Self {
                    backend: Backend::Fallback(FallbackClassifier::fit()),
                    model_path: artifact,
                    version: version.to_string(),
                    n_features: FALLBACK_FEATURES,
                }
            }
        }
    }

    /// Load and optimize an ONNX artifact
    fn load_onnx(path: &Path, n_features: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Feature dimensionality the model expects
    pub fn expected_features(&self) -> usize {
        self.n_features
    }

    /// Version string reported alongside predictions
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run inference on a canonical ordered feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        if let Some(index) = features.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteValue { index });
        }

        let probabilities = match &self.backend {
            Backend::Onnx(model) => self.run_onnx(model, features)?,
            Backend::Fallback(classifier) => classifier.predict_proba(features),
        };

        let (label, confidence) = argmax(&probabilities);
        Ok(Prediction {
            label: label as i64,
            probabilities,
            confidence,
        })
    }

    fn run_onnx(&self, model: &TractModel, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .map_err(|e| ModelError::Inference(e.into()))?
            .into();

        let result = model
            .run(tvec!(input.into()))
            .map_err(ModelError::Inference)?;
        let output = result
            .first()
            .ok_or_else(|| ModelError::Inference(anyhow::anyhow!("No output from model")))?;

        let view = output
            .to_array_view::<f32>()
            .map_err(ModelError::Inference)?;
        let raw: Vec<f64> = view.iter().map(|&v| v as f64).collect();
        if raw.is_empty() {
            return Err(ModelError::Inference(anyhow::anyhow!(
                "Model produced an empty output"
            )));
        }

        // The artifact's output layer is expected to yield class
        // probabilities; renormalize to keep the sum-to-one invariant
        // against float drift.
        Ok(normalize(&raw))
    }

    pub fn info(&self) -> ModelMetadata {
        let model_type = match &self.backend {
            Backend::Onnx(_) => "OnnxModel",
            Backend::Fallback(_) => "FallbackLogisticRegression",
        };
        ModelMetadata {
            model_type: model_type.to_string(),
            model_path: self.model_path.display().to_string(),
            is_loaded: true,
        }
    }
}

fn resolve_artifact(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MODEL_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}

fn normalize(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().sum();
    if sum > 0.0 {
        raw.iter().map(|v| v / sum).collect()
    } else {
        vec![1.0 / raw.len() as f64; raw.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fallback_adapter() -> ModelAdapter {
        ModelAdapter::load("/nonexistent/model.onnx", "v1.0.0", 4)
    }

    #[test]
    fn missing_artifact_falls_back_but_reports_loaded() {
        let adapter = fallback_adapter();
        let info = adapter.info();

        assert!(info.is_loaded);
        assert_eq!(info.model_type, "FallbackLogisticRegression");
        assert_eq!(info.model_path, "/nonexistent/model.onnx");
        assert_eq!(adapter.expected_features(), FALLBACK_FEATURES);
    }

    #[test]
    fn corrupt_artifact_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not an onnx model").unwrap();

        let adapter = ModelAdapter::load(file.path(), "v1.0.0", 4);
        assert_eq!(adapter.info().model_type, "FallbackLogisticRegression");
        assert!(adapter.info().is_loaded);
    }

    #[test]
    fn directory_path_resolves_to_artifact_file() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = ModelAdapter::load(dir.path(), "v1.0.0", 4);

        assert!(adapter.info().model_path.ends_with("model.onnx"));
    }

    #[test]
    fn predict_returns_confidence_equal_to_max_probability() {
        let adapter = fallback_adapter();
        let prediction = adapter.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap();

        let max = prediction
            .probabilities
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(prediction.confidence, max);
        assert_eq!(
            prediction.label as usize,
            prediction
                .probabilities
                .iter()
                .position(|&p| p == max)
                .unwrap()
        );
    }

    #[test]
    fn predict_rejects_dimension_mismatch() {
        let adapter = fallback_adapter();
        let err = adapter.predict(&[1.0, 2.0]).unwrap_err();

        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn predict_rejects_non_finite_features() {
        let adapter = fallback_adapter();
        let err = adapter.predict(&[1.0, f64::NAN, 3.0, 4.0]).unwrap_err();

        assert!(matches!(err, ModelError::NonFiniteValue { index: 1 }));
    }

    #[test]
    fn normalize_handles_degenerate_output() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.5, 0.5]);
        let normalized = normalize(&[2.0, 6.0]);
        assert!((normalized[0] - 0.25).abs() < 1e-12);
        assert!((normalized[1] - 0.75).abs() < 1e-12);
    }
}
