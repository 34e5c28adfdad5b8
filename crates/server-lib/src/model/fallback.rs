//! Fallback logistic-regression classifier
//!
//! Fit at startup on a small synthetic dataset with a fixed seed, so the
//! service can always produce a response even when no model artifact
//! exists on disk. Predictions are meaningless; availability is the point.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Feature dimensionality of the synthetic training set
pub const FALLBACK_FEATURES: usize = 4;

/// Number of synthetic training samples
const SAMPLES: usize = 100;

/// Seed for the synthetic dataset, fixed for reproducibility
const SEED: u64 = 42;

const EPOCHS: usize = 200;
const LEARNING_RATE: f64 = 0.1;

/// Two-class logistic regression fit by plain gradient descent.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackClassifier {
    weights: Vec<f64>,
    bias: f64,
}

impl FallbackClassifier {
    /// Fit on the deterministic synthetic dataset.
    pub fn fit() -> Self {
        let (xs, ys) = synthetic_dataset();

        let mut weights = vec![0.0; FALLBACK_FEATURES];
        let mut bias = 0.0;

        for _ in 0..EPOCHS {
            for (x, &y) in xs.iter().zip(ys.iter()) {
                let p = sigmoid(dot(&weights, x) + bias);
                let err = p - y;
                for (w, xi) in weights.iter_mut().zip(x.iter()) {
                    *w -= LEARNING_RATE * err * xi;
                }
                bias -= LEARNING_RATE * err;
            }
        }

        Self { weights, bias }
    }

    pub fn n_features(&self) -> usize {
        FALLBACK_FEATURES
    }

    /// Two-class probability vector `[P(class 0), P(class 1)]`.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let p = sigmoid(dot(&self.weights, features) + self.bias);
        vec![1.0 - p, p]
    }
}

/// Uniform features labeled by a fixed linear rule, so the dataset is
/// linearly separable and the fit converges well within `EPOCHS`.
fn synthetic_dataset() -> (Vec<[f64; FALLBACK_FEATURES]>, Vec<f64>) {
    let separator = [0.8, -0.5, 0.3, 0.6];
    let mut rng = StdRng::seed_from_u64(SEED);

    let mut xs = Vec::with_capacity(SAMPLES);
    let mut ys = Vec::with_capacity(SAMPLES);
    for _ in 0..SAMPLES {
        let mut x = [0.0; FALLBACK_FEATURES];
        for v in x.iter_mut() {
            *v = rng.gen_range(-1.0..1.0);
        }
        let y = if dot(&separator, &x) > 0.0 { 1.0 } else { 0.0 };
        xs.push(x);
        ys.push(y);
    }
    (xs, ys)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_is_deterministic() {
        assert_eq!(FallbackClassifier::fit(), FallbackClassifier::fit());
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = FallbackClassifier::fit();
        let proba = model.predict_proba(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn fit_separates_the_training_rule() {
        let model = FallbackClassifier::fit();

        // Points far on either side of the labeling rule.
        let positive = model.predict_proba(&[1.0, -1.0, 1.0, 1.0]);
        let negative = model.predict_proba(&[-1.0, 1.0, -1.0, -1.0]);

        assert!(positive[1] > 0.5);
        assert!(negative[0] > 0.5);
    }
}
