//! Model access: ONNX inference and the synthetic fallback classifier

mod adapter;
mod fallback;

pub use adapter::ModelAdapter;
pub use fallback::{FallbackClassifier, FALLBACK_FEATURES};
