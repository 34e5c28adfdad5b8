//! Health reporting for liveness probes
//!
//! The health endpoint is a liveness signal only: it reports healthy
//! whenever the process can respond, not whether any dependency is in a
//! good state.

use serde::{Deserialize, Serialize};

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(model_loaded: bool, version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            model_loaded,
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_response_serializes_lowercase_status() {
        let response = HealthResponse::healthy(true, "v1.0.0");
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["version"], "v1.0.0");
    }
}
