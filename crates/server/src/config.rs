//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration, read once at startup from the environment
/// (MODEL_PATH, LOG_LEVEL, ENVIRONMENT, HOST, PORT, API_VERSION,
/// N_FEATURES).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Model artifact path: a file, or a directory containing `model.onnx`
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Log level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment environment name
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Version string reported alongside predictions
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Feature dimensionality expected by a real model artifact
    #[serde(default = "default_n_features")]
    pub n_features: usize,
}

fn default_model_path() -> String {
    "/app/models".to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_version() -> String {
    "v1.0.0".to_string()
}

fn default_n_features() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            log_level: default_log_level(),
            environment: default_environment(),
            host: default_host(),
            port: default_port(),
            api_version: default_api_version(),
            n_features: default_n_features(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
