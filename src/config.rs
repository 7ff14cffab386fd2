//! Server configuration module

use std::env;

use crate::constants::DEFAULT_PORT;

/// Process-level configuration (from environment variables)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Optional JSON file overriding detector tables / parameters
    pub detector_config_path: Option<String>,

    /// ONNX model for the URL classifier (overrides the config file)
    pub model_path: Option<String>,

    /// Expected SHA-256 (hex) of the model file
    pub model_sha256: Option<String>,

    /// Classifier timeout when the request does not carry one (overrides the config file)
    pub classifier_timeout_ms: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),

            detector_config_path: env::var("PHISH_CONFIG").ok().filter(|p| !p.is_empty()),

            model_path: env::var("PHISH_MODEL_PATH").ok().filter(|p| !p.is_empty()),

            model_sha256: env::var("PHISH_MODEL_SHA256").ok().filter(|s| !s.is_empty()),

            classifier_timeout_ms: env::var("PHISH_CLASSIFIER_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok()),
        }
    }
}
