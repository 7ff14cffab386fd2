//! Central Configuration Constants
//!
//! Single source of truth for service defaults.

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8088;

/// Default classifier timeout (milliseconds)
pub const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 3000;

/// Upper bound a caller may request for the classifier timeout
pub const MAX_CLASSIFIER_TIMEOUT_MS: u64 = 30_000;

/// Blocking inferences allowed in flight, abandoned ones included
pub const MAX_PENDING_INFERENCES: usize = 4;

/// Default model location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "models/url-detector.onnx";

/// Verdict details shown to the user
pub const DETAILS_PHISHING: &str = "This page may be a phishing attempt.";
pub const DETAILS_SAFE: &str = "This page seems safe.";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Phish Shield";
