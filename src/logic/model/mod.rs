//! Model Module - URL classifier client and per-signal predictions

pub mod classifier;
pub mod prediction;

pub use classifier::{
    finalize_score, verify_model_checksum, InferenceGate, ModelMetadata, OnnxUrlClassifier,
    UnavailableClassifier, UrlClassifierClient,
};
pub use prediction::PredictionResult;
