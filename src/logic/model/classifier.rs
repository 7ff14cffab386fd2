//! URL Classifier - external model behind an async trait
//!
//! The pipeline only sees `UrlClassifierClient`. The shipped backend runs a
//! 19-input ONNX model natively through `ort`; when no model is available the
//! server falls back to `UnavailableClassifier`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;

use crate::constants::MAX_PENDING_INFERENCES;
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::logic::url_features::{layout_hash, FeatureVector, URL_FEATURE_COUNT};

// ============================================================================
// CLIENT TRAIT
// ============================================================================

/// Scores a URL feature vector with the external classifier.
///
/// Implementations return a probability in [0, 1]; anything else is
/// reported as `ModelUnavailable`.
#[async_trait]
pub trait UrlClassifierClient: Send + Sync {
    async fn predict(&self, features: &FeatureVector) -> PipelineResult<f64>;

    fn is_loaded(&self) -> bool {
        true
    }

    /// Description of the loaded model, if the backend has one
    fn metadata(&self) -> Option<ModelMetadata> {
        None
    }
}

/// Map a raw model output onto a probability
pub fn finalize_score(raw: f32) -> PipelineResult<f64> {
    if !raw.is_finite() {
        return Err(PipelineError::ModelUnavailable(format!(
            "classifier returned non-finite score {}",
            raw
        )));
    }
    Ok(f64::from(raw).clamp(0.0, 1.0))
}

// ============================================================================
// UNAVAILABLE
// ============================================================================

/// Stand-in used when no model could be loaded
#[derive(Debug, Clone)]
pub struct UnavailableClassifier {
    reason: String,
}

impl UnavailableClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl UrlClassifierClient for UnavailableClassifier {
    async fn predict(&self, _features: &FeatureVector) -> PipelineResult<f64> {
        Err(PipelineError::ModelUnavailable(self.reason.clone()))
    }

    fn is_loaded(&self) -> bool {
        false
    }
}

// ============================================================================
// ONNX
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub feature_count: usize,
    pub layout_hash: u32,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// SHA-256 of the model file must match `expected` (hex, case-insensitive)
pub fn verify_model_checksum(path: &Path, expected: &str) -> Result<(), ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let actual = hex::encode(Sha256::digest(&bytes));

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ConfigError::ChecksumMismatch {
            expected: expected.trim().to_lowercase(),
            actual,
        });
    }
    Ok(())
}

// ============================================================================
// INFERENCE GATE
// ============================================================================

/// Bounds the blocking inferences alive at once.
///
/// The permit moves into the blocking task, so an inference whose caller
/// timed out keeps its slot until it really finishes. Once every slot is
/// held, new calls fail fast instead of queueing behind the session lock.
#[derive(Debug, Clone)]
pub struct InferenceGate {
    permits: Arc<Semaphore>,
    max_pending: usize,
}

impl InferenceGate {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_pending)),
            max_pending,
        }
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn run_blocking<T, F>(&self, work: F) -> PipelineResult<T>
    where
        F: FnOnce() -> PipelineResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits).try_acquire_owned().map_err(|_| {
            PipelineError::ModelUnavailable(format!(
                "{} inferences already pending",
                self.max_pending
            ))
        })?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|e| PipelineError::ModelUnavailable(format!("inference task failed: {}", e)))?
    }
}

impl Default for InferenceGate {
    fn default() -> Self {
        Self::new(MAX_PENDING_INFERENCES)
    }
}

pub struct OnnxUrlClassifier {
    /// `ort` runs need `&mut Session`
    session: Arc<Mutex<Session>>,
    output_name: String,
    metadata: ModelMetadata,
    gate: InferenceGate,
}

impl OnnxUrlClassifier {
    pub fn load(model_path: &str, expected_sha256: Option<&str>) -> Result<Self, ConfigError> {
        log::info!("Loading URL classifier from: {}", model_path);

        let path = Path::new(model_path);
        if !path.exists() {
            return Err(ConfigError::Model(format!("model not found: {}", model_path)));
        }

        if let Some(expected) = expected_sha256 {
            verify_model_checksum(path, expected)?;
            log::info!("Model checksum verified");
        }

        let session = Session::builder()
            .map_err(|e| ConfigError::Model(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ConfigError::Model(format!("failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ConfigError::Model(format!("failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ConfigError::Model("model defines no outputs".to_string()))?;

        let metadata = ModelMetadata {
            model_path: model_path.to_string(),
            feature_count: URL_FEATURE_COUNT,
            layout_hash: layout_hash(),
            loaded_at: chrono::Utc::now(),
        };

        log::info!(
            "URL classifier loaded (output '{}', layout {:08x})",
            output_name,
            metadata.layout_hash
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            output_name,
            metadata,
            gate: InferenceGate::default(),
        })
    }
}

/// Blocking inference on one `[1, 19]` input row
fn run_session(
    session: &Mutex<Session>,
    output_name: &str,
    values: [f32; URL_FEATURE_COUNT],
) -> PipelineResult<f32> {
    let unavailable = |what: &str, e: &dyn std::fmt::Display| {
        PipelineError::ModelUnavailable(format!("{}: {}", what, e))
    };

    let input_array = Array2::<f32>::from_shape_vec((1, URL_FEATURE_COUNT), values.to_vec())
        .map_err(|e| unavailable("failed to create array", &e))?;
    let input_tensor =
        Value::from_array(input_array).map_err(|e| unavailable("failed to create tensor", &e))?;

    let mut session = session.lock();
    let outputs = session
        .run(ort::inputs![input_tensor])
        .map_err(|e| unavailable("inference failed", &e))?;

    let output = outputs
        .get(output_name)
        .ok_or_else(|| PipelineError::ModelUnavailable("no output from model".to_string()))?;
    let output_tensor = output
        .try_extract_tensor::<f32>()
        .map_err(|e| unavailable("failed to extract output", &e))?;

    output_tensor
        .1
        .first()
        .copied()
        .ok_or_else(|| PipelineError::ModelUnavailable("empty model output".to_string()))
}

#[async_trait]
impl UrlClassifierClient for OnnxUrlClassifier {
    async fn predict(&self, features: &FeatureVector) -> PipelineResult<f64> {
        features
            .validate()
            .map_err(|e| PipelineError::ModelUnavailable(e.to_string()))?;

        let session = Arc::clone(&self.session);
        let output_name = self.output_name.clone();
        let values = features.values;

        let raw = self
            .gate
            .run_blocking(move || run_session(&session, &output_name, values))
            .await?;

        finalize_score(raw)
    }

    fn metadata(&self) -> Option<ModelMetadata> {
        Some(self.metadata.clone())
    }
}
