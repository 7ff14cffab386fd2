//! Logic Module - the verdict pipeline
//!
//! - `config` - thresholds, model parameters, lookup tables
//! - `url_features/` - URL string -> versioned feature vector
//! - `content/` - page structure -> sub-detector scores -> content score
//! - `model/` - URL classifier client (ONNX) and per-signal predictions
//! - `stacking` - URL + content -> final verdict
//! - `pipeline` - request orchestration

pub mod config;
pub mod content;
pub mod model;
pub mod pipeline;
pub mod stacking;
pub mod url_features;

pub use config::DetectorConfig;
pub use pipeline::{Evaluation, EvaluationRequest, PredictionAssembler};
pub use stacking::{FinalVerdict, StackingCombiner};
