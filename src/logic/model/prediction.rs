//! Per-signal prediction

use serde::{Deserialize, Serialize};

/// One signal's score, verdict and the threshold that produced the verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub score: f64,
    pub verdict: bool,
    pub threshold: f64,
}

impl PredictionResult {
    /// Verdict is strictly `score > threshold`
    pub fn from_score(score: f64, threshold: f64) -> Self {
        Self {
            score,
            verdict: score > threshold,
            threshold,
        }
    }
}
