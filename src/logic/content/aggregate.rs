//! Content aggregation strategies
//!
//! Turns the six sub-detector scores into one content score. The strategy
//! is part of the model version: swapping it changes what the content
//! threshold means.

use serde::{Deserialize, Serialize};

/// Number of sub-detectors feeding the aggregate
pub const SUB_DETECTOR_COUNT: usize = 6;

/// Logistic model v1, detector declaration order:
/// forms, link text, external logos, password without https, obfuscated script, excess inputs
pub const CONTENT_LR_WEIGHTS: [f64; SUB_DETECTOR_COUNT] =
    [2.7813, 1.9462, 1.0937, 2.9524, 1.5871, 0.8126];
pub const CONTENT_LR_BIAS: f64 = -2.3418;

/// Weights of the older weighted-average scorer
pub const LEGACY_AVERAGE_WEIGHTS: [f64; SUB_DETECTOR_COUNT] = [1.0, 0.7, 0.4, 1.0, 0.6, 0.3];

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ContentAggregation {
    /// `sigmoid(bias + sum(w_i * s_i))`
    Logistic {
        weights: [f64; SUB_DETECTOR_COUNT],
        bias: f64,
    },
    /// `min(1, sum(w_i * s_i) / sum(w_i))`
    WeightedAverage { weights: [f64; SUB_DETECTOR_COUNT] },
}

impl Default for ContentAggregation {
    fn default() -> Self {
        ContentAggregation::Logistic {
            weights: CONTENT_LR_WEIGHTS,
            bias: CONTENT_LR_BIAS,
        }
    }
}

impl ContentAggregation {
    pub fn legacy_weighted_average() -> Self {
        ContentAggregation::WeightedAverage {
            weights: LEGACY_AVERAGE_WEIGHTS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentAggregation::Logistic { .. } => "logistic",
            ContentAggregation::WeightedAverage { .. } => "weighted_average",
        }
    }

    /// Aggregate score in [0, 1]
    pub fn aggregate(&self, scores: &[f64; SUB_DETECTOR_COUNT]) -> f64 {
        match self {
            ContentAggregation::Logistic { weights, bias } => {
                let z = weights
                    .iter()
                    .zip(scores.iter())
                    .fold(*bias, |acc, (w, s)| acc + w * s);
                sigmoid(z)
            }
            ContentAggregation::WeightedAverage { weights } => {
                let total: f64 = weights.iter().sum();
                if total <= 0.0 {
                    return 0.0;
                }
                let weighted: f64 = weights.iter().zip(scores.iter()).map(|(w, s)| w * s).sum();
                (weighted / total).clamp(0.0, 1.0)
            }
        }
    }
}
