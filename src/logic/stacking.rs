//! Stacking Combiner
//!
//! Fuses the URL and content predictions into one `FinalVerdict`. When the
//! two signals agree, their shared verdict stands; only a disagreement is
//! settled by the stacked logistic model.

use serde::{Deserialize, Serialize};

use crate::constants::{DETAILS_PHISHING, DETAILS_SAFE};

use super::config::{SignalThresholds, StackingParameters};
use super::content::sigmoid;
use super::model::PredictionResult;

/// Final answer for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalVerdict {
    #[serde(rename = "isURL")]
    pub is_url: bool,
    #[serde(rename = "urlScore")]
    pub url_score: f64,
    #[serde(rename = "isContent")]
    pub is_content: bool,
    #[serde(rename = "contentScore")]
    pub content_score: f64,
    #[serde(rename = "isCombinedPhishing")]
    pub is_combined_phishing: bool,
    #[serde(rename = "combinedScore")]
    pub combined_score: f64,
    #[serde(rename = "isPhishing")]
    pub is_phishing: bool,
    pub details: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StackingCombiner {
    params: StackingParameters,
    thresholds: SignalThresholds,
}

impl StackingCombiner {
    pub fn new(params: StackingParameters, thresholds: SignalThresholds) -> Self {
        Self { params, thresholds }
    }

    /// Build a `PredictionResult` for each signal from its raw score
    pub fn url_prediction(&self, score: f64) -> PredictionResult {
        PredictionResult::from_score(score, self.thresholds.url)
    }

    pub fn content_prediction(&self, score: f64) -> PredictionResult {
        PredictionResult::from_score(score, self.thresholds.content)
    }

    pub fn combined_score(&self, url_score: f64, content_score: f64) -> f64 {
        let [w_url, w_content] = self.params.weights;
        sigmoid(w_url * url_score + w_content * content_score + self.params.bias)
    }

    pub fn combine(&self, url: &PredictionResult, content: &PredictionResult) -> FinalVerdict {
        let is_url = url.score > url.threshold;
        let is_content = content.score > content.threshold;

        let combined_score = self.combined_score(url.score, content.score);
        let is_combined_phishing = combined_score > self.params.threshold;

        let is_phishing = if is_url == is_content {
            is_url
        } else {
            is_combined_phishing
        };

        FinalVerdict {
            is_url,
            url_score: url.score,
            is_content,
            content_score: content.score,
            is_combined_phishing,
            combined_score,
            is_phishing,
            details: if is_phishing {
                DETAILS_PHISHING
            } else {
                DETAILS_SAFE
            }
            .to_string(),
        }
    }
}
