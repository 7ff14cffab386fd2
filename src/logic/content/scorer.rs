//! Page Structure Scorer
//!
//! Runs the six sub-detectors over one consistent view of the page and
//! aggregates them with the configured `ContentAggregation`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PipelineResult};
use crate::logic::config::{DetectorTables, ScorerOptions};

use super::aggregate::{ContentAggregation, SUB_DETECTOR_COUNT};
use super::detectors::{self, PageContext, SubDetectorResult};
use super::patterns::{compile_all, CompiledPattern};
use super::snapshot::PageStructure;

/// Sub-detector names, in aggregation order
pub const SUB_DETECTOR_NAMES: [&str; SUB_DETECTOR_COUNT] = [
    "suspicious_forms",
    "mismatched_link_text",
    "external_logos",
    "password_without_https",
    "obfuscated_script",
    "excess_input_fields",
];

/// Output of the content signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateContentResult {
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    /// Raw sub-detector scores, only when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<[f64; SUB_DETECTOR_COUNT]>,
}

pub struct PageStructureScorer {
    tables: Arc<DetectorTables>,
    patterns: Vec<CompiledPattern>,
    aggregation: ContentAggregation,
    options: ScorerOptions,
}

impl PageStructureScorer {
    /// Compiles the script patterns; an invalid pattern is a config error
    pub fn new(
        tables: Arc<DetectorTables>,
        aggregation: ContentAggregation,
        options: ScorerOptions,
    ) -> Result<Self, ConfigError> {
        let patterns = compile_all(&tables.script_patterns)?;
        Ok(Self {
            tables,
            patterns,
            aggregation,
            options,
        })
    }

    /// Score a page.
    ///
    /// Every accessor is read before any detector runs; if one fails, or
    /// the page reports itself invalid afterwards, the whole call fails
    /// with `StructureAccess` and no partial result is produced.
    pub fn predict(&self, page: &dyn PageStructure) -> PipelineResult<AggregateContentResult> {
        let page_url = page.page_url()?;
        let html_length = page.html_length()?;
        let forms = page.forms()?;
        let links = page.links()?;
        let images = page.images()?;
        let scripts = page.scripts()?;
        let inputs = page.inputs()?;
        page.ensure_valid()?;

        let ctx = PageContext::parse(&page_url)?;
        let collect = self.options.include_reasons;

        let results: [SubDetectorResult; SUB_DETECTOR_COUNT] = [
            detectors::suspicious_forms(&ctx, &forms, &self.tables, collect),
            detectors::mismatched_link_text(&ctx, &links, &self.tables, collect),
            detectors::external_logos(&ctx, &images, &self.tables, collect),
            detectors::password_without_https(&ctx, &inputs, collect),
            detectors::obfuscated_script(&scripts, &self.patterns, collect),
            detectors::excess_input_fields(&inputs, self.tables.max_input_fields, collect),
        ];

        let mut scores = [0.0f64; SUB_DETECTOR_COUNT];
        let mut reasons = Vec::new();
        for (i, result) in results.into_iter().enumerate() {
            scores[i] = result.score.clamp(0.0, 1.0);
            reasons.extend(result.reasons);
        }

        let score = self.aggregation.aggregate(&scores).clamp(0.0, 1.0);

        log::debug!(
            "Content scored {:.4} ({}) for {} [{} bytes, {} forms, {} links, {} images, {} scripts, {} inputs] sub-scores={:?}",
            score,
            self.aggregation.name(),
            ctx.full_host,
            html_length,
            forms.len(),
            links.len(),
            images.len(),
            scripts.len(),
            inputs.len(),
            scores,
        );

        Ok(AggregateContentResult {
            score,
            reasons,
            features: self.options.include_features.then_some(scores),
        })
    }
}
