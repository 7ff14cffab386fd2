//! Prediction Assembler
//!
//! One request, one run: extract URL features, then run the URL classifier
//! and the page scorer concurrently, and combine. Either signal failing
//! fails the whole evaluation; no default score is ever substituted.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_CLASSIFIER_TIMEOUT_MS;
use crate::error::{PipelineError, PipelineResult};

use super::config::DetectorConfig;
use super::content::{AggregateContentResult, PageSnapshot, PageStructureScorer};
use super::model::{ModelMetadata, UrlClassifierClient};
use super::stacking::{FinalVerdict, StackingCombiner};
use super::url_features::UrlFeatureExtractor;

/// What the caller hands in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub url: String,
    /// Pre-extracted page structure
    #[serde(default)]
    pub page: Option<PageSnapshot>,
    /// Raw HTML, parsed when no `page` is given
    #[serde(default)]
    pub html: Option<String>,
    /// Per-request classifier timeout
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Verdict plus the content explanation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: FinalVerdict,
    pub content: AggregateContentResult,
}

pub struct PredictionAssembler {
    extractor: Arc<UrlFeatureExtractor>,
    scorer: Arc<PageStructureScorer>,
    classifier: Arc<dyn UrlClassifierClient>,
    combiner: StackingCombiner,
    default_timeout_ms: u64,
}

impl PredictionAssembler {
    pub fn new(
        extractor: Arc<UrlFeatureExtractor>,
        scorer: Arc<PageStructureScorer>,
        classifier: Arc<dyn UrlClassifierClient>,
        combiner: StackingCombiner,
        default_timeout_ms: u64,
    ) -> Self {
        Self {
            extractor,
            scorer,
            classifier,
            combiner,
            default_timeout_ms,
        }
    }

    /// Wire everything from a loaded `DetectorConfig`
    pub fn from_config(
        config: &DetectorConfig,
        classifier: Arc<dyn UrlClassifierClient>,
    ) -> Result<Self, crate::error::ConfigError> {
        let tables = Arc::new(config.tables.clone());
        let extractor = Arc::new(UrlFeatureExtractor::new(Arc::clone(&tables)));
        let scorer = Arc::new(PageStructureScorer::new(
            tables,
            config.content_model.clone(),
            config.scorer,
        )?);
        let combiner = StackingCombiner::new(config.stacking, config.thresholds);

        Ok(Self::new(
            extractor,
            scorer,
            classifier,
            combiner,
            config.classifier.timeout_ms,
        ))
    }

    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    pub fn classifier_metadata(&self) -> Option<ModelMetadata> {
        self.classifier.metadata()
    }

    fn timeout_for(&self, requested: Option<u64>) -> Duration {
        let ms = requested
            .unwrap_or(self.default_timeout_ms)
            .clamp(1, MAX_CLASSIFIER_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub async fn evaluate(&self, request: EvaluationRequest) -> PipelineResult<Evaluation> {
        let request_id = Uuid::new_v4();
        let EvaluationRequest {
            url,
            page,
            html,
            timeout_ms,
        } = request;

        // malformed URL fails before any signal is started
        let features = self.extractor.extract_all_features(&url)?;
        log::debug!("[{}] URL features {}", request_id, features.to_log_entry());

        let page = match (page, html) {
            (Some(page), _) => page.with_default_url(&url),
            (None, Some(html)) => PageSnapshot::from_html(&url, &html)?,
            (None, None) => {
                return Err(PipelineError::StructureAccess(
                    "no page snapshot or HTML supplied".to_string(),
                ))
            }
        };

        let timeout = self.timeout_for(timeout_ms);
        let classifier = Arc::clone(&self.classifier);
        let url_signal = async move {
            match tokio::time::timeout(timeout, classifier.predict(&features)).await {
                Ok(result) => result,
                Err(_) => {
                    // a blocking inference already started keeps running detached
                    log::warn!(
                        "[{}] classifier timed out after {}ms",
                        request_id,
                        timeout.as_millis()
                    );
                    Err(PipelineError::ModelUnavailable(format!(
                        "classifier timed out after {}ms",
                        timeout.as_millis()
                    )))
                }
            }
        };

        let scorer = Arc::clone(&self.scorer);
        let content_signal = async move {
            tokio::task::spawn_blocking(move || scorer.predict(&page))
                .await
                .map_err(|e| PipelineError::StructureAccess(format!("scorer task failed: {}", e)))?
        };

        let (url_result, content_result) = tokio::join!(url_signal, content_signal);

        let url_score = url_result.map_err(|e| {
            log::warn!("[{}] URL signal failed: {}", request_id, e);
            e
        })?;
        let content = content_result.map_err(|e| {
            log::warn!("[{}] content signal failed: {}", request_id, e);
            e
        })?;

        let url_prediction = self.combiner.url_prediction(url_score);
        let content_prediction = self.combiner.content_prediction(content.score);
        let verdict = self.combiner.combine(&url_prediction, &content_prediction);

        log::debug!(
            "[{}] {} url={:.4} content={:.4} combined={:.4} phishing={}",
            request_id,
            url,
            verdict.url_score,
            verdict.content_score,
            verdict.combined_score,
            verdict.is_phishing
        );

        Ok(Evaluation { verdict, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DETAILS_PHISHING, DETAILS_SAFE};
    use crate::logic::content::InputElement;
    use crate::logic::url_features::FeatureVector;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier {
        score: f64,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(score: f64) -> Self {
            Self {
                score,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UrlClassifierClient for FixedClassifier {
        async fn predict(&self, _features: &FeatureVector) -> PipelineResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.score)
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl UrlClassifierClient for SlowClassifier {
        async fn predict(&self, _features: &FeatureVector) -> PipelineResult<f64> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(0.9)
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl UrlClassifierClient for FailingClassifier {
        async fn predict(&self, _features: &FeatureVector) -> PipelineResult<f64> {
            Err(PipelineError::ModelUnavailable("backend down".to_string()))
        }
    }

    fn assembler(classifier: Arc<dyn UrlClassifierClient>) -> PredictionAssembler {
        PredictionAssembler::from_config(&DetectorConfig::default(), classifier).unwrap()
    }

    fn request(url: &str, page: PageSnapshot) -> EvaluationRequest {
        EvaluationRequest {
            url: url.to_string(),
            page: Some(page),
            ..Default::default()
        }
    }

    fn clean_page() -> PageSnapshot {
        PageSnapshot::new("https://example.com/")
    }

    fn password_over_http() -> PageSnapshot {
        PageSnapshot {
            page_url: "http://example.com/login".to_string(),
            inputs: vec![InputElement::new("password")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_both_safe() {
        let a = assembler(Arc::new(FixedClassifier::new(0.1)));
        let eval = a
            .evaluate(request("https://example.com/", clean_page()))
            .await
            .unwrap();

        assert!(!eval.verdict.is_url);
        assert!(!eval.verdict.is_content);
        assert!(!eval.verdict.is_phishing);
        assert_eq!(eval.verdict.url_score, 0.1);
        assert_eq!(eval.verdict.details, DETAILS_SAFE);
    }

    #[tokio::test]
    async fn test_both_phishing() {
        let a = assembler(Arc::new(FixedClassifier::new(0.95)));
        let eval = a
            .evaluate(request("http://example.com/login", password_over_http()))
            .await
            .unwrap();

        assert!(eval.verdict.is_url);
        assert!(eval.verdict.is_content);
        assert!(eval.verdict.is_phishing);
        assert_eq!(eval.verdict.details, DETAILS_PHISHING);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_classifier() {
        let classifier = Arc::new(FixedClassifier::new(0.5));
        let a = assembler(classifier.clone());

        let err = a.evaluate(request("http://", clean_page())).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidUrl { .. }));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classifier_timeout_is_model_unavailable() {
        let a = assembler(Arc::new(SlowClassifier));
        let mut req = request("https://example.com/", clean_page());
        req.timeout_ms = Some(20);

        let err = a.evaluate(req).await.unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_classifier_failure_propagates() {
        let a = assembler(Arc::new(FailingClassifier));
        let err = a
            .evaluate(request("https://example.com/", clean_page()))
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::ModelUnavailable("backend down".to_string()));
    }

    #[tokio::test]
    async fn test_missing_page_is_structure_error() {
        let a = assembler(Arc::new(FixedClassifier::new(0.1)));
        let req = EvaluationRequest {
            url: "https://example.com/".to_string(),
            ..Default::default()
        };
        let err = a.evaluate(req).await.unwrap_err();
        assert!(matches!(err, PipelineError::StructureAccess(_)));
    }

    #[tokio::test]
    async fn test_url_error_reported_before_content_error() {
        let a = assembler(Arc::new(FailingClassifier));
        let mut page = clean_page();
        page.page_url = "not a url".to_string();

        let err = a.evaluate(request("https://example.com/", page)).await.unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_html_is_parsed_when_no_snapshot() {
        let a = assembler(Arc::new(FixedClassifier::new(0.1)));
        let req = EvaluationRequest {
            url: "http://example.com/login".to_string(),
            html: Some(r#"<form><input type="password"></form>"#.to_string()),
            ..Default::default()
        };

        let eval = a.evaluate(req).await.unwrap();
        assert!(eval.verdict.is_content);
        assert!(!eval.verdict.is_url);
        // disagreement settled by the stacked model
        let expected = a.combiner.combined_score(0.1, eval.verdict.content_score) > 0.4766;
        assert_eq!(eval.verdict.is_phishing, expected);
    }

    #[tokio::test]
    async fn test_snapshot_without_url_gets_request_url() {
        let a = assembler(Arc::new(FixedClassifier::new(0.1)));
        let page = PageSnapshot {
            inputs: vec![InputElement::new("password")],
            ..Default::default()
        };
        let eval = a
            .evaluate(request("http://example.com/", page))
            .await
            .unwrap();
        assert!(eval.verdict.is_content);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let a = assembler(Arc::new(FixedClassifier::new(0.1)));
        assert_eq!(a.timeout_for(None), Duration::from_millis(3000));
        assert_eq!(a.timeout_for(Some(0)), Duration::from_millis(1));
        assert_eq!(
            a.timeout_for(Some(u64::MAX)),
            Duration::from_millis(MAX_CLASSIFIER_TIMEOUT_MS)
        );
    }
}
