//! HTTP handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::APP_VERSION;
use crate::logic::content::{PageSnapshot, SUB_DETECTOR_COUNT};
use crate::logic::model::ModelMetadata;
use crate::logic::pipeline::EvaluationRequest;
use crate::logic::stacking::FinalVerdict;
use crate::logic::url_features::LayoutInfo;

use super::error::ApiResult;
use super::AppState;

// ============================================================================
// HEALTH
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: i64,
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelMetadata>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.assembler.classifier_loaded();
    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "degraded" }.to_string(),
        version: APP_VERSION.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        model_loaded,
        model: state.assembler.classifier_metadata(),
    })
}

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

pub async fn layout() -> Json<LayoutInfo> {
    Json(LayoutInfo::current())
}

// ============================================================================
// EVALUATE
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateBody {
    #[validate(length(min = 1, max = 8192))]
    pub url: String,
    #[serde(default)]
    pub page: Option<PageSnapshot>,
    #[serde(default)]
    pub html: Option<String>,
    #[validate(range(min = 1, max = 30000))]
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// `FinalVerdict` fields plus the content explanation, when collected
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    #[serde(flatten)]
    pub verdict: FinalVerdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_features: Option<[f64; SUB_DETECTOR_COUNT]>,
}

pub async fn evaluate(
    State(state): State<AppState>,
    body: Result<Json<EvaluateBody>, JsonRejection>,
) -> ApiResult<Json<EvaluateResponse>> {
    let Json(body) = body?;
    body.validate()?;

    let request = EvaluationRequest {
        url: body.url,
        page: body.page,
        html: body.html,
        timeout_ms: body.timeout_ms,
    };

    let evaluation = state.assembler.evaluate(request).await?;

    Ok(Json(EvaluateResponse {
        verdict: evaluation.verdict,
        reasons: evaluation.content.reasons,
        content_features: evaluation.content.features,
    }))
}
