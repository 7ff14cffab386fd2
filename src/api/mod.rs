//! HTTP API
//!
//! - `GET  /health`
//! - `GET  /api/v1/features/layout`
//! - `POST /api/v1/evaluate`

pub mod error;
pub mod handlers;


use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::logic::pipeline::PredictionAssembler;

pub use error::{ApiError, ApiResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<PredictionAssembler>,
}

impl AppState {
    pub fn new(assembler: PredictionAssembler) -> Self {
        Self {
            assembler: Arc::new(assembler),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/features/layout", get(handlers::layout))
        .route("/api/v1/evaluate", post(handlers::evaluate))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
