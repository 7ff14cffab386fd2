//! Phish Shield - verdict server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use phish_shield::api::{create_router, AppState};
use phish_shield::config::ServerConfig;
use phish_shield::constants::{APP_NAME, APP_VERSION};
use phish_shield::logic::config::DetectorConfig;
use phish_shield::logic::model::{OnnxUrlClassifier, UnavailableClassifier, UrlClassifierClient};
use phish_shield::logic::pipeline::PredictionAssembler;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let server = ServerConfig::from_env();

    let detector_config = match &server.detector_config_path {
        Some(path) => DetectorConfig::from_file(path).expect("Failed to load detector config"),
        None => {
            log::info!("No PHISH_CONFIG set - using built-in detector config");
            DetectorConfig::default()
        }
    }
    .with_server_overrides(&server);

    let classifier_config = &detector_config.classifier;
    let classifier: Arc<dyn UrlClassifierClient> = match OnnxUrlClassifier::load(
        &classifier_config.model_path,
        classifier_config.model_sha256.as_deref(),
    ) {
        Ok(model) => {
            if let Some(meta) = model.metadata() {
                log::info!(
                    "Model {} ({} features) loaded at {}",
                    meta.model_path,
                    meta.feature_count,
                    meta.loaded_at
                );
            }
            Arc::new(model)
        }
        Err(e) => {
            log::warn!("URL classifier unavailable: {} - evaluations will fail with 503", e);
            Arc::new(UnavailableClassifier::new(e.to_string()))
        }
    };

    let assembler = PredictionAssembler::from_config(&detector_config, classifier)
        .expect("Failed to build prediction pipeline");

    let app = create_router(AppState::new(assembler));

    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
