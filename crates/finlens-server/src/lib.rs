//! HTTP API for finlens
//!
//! Routes (all JSON, under `/api`):
//!
//! - `POST /extract` - multipart PDF upload, returns the extracted figures
//! - `POST /analyze` - multipart PDF upload, returns figures, ratios and analysis
//! - `POST /ratios` - ratio engine over a JSON body
//! - `POST /market_analysis` - market analysis of a JSON ratio record
//! - `GET /health` - liveness probe

pub mod api;
pub mod error;

use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue};
use finlens_llm::providers::{GeminiConfig, GeminiProvider};
use finlens_report::{FinancialExtractor, MarketAnalyzer, PipelineConfig, default_registry};
use finlens_utils::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

pub use error::{ApiError, ApiResult};

/// Shared, read-only request state
pub struct AppState {
    pub extractor: Arc<FinancialExtractor>,
    pub analyzer: Arc<MarketAnalyzer>,
    pub upload_dir: PathBuf,
}

/// Build the pipeline against Gemini from process configuration
///
/// Creates the upload directory if it does not exist yet.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    std::fs::create_dir_all(&config.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.upload_dir.display()
        )
    })?;

    let mut gemini = GeminiConfig::new(config.require_api_key()?)
        .with_api_base(&config.gemini_api_base)
        .with_timeout(config.request_timeout.as_secs());
    if let Some(rpm) = config.requests_per_minute {
        gemini = gemini.with_requests_per_minute(rpm);
    }
    let provider = Arc::new(GeminiProvider::with_config(gemini)?);

    let prompts = Arc::new(default_registry()?);
    let pipeline = Arc::new(PipelineConfig::from_env_config(config)?);

    let extractor = FinancialExtractor::new(provider.clone(), prompts.clone(), pipeline.clone())
        .with_file_store(provider.clone());
    let analyzer = MarketAnalyzer::new(provider, prompts, pipeline);

    Ok(Arc::new(AppState {
        extractor: Arc::new(extractor),
        analyzer: Arc::new(analyzer),
        upload_dir: config.upload_dir.clone(),
    }))
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allows_any() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let mut router = Router::new().nest("/api", api::router()).with_state(state);
    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
