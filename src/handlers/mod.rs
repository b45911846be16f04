//! HTTP request handlers for the chatrelay API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::provider::{CompletionProvider, OpenAiCompatibleProvider};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod health;
pub mod index;
pub mod metrics;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers. Nothing in
/// here is mutated per request apart from the Prometheus counters.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    provider: Arc<dyn CompletionProvider>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Build state with the HTTP provider described by `config.provider`
    pub fn new(config: Config) -> AppResult<Self> {
        let provider = OpenAiCompatibleProvider::new(&config.provider).map_err(|e| {
            AppError::Config(format!(
                "failed to build {} client: {}",
                config.provider.kind(),
                e
            ))
        })?;
        Self::with_provider(config, Arc::new(provider))
    }

    /// Build state around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn CompletionProvider>) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("failed to register metrics: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            provider,
            metrics: Arc::new(metrics),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the completion provider
    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::handler))
        .route("/chat", post(chat::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
