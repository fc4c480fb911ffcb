//! Lakegate server library logic.

pub mod api;
pub mod config;

use axum::{routing::get, Extension, Router};
use lakegate_db::LakeSettings;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Application state shared across all request handlers.
///
/// Holds only settings; no connection outlives a single request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Where and how each request opens its lake connection.
    pub lake: LakeSettings,
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/query-ducklake", get(api::query_handler))
        .route("/health", get(api::health_handler))
        .route("/tables", get(api::tables_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

/// Installs the global tracing subscriber from logging configuration.
pub fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
