// src/api/mod.rs — HTTP surface for the story app
//
// These routes replace the original per-function serverless entry points:
// each one proxies a generation call and feeds the analytics tracker.

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::analytics::AnalyticsTracker;
use crate::infra::config::ServerConfig;
use crate::provider::StoryProvider;
use crate::store::profiles::ProfileStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub tracker: Arc<AnalyticsTracker>,
    pub provider: Arc<dyn StoryProvider>,
    pub profiles: Arc<ProfileStore>,
}

/// Build the axum router with all routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/generate/titles", post(handlers::generate_titles))
        .route("/api/generate/text", post(handlers::generate_text))
        .route("/api/generate/image", post(handlers::generate_image))
        .route("/api/stories/complete", post(handlers::complete_story))
        .route("/api/users/{id}", get(handlers::get_user))
        .route("/api/kids/{id}", get(handlers::get_kid))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server (blocking until shutdown).
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
