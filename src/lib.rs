pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod services;

use axum::routing::{get, put};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: config::AppConfig,
}

/// Build the full API router. Shared by the binary and the integration
/// tests so both serve exactly the same surface.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/scan-results", put(routes::ingestion::ingest))
        .route("/refresh-log", get(routes::ingestion::refresh_log))
        .route("/applications", get(routes::applications::list))
        .route(
            "/applications/{project_id}",
            get(routes::applications::get),
        )
        .route(
            "/applications/{project_id}/commits",
            get(routes::applications::list_commits),
        )
        .route(
            "/applications/{project_id}/production-commit",
            get(routes::applications::production_commit),
        )
        .route(
            "/applications/{project_id}/production-totals",
            get(routes::applications::production_totals),
        )
        .route(
            "/applications/{project_id}/commits/{commit_id}/status",
            put(routes::applications::set_commit_status),
        )
        .route("/commits/{id}/totals", get(routes::commits::totals))
        .route("/commits/{id}/findings", get(routes::commits::findings));

    Router::new()
        .route("/health/live", get(routes::health::live))
        .route("/health/ready", get(routes::health::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
