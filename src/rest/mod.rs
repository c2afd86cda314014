//! REST API for the catalog dashboard.
//!
//! Provides HTTP endpoints for browsing the catalog, choosing the active
//! environment and driving deployment wizards. Every session-scoped endpoint
//! selects its session with the `X-Dashboard-Session` header.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod session;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and session endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/sessions", post(routes::health::create_session))
        .route(
            "/api/v1/sessions/:session_id",
            delete(routes::health::delete_session),
        )
        // Catalog endpoints
        .route("/api/v1/catalog/apps", get(routes::catalog::list))
        .route(
            "/api/v1/catalog/categories",
            get(routes::catalog::categories),
        )
        .route("/api/v1/catalog/recent", get(routes::catalog::recent))
        .route("/api/v1/catalog/apps/:app_id", get(routes::catalog::get_one))
        .route(
            "/api/v1/catalog/apps/:app_id/logo",
            get(routes::catalog::logo),
        )
        // Environment endpoints
        .route("/api/v1/environments", get(routes::environments::list))
        .route(
            "/api/v1/environments/quick",
            post(routes::environments::quick_create),
        )
        .route(
            "/api/v1/environments/:environment_id/switch",
            post(routes::environments::switch),
        )
        // Wizard endpoints
        .route(
            "/api/v1/environments/:environment_id/apps/:app_id/deploy",
            post(routes::wizard::deploy),
        )
        .route(
            "/api/v1/environments/:environment_id/apps/:app_id/wizard",
            get(routes::wizard::current).post(routes::wizard::submit),
        )
        .route(
            "/api/v1/apps/:app_id/quick-deploy",
            post(routes::wizard::quick_deploy),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server
pub async fn serve(state: ApiState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                state.config.server.host, state.config.server.port
            )
        })?;
    let app = build_router(state);

    tracing::info!("REST API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
