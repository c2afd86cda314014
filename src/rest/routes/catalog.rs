//! Catalog browsing endpoints.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::api::Package;
use crate::catalog::{self, CatalogQuery, Logo};
use crate::rest::dto::{AppDetailsResponse, CatalogPageResponse, CatalogParams};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::session::{load_session, SessionId};
use crate::rest::state::ApiState;

/// List applications with filters and marker pagination
#[utoipa::path(
    get,
    path = "/api/v1/catalog/apps",
    tag = "Catalog",
    params(
        ("X-Dashboard-Session" = String, Header, description = "Session id"),
        CatalogParams
    ),
    responses(
        (status = 200, description = "One catalog page", body = CatalogPageResponse),
        (status = 502, description = "Catalog service failed", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Query(params): Query<CatalogParams>,
) -> Result<Json<CatalogPageResponse>, ApiError> {
    let query = CatalogQuery::from(params);
    let mut session = load_session(&state.sessions, &session_id).await?;

    let result = catalog::index(
        &mut session,
        state.packages.as_ref(),
        state.environments.as_ref(),
        &state.config.catalog,
        &query,
    )
    .await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?.into()))
}

/// List categories, "All" first
#[utoipa::path(
    get,
    path = "/api/v1/catalog/categories",
    tag = "Catalog",
    responses(
        (status = 200, description = "Category names", body = Vec<String>)
    )
)]
pub async fn categories(State(state): State<ApiState>) -> Result<Json<Vec<String>>, ApiError> {
    let categories = catalog::categories(
        state.packages.as_ref(),
        &state.config.catalog.all_category_name,
    )
    .await?;
    Ok(Json(categories))
}

/// Recently used applications of this session
#[utoipa::path(
    get,
    path = "/api/v1/catalog/recent",
    tag = "Catalog",
    params(
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    responses(
        (status = 200, description = "Applications, most recent first", body = Vec<Package>)
    )
)]
pub async fn recent(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
) -> Result<Json<Vec<Package>>, ApiError> {
    let mut session = load_session(&state.sessions, &session_id).await?;
    let result = state
        .recent_apps()
        .list_valid(&mut session, state.packages.as_ref())
        .await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?))
}

/// Get a single application
#[utoipa::path(
    get,
    path = "/api/v1/catalog/apps/{app_id}",
    tag = "Catalog",
    params(
        ("app_id" = String, Path, description = "Application package id"),
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    responses(
        (status = 200, description = "Application details", body = AppDetailsResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Path(app_id): Path<String>,
) -> Result<Json<AppDetailsResponse>, ApiError> {
    let mut session = load_session(&state.sessions, &session_id).await?;
    let result = catalog::app_details(
        &mut session,
        state.packages.as_ref(),
        state.environments.as_ref(),
        &app_id,
    )
    .await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?.into()))
}

/// Application logo, or a redirect to the universal icon
#[utoipa::path(
    get,
    path = "/api/v1/catalog/apps/{app_id}/logo",
    tag = "Catalog",
    params(
        ("app_id" = String, Path, description = "Application package id")
    ),
    responses(
        (status = 200, description = "PNG logo", content_type = "image/png"),
        (status = 307, description = "Application has no logo")
    )
)]
pub async fn logo(
    State(state): State<ApiState>,
    Path(app_id): Path<String>,
) -> Result<Response, ApiError> {
    let logo = catalog::app_logo(
        state.packages.as_ref(),
        &app_id,
        &state.config.redirects.fallback_logo,
    )
    .await?;

    Ok(match logo {
        Logo::Image(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Logo::Fallback(url) => Redirect::temporary(&url).into_response(),
    })
}
