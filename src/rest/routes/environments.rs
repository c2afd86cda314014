//! Environment selection endpoints.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};

use crate::environments::{self, EnvironmentSummary};
use crate::rest::dto::{EnvironmentsResponse, SwitchRequest, SwitchResponse};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::session::{load_session, SessionId};
use crate::rest::state::ApiState;

/// Host the request was sent to, as the client sees it
fn request_host(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// List environments and the session's active one
#[utoipa::path(
    get,
    path = "/api/v1/environments",
    tag = "Environments",
    params(
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    responses(
        (status = 200, description = "Available and current environments", body = EnvironmentsResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
) -> Result<Json<EnvironmentsResponse>, ApiError> {
    let mut session = load_session(&state.sessions, &session_id).await?;
    let context = environments::context(&mut session, state.environments.as_ref()).await?;
    Ok(Json(context.into()))
}

/// Create the next `quick-env-<N>` environment
#[utoipa::path(
    post,
    path = "/api/v1/environments/quick",
    tag = "Environments",
    responses(
        (status = 200, description = "Environment created", body = EnvironmentSummary),
        (status = 502, description = "Environment service failed", body = ErrorResponse)
    )
)]
pub async fn quick_create(
    State(state): State<ApiState>,
) -> Result<Json<EnvironmentSummary>, ApiError> {
    let environment = environments::quick_create(state.environments.as_ref()).await?;
    Ok(Json(environment.into()))
}

/// Make an environment the session's active one
#[utoipa::path(
    post,
    path = "/api/v1/environments/{environment_id}/switch",
    tag = "Environments",
    params(
        ("environment_id" = String, Path, description = "Environment id"),
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    request_body = SwitchRequest,
    responses(
        (status = 200, description = "Where to go next", body = SwitchResponse)
    )
)]
pub async fn switch(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Path(environment_id): Path<String>,
    headers: HeaderMap,
    request: Option<Json<SwitchRequest>>,
) -> Result<Json<SwitchResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let mut session = load_session(&state.sessions, &session_id).await?;

    let result = environments::switch(
        &mut session,
        state.environments.as_ref(),
        &environment_id,
        request.redirect_to.as_deref(),
        request_host(&headers),
        &state.config.redirects.default_redirect,
    )
    .await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?.into()))
}
