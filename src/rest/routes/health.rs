//! Health check and session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::rest::dto::{HealthResponse, SessionResponse};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Open a new dashboard session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    responses(
        (status = 200, description = "Session opened", body = SessionResponse)
    )
)]
pub async fn create_session(State(state): State<ApiState>) -> Json<SessionResponse> {
    let session_id = state.sessions.create().await;
    tracing::debug!("Opened session {}", session_id);
    Json(SessionResponse { session_id })
}

/// Close a dashboard session and drop everything stored in it
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{session_id}",
    tag = "Sessions",
    params(
        ("session_id" = String, Path, description = "Session id")
    ),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn delete_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(&session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("unknown session {}", session_id)))?;
    tracing::debug!("Closed session {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SeedData;
    use crate::config::Config;

    #[tokio::test]
    async fn test_health() {
        let resp = health().await;
        assert_eq!(resp.status, "ok");
        assert!(!resp.version.is_empty());
    }

    #[tokio::test]
    async fn test_create_session() {
        let state = ApiState::offline(Config::default(), SeedData::default());

        let resp = create_session(State(state.clone())).await;
        assert!(!resp.session_id.is_empty());
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = ApiState::offline(Config::default(), SeedData::default());
        let session_id = state.sessions.create().await;

        let status = delete_session(State(state.clone()), Path(session_id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty().await);

        let again = delete_session(State(state), Path(session_id)).await;
        assert!(matches!(again, Err(ApiError::NotFound(_))));
    }
}
