//! Session selection by request header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::rest::error::ApiError;
use crate::session::{MemorySession, SessionRegistry};

/// Header carrying the dashboard session id
pub const SESSION_HEADER: &str = "x-dashboard-session";

/// Session id taken from the `X-Dashboard-Session` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| SessionId(id.to_string()))
            .ok_or_else(|| {
                ApiError::BadRequest("missing X-Dashboard-Session header".to_string())
            })
    }
}

/// Snapshot of a session issued by `POST /sessions`; other ids are not found
pub async fn load_session(sessions: &SessionRegistry, id: &str) -> Result<MemorySession, ApiError> {
    sessions
        .load(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("unknown session {}", id)))
}
