//! API error types and responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::ApiError as RemoteError;
use crate::error::DashboardError;
use crate::forms::FormError;
use crate::wizard::WizardError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found
    NotFound(String),
    /// Remote service refused the operation
    Forbidden(String),
    /// Request is out of step with the stored wizard state
    Conflict(String),
    /// Bad request
    BadRequest(String),
    /// Remote service failed or returned something unusable
    BadGateway(String),
    /// Internal server error
    InternalError(String),
}

/// Error response body
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_forbidden() {
            ApiError::Forbidden(err.to_string())
        } else {
            ApiError::BadGateway(err.to_string())
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Api(e) => e.into(),
            other @ DashboardError::Session { .. } => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Api(e) => e.into(),
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Api(e) => e.into(),
            WizardError::Form(e) => e.into(),
            e @ WizardError::NotStarted { .. } => ApiError::NotFound(e.to_string()),
            e @ WizardError::OutOfOrder { .. } => ApiError::Conflict(e.to_string()),
            e @ WizardError::UnknownStep { .. } => ApiError::BadRequest(e.to_string()),
            e @ WizardError::EmptyPlan { .. } => ApiError::BadGateway(e.to_string()),
            e @ WizardError::Session { .. } => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_not_found_response() {
        let error = ApiError::from(RemoteError::not_found("catalog", "package p1"));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.error, "not_found");
    }

    #[tokio::test]
    async fn test_remote_errors_map_to_status() {
        let forbidden = ApiError::from(RemoteError::forbidden("environments", "deploying"));
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);

        let http = ApiError::from(RemoteError::http("catalog", 500, "boom"));
        assert_eq!(http.into_response().status(), StatusCode::BAD_GATEWAY);

        let network = ApiError::from(RemoteError::network("catalog", "refused"));
        assert_eq!(network.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_wizard_errors_map_to_status() {
        let not_started = ApiError::from(WizardError::NotStarted {
            prefix: "wizard_e_a".to_string(),
        });
        assert_eq!(not_started.into_response().status(), StatusCode::NOT_FOUND);

        let out_of_order = ApiError::from(WizardError::OutOfOrder {
            expected: "a".to_string(),
            got: "b".to_string(),
        });
        assert_eq!(out_of_order.into_response().status(), StatusCode::CONFLICT);
    }
}
