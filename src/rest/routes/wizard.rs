//! Deployment wizard endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::rest::dto::{QuickDeployResponse, SubmitStepRequest};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::session::{load_session, SessionId};
use crate::rest::state::ApiState;
use crate::wizard::{self, WizardFlags, WizardKey, WizardResponse};

/// Open a new wizard adding an application to an environment
#[utoipa::path(
    post,
    path = "/api/v1/environments/{environment_id}/apps/{app_id}/deploy",
    tag = "Wizard",
    params(
        ("environment_id" = String, Path, description = "Environment id"),
        ("app_id" = String, Path, description = "Application package id"),
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    request_body(content = WizardFlags, description = "Wizard options, all off when omitted"),
    responses(
        (status = 200, description = "First wizard step", body = WizardResponse),
        (status = 404, description = "Application or environment not found", body = ErrorResponse)
    )
)]
pub async fn deploy(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Path((environment_id, app_id)): Path<(String, String)>,
    flags: Option<Json<WizardFlags>>,
) -> Result<Json<WizardResponse>, ApiError> {
    let flags = flags.map(|Json(f)| f).unwrap_or_default();
    let mut session = load_session(&state.sessions, &session_id).await?;

    let result = wizard::deploy(
        state.wizard_context(),
        &mut session,
        state.recent_apps(),
        &environment_id,
        &app_id,
        flags,
    )
    .await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?))
}

/// Show the wizard's current step
#[utoipa::path(
    get,
    path = "/api/v1/environments/{environment_id}/apps/{app_id}/wizard",
    tag = "Wizard",
    params(
        ("environment_id" = String, Path, description = "Environment id"),
        ("app_id" = String, Path, description = "Application package id"),
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    responses(
        (status = 200, description = "Current wizard step", body = WizardResponse),
        (status = 404, description = "No wizard in progress", body = ErrorResponse)
    )
)]
pub async fn current(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Path((environment_id, app_id)): Path<(String, String)>,
) -> Result<Json<WizardResponse>, ApiError> {
    let key = WizardKey::new(environment_id, app_id);
    let mut session = load_session(&state.sessions, &session_id).await?;

    let result = wizard::current(state.wizard_context(), &mut session, &key).await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?))
}

/// Submit the answers of the current step
#[utoipa::path(
    post,
    path = "/api/v1/environments/{environment_id}/apps/{app_id}/wizard",
    tag = "Wizard",
    params(
        ("environment_id" = String, Path, description = "Environment id"),
        ("app_id" = String, Path, description = "Application package id"),
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    request_body = SubmitStepRequest,
    responses(
        (status = 200, description = "Next step, or the outcome of the last one", body = WizardResponse),
        (status = 404, description = "No wizard in progress", body = ErrorResponse),
        (status = 409, description = "Step is not the current one", body = ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Path((environment_id, app_id)): Path<(String, String)>,
    Json(request): Json<SubmitStepRequest>,
) -> Result<Json<WizardResponse>, ApiError> {
    let key = WizardKey::new(environment_id, app_id);
    let mut session = load_session(&state.sessions, &session_id).await?;

    let result = wizard::submit(
        state.wizard_context(),
        &mut session,
        &key,
        &request.step,
        request.values,
        request.add_to_field.as_deref(),
    )
    .await;
    state.sessions.store(&session_id, session).await;

    Ok(Json(result?))
}

/// Create a quick environment and open a wizard for the application in it
#[utoipa::path(
    post,
    path = "/api/v1/apps/{app_id}/quick-deploy",
    tag = "Wizard",
    params(
        ("app_id" = String, Path, description = "Application package id"),
        ("X-Dashboard-Session" = String, Header, description = "Session id")
    ),
    responses(
        (status = 200, description = "Created environment and first wizard step", body = QuickDeployResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
pub async fn quick_deploy(
    State(state): State<ApiState>,
    SessionId(session_id): SessionId,
    Path(app_id): Path<String>,
) -> Result<Json<QuickDeployResponse>, ApiError> {
    let mut session = load_session(&state.sessions, &session_id).await?;

    let result = wizard::quick_deploy(
        state.wizard_context(),
        &mut session,
        state.recent_apps(),
        &app_id,
    )
    .await;
    state.sessions.store(&session_id, session).await;

    let (environment, wizard) = result?;
    Ok(Json(QuickDeployResponse {
        environment: environment.into(),
        wizard,
    }))
}
