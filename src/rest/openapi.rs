//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::api::Package;
use crate::environments::EnvironmentSummary;
use crate::forms::{FieldDescriptor, FieldType, SkipCondition, StepDescriptor};
use crate::rest::dto::{
    AppDetailsResponse, CatalogPageResponse, EnvironmentsResponse, HealthResponse,
    QuickDeployResponse, SessionResponse, SubmitStepRequest, SwitchRequest, SwitchResponse,
};
use crate::rest::error::ErrorResponse;
use crate::wizard::{StepView, WizardFlags, WizardResponse, WizardState};

/// OpenAPI documentation for the catalog dashboard REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog Dashboard API",
        version = "0.1.0",
        description = "REST API for browsing the application catalog, selecting environments and deploying applications through wizards.",
        license(name = "MIT")
    ),
    paths(
        // Health and session endpoints
        crate::rest::routes::health::health,
        crate::rest::routes::health::create_session,
        crate::rest::routes::health::delete_session,
        // Catalog endpoints
        crate::rest::routes::catalog::list,
        crate::rest::routes::catalog::categories,
        crate::rest::routes::catalog::recent,
        crate::rest::routes::catalog::get_one,
        crate::rest::routes::catalog::logo,
        // Environment endpoints
        crate::rest::routes::environments::list,
        crate::rest::routes::environments::quick_create,
        crate::rest::routes::environments::switch,
        // Wizard endpoints
        crate::rest::routes::wizard::deploy,
        crate::rest::routes::wizard::current,
        crate::rest::routes::wizard::submit,
        crate::rest::routes::wizard::quick_deploy,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            SessionResponse,
            CatalogPageResponse,
            AppDetailsResponse,
            EnvironmentsResponse,
            EnvironmentSummary,
            SwitchResponse,
            QuickDeployResponse,
            WizardResponse,
            WizardState,
            StepView,
            StepDescriptor,
            FieldDescriptor,
            FieldType,
            SkipCondition,
            Package,
            ErrorResponse,
            // Request types
            SwitchRequest,
            SubmitStepRequest,
            WizardFlags,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Sessions", description = "Dashboard session management"),
        (name = "Catalog", description = "Application catalog browsing"),
        (name = "Environments", description = "Environment selection and quick creation"),
        (name = "Wizard", description = "Deployment wizards"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate the OpenAPI specification as a YAML string
    pub fn yaml() -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&Self::openapi())
    }
}
