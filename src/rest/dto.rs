//! Data Transfer Objects for the REST API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use crate::api::Package;
use crate::catalog::{AppDetails, CatalogIndex, CatalogQuery};
use crate::environments::{EnvironmentContext, EnvironmentSummary, SwitchOutcome};
use crate::wizard::WizardResponse;

// =============================================================================
// Health / session DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// A newly opened dashboard session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    /// Send back in the `X-Dashboard-Session` header
    pub session_id: String,
}

// =============================================================================
// Catalog DTOs
// =============================================================================

/// Query parameters of the catalog listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogParams {
    /// Category name; "All" or absent means no category filter
    pub category: Option<String>,
    /// Free-text search; takes precedence over the category
    pub search: Option<String>,
    /// Id of the last application of the previous page
    pub marker: Option<String>,
}

impl From<CatalogParams> for CatalogQuery {
    fn from(params: CatalogParams) -> Self {
        Self {
            category: params.category,
            search: params.search,
            marker: params.marker,
        }
    }
}

/// Environments offered to the user and the active one
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentsResponse {
    pub available: Vec<EnvironmentSummary>,
    pub current: Option<EnvironmentSummary>,
}

impl From<EnvironmentContext> for EnvironmentsResponse {
    fn from(ctx: EnvironmentContext) -> Self {
        Self {
            available: ctx.available,
            current: ctx.current,
        }
    }
}

/// One page of the catalog plus everything shown around it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogPageResponse {
    pub apps: Vec<Package>,
    pub has_more: bool,
    /// Marker for the next page, present when `has_more`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_category: Option<String>,
    /// Recently used applications, most recent first
    pub latest: Vec<Package>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub environments: EnvironmentsResponse,
}

impl From<CatalogIndex> for CatalogPageResponse {
    fn from(index: CatalogIndex) -> Self {
        Self {
            next_marker: index.page.next_marker,
            apps: index.page.apps,
            has_more: index.page.has_more,
            categories: index.categories,
            current_category: index.current_category,
            latest: index.latest,
            search: index.search,
            environments: index.environments.into(),
        }
    }
}

/// A single application with the session's environments
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppDetailsResponse {
    pub app: Package,
    pub environments: EnvironmentsResponse,
}

impl From<AppDetails> for AppDetailsResponse {
    fn from(details: AppDetails) -> Self {
        Self {
            app: details.app,
            environments: details.environments.into(),
        }
    }
}

// =============================================================================
// Environment DTOs
// =============================================================================

/// Request to change the active environment
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SwitchRequest {
    /// Where to go afterwards; ignored unless it points at this host
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Result of an environment switch
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SwitchResponse {
    pub redirect_to: String,
    /// The new active environment, absent if the id was unknown
    pub selected: Option<EnvironmentSummary>,
}

impl From<SwitchOutcome> for SwitchResponse {
    fn from(outcome: SwitchOutcome) -> Self {
        Self {
            redirect_to: outcome.redirect_to,
            selected: outcome.selected,
        }
    }
}

// =============================================================================
// Wizard DTOs
// =============================================================================

/// Answers of one wizard step
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitStepRequest {
    pub step: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub values: Map<String, Value>,
    /// Form field to fill with the new component instead of redirecting
    #[serde(default)]
    pub add_to_field: Option<String>,
}

/// Quick deploy result: the created environment and the opened wizard
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuickDeployResponse {
    pub environment: EnvironmentSummary,
    pub wizard: WizardResponse,
}
