//! Multi-step deployment wizard.
//!
//! A wizard walks the user through the form steps of one application for one
//! environment and finally creates a component in that environment. Progress
//! lives in the session under the wizard's key; the step list is recomputed
//! from the application's form schema on every request (see [`WizardPlan`]).

pub mod deploy;
pub mod engine;
pub mod plan;
pub mod state;

pub use deploy::{deploy, quick_deploy};
pub use engine::{current, start, submit, StepView, WizardContext, WizardResponse};
pub use plan::{workflow_management_step, WizardPlan, STAY_AT_CATALOG_FIELD, WORKFLOW_MANAGEMENT_STEP};
pub use state::{clear_app_forms, WizardFlags, WizardKey, WizardSession, WizardState};

use thiserror::Error;

use crate::api::ApiError;
use crate::error::DashboardError;
use crate::forms::FormError;

/// Key under `?` where the dashboard keeps its own component metadata
pub const DASHBOARD_ATTRS_KEY: &str = "_26411a1861294160833743e45d0eaad9";

pub const DEPLOYING_MESSAGE: &str =
    "Sorry, you can't add application right now. The environment is deploying.";

pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, you can't add application right now.";

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("no wizard in progress for {prefix}")]
    NotStarted { prefix: String },

    #[error("unknown wizard step '{step}'")]
    UnknownStep { step: String },

    #[error("expected step '{expected}', got '{got}'")]
    OutOfOrder { expected: String, got: String },

    #[error("application {app_id} has no steps to show")]
    EmptyPlan { app_id: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(FormError),

    #[error("corrupt session value '{key}': {source}")]
    Session {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl WizardError {
    /// The remote error behind this failure, if any
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            WizardError::Api(e) | WizardError::Form(FormError::Api(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<FormError> for WizardError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Api(e) => WizardError::Api(e),
            other => WizardError::Form(other),
        }
    }
}

impl From<DashboardError> for WizardError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Api(e) => WizardError::Api(e),
            DashboardError::Session { key, source } => WizardError::Session { key, source },
        }
    }
}

#[cfg(test)]
mod tests;
