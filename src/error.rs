//! Errors shared by the catalog and environment modules

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("corrupt session value '{key}': {source}")]
    Session {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DashboardError {
    pub fn session(key: &str, source: serde_json::Error) -> Self {
        DashboardError::Session {
            key: key.to_string(),
            source,
        }
    }

    /// The remote error, if this came from the catalog or environment service
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            DashboardError::Api(e) => Some(e),
            DashboardError::Session { .. } => None,
        }
    }
}
