//! Error types for calls against the remote catalog and environment services

use thiserror::Error;

/// Errors that can occur when talking to the remote catalog/environment API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 404 - the referenced package or environment no longer exists
    #[error("{service}: not found - {resource}")]
    NotFound { service: String, resource: String },

    /// 403 - the environment is busy (deploying) or the caller lacks permissions
    #[error("{service}: forbidden - {message}")]
    Forbidden { service: String, message: String },

    /// Other non-success HTTP statuses
    #[error("{service}: HTTP {status} - {message}")]
    Http {
        service: String,
        status: u16,
        message: String,
    },

    /// Network or timeout error
    #[error("{service}: network error - {message}")]
    Network { service: String, message: String },

    /// Response body could not be decoded
    #[error("{service}: invalid response - {message}")]
    Parse { service: String, message: String },

    /// No endpoint configured for the service
    #[error("{service}: not configured (no endpoint)")]
    NotConfigured { service: String },
}

impl ApiError {
    /// True for the "no longer exists" condition that read paths may swallow
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// True when the environment refused the change (usually: it is deploying)
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Forbidden { .. })
    }

    /// Get the service name for this error
    pub fn service_name(&self) -> &str {
        match self {
            ApiError::NotFound { service, .. }
            | ApiError::Forbidden { service, .. }
            | ApiError::Http { service, .. }
            | ApiError::Network { service, .. }
            | ApiError::Parse { service, .. }
            | ApiError::NotConfigured { service } => service,
        }
    }

    pub fn not_found(service: impl Into<String>, resource: impl Into<String>) -> Self {
        ApiError::NotFound {
            service: service.into(),
            resource: resource.into(),
        }
    }

    pub fn forbidden(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn http(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::Http {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    pub fn network(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn parse(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Parse {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn not_configured(service: impl Into<String>) -> Self {
        ApiError::NotConfigured {
            service: service.into(),
        }
    }
}
