//! Clients for the remote catalog and environment services
//!
//! This module provides:
//! - Client traits for the package catalog and the environment service
//! - A reqwest-backed client for the Murano-style REST API
//! - An in-memory backend used for offline mode and tests

pub mod error;
pub mod memory;
pub mod murano;

pub use error::ApiError;
pub use memory::{InMemoryBackend, SeedData};
pub use murano::MuranoClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Package type used when listing deployable applications
pub const APPLICATION_PACKAGE_TYPE: &str = "Application";

/// An application package from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub fully_qualified_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_package_type", rename = "type")]
    pub package_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub is_public: bool,
}

fn default_package_type() -> String {
    APPLICATION_PACKAGE_TYPE.to_string()
}

fn default_true() -> bool {
    true
}

/// Query filters for package listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageFilters {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// One page of a marker-paginated package listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackagePage {
    pub items: Vec<Package>,
    pub has_more: bool,
}

/// A deployable environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "ready".to_string()
}

/// Parameters for creating an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEnvironmentRequest {
    pub name: String,
}

/// An application instance attached to an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub attributes: Value,
}

impl Component {
    /// Build a component from the attribute document echoed back by the service
    pub fn from_attributes(attributes: Value) -> Option<Self> {
        let id = attributes.get("?")?.get("id")?.as_str()?.to_string();
        Some(Self { id, attributes })
    }
}

/// Remote package catalog
#[async_trait]
pub trait PackageClient: Send + Sync {
    /// Fetch a single package; fails with `ApiError::NotFound` if it was deleted
    async fn get(&self, app_id: &str) -> Result<Package, ApiError>;

    /// List the category names known to the catalog
    async fn categories(&self) -> Result<Vec<String>, ApiError>;

    /// Fetch one page of packages starting after `marker`
    async fn list(
        &self,
        filters: &PackageFilters,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<PackagePage, ApiError>;

    /// Raw logo image for a package, if it ships one
    async fn logo(&self, app_id: &str) -> Result<Option<Vec<u8>>, ApiError>;

    /// YAML UI definition for a package, if it ships one
    async fn ui_definition(&self, app_id: &str) -> Result<Option<String>, ApiError>;
}

/// Remote environment / orchestration service
#[async_trait]
pub trait EnvironmentClient: Send + Sync {
    /// List environments visible to the caller
    async fn list(&self) -> Result<Vec<Environment>, ApiError>;

    async fn create(&self, request: CreateEnvironmentRequest) -> Result<Environment, ApiError>;

    async fn delete(&self, environment_id: &str) -> Result<(), ApiError>;

    async fn get(&self, environment_id: &str) -> Result<Environment, ApiError>;

    /// Add an application instance to the environment.
    ///
    /// Fails with `ApiError::Forbidden` while the environment is deploying.
    async fn create_component(
        &self,
        environment_id: &str,
        attributes: Value,
    ) -> Result<Component, ApiError>;
}
