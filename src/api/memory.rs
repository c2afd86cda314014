//! In-memory catalog and environment backend
//!
//! Serves offline mode (`serve --offline fixture.yaml`) and doubles as the
//! remote service in tests. Environments whose status is `deploying` reject
//! new components with `ApiError::Forbidden`, like the real service does.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    ApiError, Component, CreateEnvironmentRequest, Environment, EnvironmentClient, Package,
    PackageClient, PackageFilters, PackagePage,
};

const CATALOG: &str = "catalog";
const ENVIRONMENTS: &str = "environments";

/// Status that makes an environment refuse new components
pub const DEPLOYING_STATUS: &str = "deploying";

/// Fixture format for seeding the in-memory backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    /// UI definitions (YAML text) keyed by package id
    #[serde(default)]
    pub ui_definitions: HashMap<String, String>,
}

impl SeedData {
    /// Load a YAML fixture file
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

#[derive(Default)]
struct Inner {
    seed: SeedData,
    logos: HashMap<String, Vec<u8>>,
    components: HashMap<String, Vec<Component>>,
    component_failure: Option<ApiError>,
    create_failure: Option<ApiError>,
    deleted_environments: Vec<String>,
}

/// Shared in-memory backend; clones share the same data
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    pub fn new(seed: SeedData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                seed,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn add_package(&self, package: Package) {
        self.lock().seed.packages.push(package);
    }

    pub fn remove_package(&self, app_id: &str) {
        self.lock().seed.packages.retain(|p| p.id != app_id);
    }

    pub fn set_logo(&self, app_id: &str, bytes: Vec<u8>) {
        self.lock().logos.insert(app_id.to_string(), bytes);
    }

    pub fn set_ui_definition(&self, app_id: &str, yaml: impl Into<String>) {
        self.lock()
            .seed
            .ui_definitions
            .insert(app_id.to_string(), yaml.into());
    }

    pub fn add_environment(&self, environment: Environment) {
        self.lock().seed.environments.push(environment);
    }

    pub fn set_environment_status(&self, environment_id: &str, status: &str) {
        let mut inner = self.lock();
        if let Some(env) = inner
            .seed
            .environments
            .iter_mut()
            .find(|e| e.id == environment_id)
        {
            env.status = status.to_string();
        }
    }

    /// Make every following `create_component` call fail with `error`
    pub fn fail_components_with(&self, error: Option<ApiError>) {
        self.lock().component_failure = error;
    }

    /// Make every following environment `create` call fail with `error`
    pub fn fail_environment_create_with(&self, error: Option<ApiError>) {
        self.lock().create_failure = error;
    }

    pub fn environments(&self) -> Vec<Environment> {
        self.lock().seed.environments.clone()
    }

    pub fn components(&self, environment_id: &str) -> Vec<Component> {
        self.lock()
            .components
            .get(environment_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Ids of environments removed through `delete`, in call order
    pub fn deleted_environments(&self) -> Vec<String> {
        self.lock().deleted_environments.clone()
    }
}

fn matches_filters(package: &Package, filters: &PackageFilters) -> bool {
    if let Some(package_type) = &filters.package_type {
        if &package.package_type != package_type {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if !package.categories.iter().any(|c| c == category) {
            return false;
        }
    }
    if let Some(search) = &filters.search {
        let needle = search.to_lowercase();
        let haystacks = [
            &package.name,
            &package.fully_qualified_name,
            &package.description,
        ];
        let hit = haystacks.iter().any(|h| h.to_lowercase().contains(&needle))
            || package.tags.iter().any(|t| t.to_lowercase() == needle);
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl PackageClient for InMemoryBackend {
    async fn get(&self, app_id: &str) -> Result<Package, ApiError> {
        self.lock()
            .seed
            .packages
            .iter()
            .find(|p| p.id == app_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(CATALOG, format!("package {}", app_id)))
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.lock().seed.categories.clone())
    }

    async fn list(
        &self,
        filters: &PackageFilters,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<PackagePage, ApiError> {
        let inner = self.lock();
        let matching: Vec<&Package> = inner
            .seed
            .packages
            .iter()
            .filter(|p| matches_filters(p, filters))
            .collect();

        let start = match marker {
            Some(marker) => matching
                .iter()
                .position(|p| p.id == marker)
                .map(|i| i + 1)
                .ok_or_else(|| ApiError::http(CATALOG, 400, format!("unknown marker {}", marker)))?,
            None => 0,
        };

        let rest = &matching[start..];
        let items: Vec<Package> = rest.iter().take(page_size).map(|p| (*p).clone()).collect();
        Ok(PackagePage {
            has_more: rest.len() > page_size,
            items,
        })
    }

    async fn logo(&self, app_id: &str) -> Result<Option<Vec<u8>>, ApiError> {
        Ok(self.lock().logos.get(app_id).cloned())
    }

    async fn ui_definition(&self, app_id: &str) -> Result<Option<String>, ApiError> {
        Ok(self.lock().seed.ui_definitions.get(app_id).cloned())
    }
}

#[async_trait]
impl EnvironmentClient for InMemoryBackend {
    async fn list(&self) -> Result<Vec<Environment>, ApiError> {
        Ok(self.lock().seed.environments.clone())
    }

    async fn create(&self, request: CreateEnvironmentRequest) -> Result<Environment, ApiError> {
        let mut inner = self.lock();
        if let Some(error) = inner.create_failure.clone() {
            return Err(error);
        }
        if inner
            .seed
            .environments
            .iter()
            .any(|e| e.name == request.name)
        {
            return Err(ApiError::http(
                ENVIRONMENTS,
                409,
                format!("environment with name {} already exists", request.name),
            ));
        }

        let environment = Environment {
            id: Uuid::new_v4().simple().to_string(),
            name: request.name,
            status: "ready".to_string(),
        };
        inner.seed.environments.push(environment.clone());
        Ok(environment)
    }

    async fn delete(&self, environment_id: &str) -> Result<(), ApiError> {
        let mut inner = self.lock();
        let before = inner.seed.environments.len();
        inner.seed.environments.retain(|e| e.id != environment_id);
        if inner.seed.environments.len() == before {
            return Err(ApiError::not_found(
                ENVIRONMENTS,
                format!("environment {}", environment_id),
            ));
        }
        inner.components.remove(environment_id);
        inner.deleted_environments.push(environment_id.to_string());
        Ok(())
    }

    async fn get(&self, environment_id: &str) -> Result<Environment, ApiError> {
        self.lock()
            .seed
            .environments
            .iter()
            .find(|e| e.id == environment_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::not_found(ENVIRONMENTS, format!("environment {}", environment_id))
            })
    }

    async fn create_component(
        &self,
        environment_id: &str,
        attributes: Value,
    ) -> Result<Component, ApiError> {
        let mut inner = self.lock();
        if let Some(error) = inner.component_failure.clone() {
            return Err(error);
        }

        let environment = inner
            .seed
            .environments
            .iter()
            .find(|e| e.id == environment_id)
            .ok_or_else(|| {
                ApiError::not_found(ENVIRONMENTS, format!("environment {}", environment_id))
            })?;
        if environment.status == DEPLOYING_STATUS {
            return Err(ApiError::forbidden(
                ENVIRONMENTS,
                format!("environment {} is deploying", environment_id),
            ));
        }

        let component = Component::from_attributes(attributes)
            .ok_or_else(|| ApiError::http(ENVIRONMENTS, 400, "attributes have no '?.id'"))?;
        inner
            .components
            .entry(environment_id.to_string())
            .or_default()
            .push(component.clone());
        Ok(component)
    }
}
