//! API state management for the REST server.

use std::sync::Arc;

use crate::api::{ApiError, EnvironmentClient, InMemoryBackend, MuranoClient, PackageClient, SeedData};
use crate::catalog::RecentApps;
use crate::config::Config;
use crate::forms::{FormSchemaProvider, PackageFormProvider};
use crate::session::SessionRegistry;
use crate::wizard::WizardContext;

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub packages: Arc<dyn PackageClient>,
    pub environments: Arc<dyn EnvironmentClient>,
    pub forms: Arc<dyn FormSchemaProvider>,
    pub sessions: SessionRegistry,
}

impl ApiState {
    /// Create state over the given remote clients
    pub fn new(
        config: Config,
        packages: Arc<dyn PackageClient>,
        environments: Arc<dyn EnvironmentClient>,
    ) -> Self {
        let forms = Arc::new(PackageFormProvider::new(packages.clone()));
        Self {
            config: Arc::new(config),
            packages,
            environments,
            forms,
            sessions: SessionRegistry::new(),
        }
    }

    /// Create state talking to the configured Murano endpoint
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        let client = Arc::new(MuranoClient::from_config(&config.murano)?);
        Ok(Self::new(config, client.clone(), client))
    }

    /// Create state served from an in-memory backend
    pub fn offline(config: Config, seed: SeedData) -> Self {
        let backend = Arc::new(InMemoryBackend::new(seed));
        Self::new(config, backend.clone(), backend)
    }

    pub fn wizard_context(&self) -> WizardContext<'_> {
        WizardContext {
            packages: self.packages.as_ref(),
            environments: self.environments.as_ref(),
            forms: self.forms.as_ref(),
            redirects: &self.config.redirects,
        }
    }

    pub fn recent_apps(&self) -> RecentApps {
        RecentApps::new(self.config.catalog.recent_apps_limit)
    }
}
