//! Murano-style REST client for the catalog and environment services

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{
    ApiError, Component, CreateEnvironmentRequest, Environment, EnvironmentClient, Package,
    PackageClient, PackageFilters, PackagePage,
};
use crate::config::MuranoConfig;

const CATALOG: &str = "catalog";
const ENVIRONMENTS: &str = "environments";

/// Header carrying the configuration session for environment edits
const SESSION_HEADER: &str = "X-Configuration-Session";

/// HTTP client for a Murano-compatible application catalog API
#[derive(Clone)]
pub struct MuranoClient {
    endpoint: Url,
    token: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct CategoriesBody {
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct PackagesBody {
    packages: Vec<Package>,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Deserialize)]
struct EnvironmentsBody {
    environments: Vec<Environment>,
}

#[derive(Deserialize)]
struct ConfigurationSession {
    id: String,
}

impl MuranoClient {
    /// Create a client for the given API endpoint (e.g. "http://murano:8082")
    pub fn new(endpoint: Url, token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            endpoint,
            token,
            client,
        }
    }

    /// Create from the `[murano]` config section
    pub fn from_config(config: &MuranoConfig) -> Result<Self, ApiError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
            .and_then(|endpoint| Url::parse(endpoint).ok())
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::not_configured(CATALOG))?;

        Ok(Self::new(
            endpoint,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// `<endpoint>/v1/<segments...>`, each segment percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("X-Auth-Token", token),
            None => builder,
        }
    }

    async fn send(
        &self,
        service: &str,
        resource: &str,
        builder: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| ApiError::network(service, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::not_found(service, resource),
            StatusCode::FORBIDDEN => ApiError::forbidden(service, body),
            _ => ApiError::http(service, status.as_u16(), body),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(segments);
        debug!("{} GET: {}", service, url);

        let response = self
            .send(service, url.path(), self.client.get(url.clone()).query(query))
            .await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::parse(service, e.to_string()))
    }

    /// GET that maps 404 to `None` instead of an error
    async fn get_optional_bytes(&self, segments: &[&str]) -> Result<Option<Vec<u8>>, ApiError> {
        let url = self.url(segments);
        debug!("{} GET: {}", CATALOG, url);

        match self
            .send(CATALOG, url.path(), self.client.get(url.clone()))
            .await
        {
            Ok(response) => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ApiError::network(CATALOG, e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open a configuration session; environment edits must be made inside one
    async fn configure(&self, environment_id: &str) -> Result<String, ApiError> {
        let url = self.url(&["environments", environment_id, "configure"]);
        debug!("{} POST: {}", ENVIRONMENTS, url);

        let response = self
            .send(ENVIRONMENTS, url.path(), self.client.post(url.clone()))
            .await?;
        let session: ConfigurationSession = response
            .json()
            .await
            .map_err(|e| ApiError::parse(ENVIRONMENTS, e.to_string()))?;
        Ok(session.id)
    }
}

#[async_trait]
impl PackageClient for MuranoClient {
    async fn get(&self, app_id: &str) -> Result<Package, ApiError> {
        self.get_json(CATALOG, &["catalog", "packages", app_id], &[])
            .await
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let body: CategoriesBody = self
            .get_json(CATALOG, &["catalog", "packages", "categories"], &[])
            .await?;
        Ok(body.categories)
    }

    async fn list(
        &self,
        filters: &PackageFilters,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<PackagePage, ApiError> {
        let mut query: Vec<(&str, String)> = vec![("limit", page_size.to_string())];
        if let Some(package_type) = &filters.package_type {
            query.push(("type", package_type.clone()));
        }
        if let Some(category) = &filters.category {
            query.push(("category", category.clone()));
        }
        if let Some(search) = &filters.search {
            query.push(("search", search.clone()));
        }
        if let Some(marker) = marker {
            query.push(("marker", marker.to_string()));
        }

        let body: PackagesBody = self
            .get_json(CATALOG, &["catalog", "packages"], &query)
            .await?;
        Ok(PackagePage {
            items: body.packages,
            has_more: body.next_marker.is_some(),
        })
    }

    async fn logo(&self, app_id: &str) -> Result<Option<Vec<u8>>, ApiError> {
        self.get_optional_bytes(&["catalog", "packages", app_id, "logo"])
            .await
    }

    async fn ui_definition(&self, app_id: &str) -> Result<Option<String>, ApiError> {
        let bytes = self
            .get_optional_bytes(&["catalog", "packages", app_id, "ui"])
            .await?;
        bytes
            .map(|b| String::from_utf8(b).map_err(|e| ApiError::parse(CATALOG, e.to_string())))
            .transpose()
    }
}

#[async_trait]
impl EnvironmentClient for MuranoClient {
    async fn list(&self) -> Result<Vec<Environment>, ApiError> {
        let body: EnvironmentsBody = self.get_json(ENVIRONMENTS, &["environments"], &[]).await?;
        Ok(body.environments)
    }

    async fn create(&self, request: CreateEnvironmentRequest) -> Result<Environment, ApiError> {
        let url = self.url(&["environments"]);
        debug!("{} POST: {}", ENVIRONMENTS, url);

        let response = self
            .send(
                ENVIRONMENTS,
                url.path(),
                self.client.post(url.clone()).json(&request),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::parse(ENVIRONMENTS, e.to_string()))
    }

    async fn delete(&self, environment_id: &str) -> Result<(), ApiError> {
        let url = self.url(&["environments", environment_id]);
        debug!("{} DELETE: {}", ENVIRONMENTS, url);

        self.send(ENVIRONMENTS, url.path(), self.client.delete(url.clone()))
            .await?;
        Ok(())
    }

    async fn get(&self, environment_id: &str) -> Result<Environment, ApiError> {
        self.get_json(ENVIRONMENTS, &["environments", environment_id], &[])
            .await
    }

    async fn create_component(
        &self,
        environment_id: &str,
        attributes: Value,
    ) -> Result<Component, ApiError> {
        let session_id = self.configure(environment_id).await?;
        let url = self.url(&["environments", environment_id, "services"]);
        debug!("{} POST: {} (session {})", ENVIRONMENTS, url, session_id);

        let response = self
            .send(
                ENVIRONMENTS,
                url.path(),
                self.client
                    .post(url.clone())
                    .header(SESSION_HEADER, &session_id)
                    .json(&attributes),
            )
            .await?;
        let echoed: Value = response
            .json()
            .await
            .map_err(|e| ApiError::parse(ENVIRONMENTS, e.to_string()))?;

        Component::from_attributes(echoed)
            .ok_or_else(|| ApiError::parse(ENVIRONMENTS, "component has no '?.id'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> MuranoClient {
        MuranoClient::new(Url::parse(endpoint).unwrap(), None, Duration::from_secs(5))
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        assert_eq!(
            client("http://murano:8082/").url(&["environments"]).as_str(),
            "http://murano:8082/v1/environments"
        );
        assert_eq!(
            client("http://murano:8082/api/").url(&["environments"]).as_str(),
            "http://murano:8082/api/v1/environments"
        );
    }

    #[test]
    fn test_url_escapes_ids() {
        let url = client("http://murano:8082").url(&["catalog", "packages", "a/b?c#d", "logo"]);
        assert_eq!(url.path(), "/v1/catalog/packages/a%2Fb%3Fc%23d/logo");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = MuranoConfig {
            endpoint: None,
            token: None,
            timeout_secs: 30,
        };
        let err = MuranoClient::from_config(&config).err().unwrap();
        assert!(matches!(err, ApiError::NotConfigured { .. }));

        let config = MuranoConfig {
            endpoint: Some("mailto:ops@example.com".to_string()),
            token: None,
            timeout_secs: 30,
        };
        assert!(MuranoClient::from_config(&config).is_err());

        let config = MuranoConfig {
            endpoint: Some("http://localhost:8082".to_string()),
            token: Some("secret".to_string()),
            timeout_secs: 30,
        };
        assert!(MuranoClient::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = MuranoClient::new(
            Url::parse("http://127.0.0.1:1").unwrap(),
            None,
            Duration::from_millis(200),
        );
        let err = PackageClient::get(&client, "pkg").await.unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }));
    }
}
