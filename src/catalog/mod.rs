//! Application catalog: listing, details, logos and recently used apps

pub mod listing;
pub mod recent;

pub use listing::{build_filters, categories, current_category, list_applications, CatalogPage, CatalogQuery};
pub use recent::{RecentApps, RecentQueue, LATEST_APPS_KEY, LATEST_APPS_QUEUE_LIMIT};

use crate::api::{ApiError, EnvironmentClient, Package, PackageClient};
use crate::config::CatalogConfig;
use crate::environments::{self, EnvironmentContext};
use crate::error::DashboardError;
use crate::session::SessionStore;

/// Everything the catalog index page shows
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    pub page: CatalogPage,
    pub categories: Vec<String>,
    pub current_category: Option<String>,
    pub latest: Vec<Package>,
    pub search: Option<String>,
    pub environments: EnvironmentContext,
}

/// Assemble the catalog index for one session
pub async fn index<S>(
    store: &mut S,
    packages: &dyn PackageClient,
    envs: &dyn EnvironmentClient,
    config: &CatalogConfig,
    query: &CatalogQuery,
) -> Result<CatalogIndex, DashboardError>
where
    S: SessionStore + Send + ?Sized,
{
    let page = list_applications(packages, query, config.page_size, &config.all_category_name)
        .await?;
    let categories = categories(packages, &config.all_category_name).await?;
    let current_category = current_category(query, &categories);
    let latest = RecentApps::new(config.recent_apps_limit)
        .list_valid(store, packages)
        .await?;
    let environments = environments::context(store, envs).await?;

    Ok(CatalogIndex {
        page,
        categories,
        current_category,
        latest,
        search: query.search_term().map(String::from),
        environments,
    })
}

/// An application together with the session's environment context
#[derive(Debug, Clone)]
pub struct AppDetails {
    pub app: Package,
    pub environments: EnvironmentContext,
}

pub async fn app_details<S>(
    store: &mut S,
    packages: &dyn PackageClient,
    envs: &dyn EnvironmentClient,
    app_id: &str,
) -> Result<AppDetails, DashboardError>
where
    S: SessionStore + Send + ?Sized,
{
    let app = packages.get(app_id).await?;
    let environments = environments::context(store, envs).await?;
    Ok(AppDetails { app, environments })
}

/// Logo of an application, or where to find the universal one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logo {
    Image(Vec<u8>),
    Fallback(String),
}

pub async fn app_logo(
    packages: &dyn PackageClient,
    app_id: &str,
    fallback_url: &str,
) -> Result<Logo, ApiError> {
    Ok(match packages.logo(app_id).await? {
        Some(bytes) if !bytes.is_empty() => Logo::Image(bytes),
        _ => Logo::Fallback(fallback_url.to_string()),
    })
}
