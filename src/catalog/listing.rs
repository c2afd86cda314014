//! Catalog listing with category / search filters and marker pagination

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, Package, PackageClient, PackageFilters, APPLICATION_PACKAGE_TYPE};

/// Catalog page request as sent by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    /// Id of the last application on the previous page
    #[serde(default)]
    pub marker: Option<String>,
}

impl CatalogQuery {
    /// The search term, if one was given
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// One page of applications
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub apps: Vec<Package>,
    pub has_more: bool,
    /// Marker for the next page request (id of the last app on this page)
    pub next_marker: Option<String>,
}

/// Build the package filters for a catalog query.
///
/// A search term wins over the category; the "All" category means no filter.
pub fn build_filters(query: &CatalogQuery, all_category_name: &str) -> PackageFilters {
    let mut filters = PackageFilters {
        package_type: Some(APPLICATION_PACKAGE_TYPE.to_string()),
        ..Default::default()
    };

    if let Some(search) = query.search_term() {
        filters.search = Some(search.to_string());
    } else if let Some(category) = query.category.as_deref() {
        if category != all_category_name {
            filters.category = Some(category.to_string());
        }
    }

    filters
}

/// Fetch one page of applications for `query`
pub async fn list_applications(
    packages: &dyn PackageClient,
    query: &CatalogQuery,
    page_size: usize,
    all_category_name: &str,
) -> Result<CatalogPage, ApiError> {
    let filters = build_filters(query, all_category_name);
    let page = packages
        .list(&filters, query.marker.as_deref(), page_size)
        .await?;

    let next_marker = if page.has_more {
        page.items.last().map(|app| app.id.clone())
    } else {
        None
    };

    Ok(CatalogPage {
        apps: page.items,
        has_more: page.has_more,
        next_marker,
    })
}

/// Category names with the synthetic "All" entry first
pub async fn categories(
    packages: &dyn PackageClient,
    all_category_name: &str,
) -> Result<Vec<String>, ApiError> {
    let mut categories = packages.categories().await?;
    if !categories.iter().any(|c| c == all_category_name) {
        categories.insert(0, all_category_name.to_string());
    }
    Ok(categories)
}

/// Category to highlight: the requested one, else the first listed
pub fn current_category(query: &CatalogQuery, categories: &[String]) -> Option<String> {
    query
        .category
        .clone()
        .or_else(|| categories.first().cloned())
}
