use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub murano: MuranoConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub redirects: RedirectsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST server binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7010
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Remote catalog / environment API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuranoConfig {
    /// Base URL of the API, e.g. "http://murano:8082". Unset means offline only.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Token sent as X-Auth-Token
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for MuranoConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Catalog browsing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Applications per catalog page (default: 6)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Capacity of the recently-used applications queue (default: 6)
    #[serde(default = "default_recent_apps_limit")]
    pub recent_apps_limit: usize,
    /// Name of the synthetic category that disables category filtering
    #[serde(default = "default_all_category_name")]
    pub all_category_name: String,
}

fn default_page_size() -> usize {
    6
}

fn default_recent_apps_limit() -> usize {
    6
}

fn default_all_category_name() -> String {
    "All".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recent_apps_limit: default_recent_apps_limit(),
            all_category_name: default_all_category_name(),
        }
    }
}

/// Redirect targets handed back to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectsConfig {
    /// Used when a requested redirect target is unsafe
    #[serde(default = "default_redirect")]
    pub default_redirect: String,
    /// Fallback page after a failed deployment
    #[serde(default = "default_environments_index")]
    pub environments_index: String,
    /// Service list of one environment; `{environment_id}` is substituted
    #[serde(default = "default_environment_services")]
    pub environment_services: String,
    #[serde(default = "default_catalog_index")]
    pub catalog_index: String,
    /// Universal icon for packages without a logo
    #[serde(default = "default_fallback_logo")]
    pub fallback_logo: String,
}

fn default_redirect() -> String {
    "/".to_string()
}

fn default_environments_index() -> String {
    "/environments".to_string()
}

fn default_environment_services() -> String {
    "/environments/{environment_id}/services".to_string()
}

fn default_catalog_index() -> String {
    "/catalog".to_string()
}

fn default_fallback_logo() -> String {
    "/static/images/icon.png".to_string()
}

impl Default for RedirectsConfig {
    fn default() -> Self {
        Self {
            default_redirect: default_redirect(),
            environments_index: default_environments_index(),
            environment_services: default_environment_services(),
            catalog_index: default_catalog_index(),
            fallback_logo: default_fallback_logo(),
        }
    }
}

impl RedirectsConfig {
    /// URL of the service list for one environment
    pub fn environment_services_url(&self, environment_id: &str) -> String {
        self.environment_services
            .replace("{environment_id}", environment_id)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to a file instead of stderr
    #[serde(default)]
    pub to_file: bool,

    /// Directory for log files when `to_file` is set
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Global config file in ~/.config/catalog-dashboard/
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("catalog-dashboard").join("config.toml"))
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the dashboard works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // User config (optional global overrides)
        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with DASHBOARD_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.logging.dir);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            murano: MuranoConfig::default(),
            catalog: CatalogConfig::default(),
            redirects: RedirectsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.catalog.page_size, 6);
        assert_eq!(config.catalog.recent_apps_limit, 6);
        assert_eq!(config.catalog.all_category_name, "All");
        assert!(config.murano.endpoint.is_none());
    }

    #[test]
    fn test_environment_services_url() {
        let redirects = RedirectsConfig::default();
        assert_eq!(
            redirects.environment_services_url("abc"),
            "/environments/abc/services"
        );
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dashboard.toml");
        std::fs::write(
            &path,
            "[catalog]\npage_size = 12\n\n[murano]\nendpoint = \"http://murano:8082\"\n",
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.catalog.page_size, 12);
        assert_eq!(config.catalog.recent_apps_limit, 6);
        assert_eq!(
            config.murano.endpoint.as_deref(),
            Some("http://murano:8082")
        );
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.port = 9000;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_logs_path_relative_to_cwd() {
        let config = Config::default();
        assert!(config.logs_path().is_absolute());
        assert!(config.logs_path().ends_with("logs"));
    }
}
