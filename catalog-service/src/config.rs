//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `CATALOG_`, nested keys split on `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/catalog-service/{service_name}/config.toml
//! 4. System directory: /etc/catalog-service/{service_name}/config.toml
//! 5. Default values
//!
//! ```toml
//! [service]
//! name = "catalog-service"
//! port = 8080
//!
//! [pagination]
//! default_limit = 10
//!
//! [uploads]
//! directory = "/var/lib/catalog/uploads"
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::query::{PaginationPolicy, DEFAULT_LIMIT};

const APP_DIR: &str = "catalog-service";
const ENV_PREFIX: &str = "CATALOG_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// List pagination
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Image uploads
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// Start-up seeding
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }
}

/// HTTP middleware configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode: permissive, restrictive or disabled
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl MiddlewareConfig {
    /// Body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
        }
    }
}

/// List pagination configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the request gives none
    #[serde(default = "default_page_limit")]
    pub default_limit: u64,

    /// Report `previousPage` only from page 2 onwards
    #[serde(default)]
    pub strict_previous_page: bool,
}

impl PaginationConfig {
    /// The policy list handlers paginate with
    pub fn policy(&self) -> PaginationPolicy {
        PaginationPolicy {
            default_limit: self.default_limit,
            strict_previous_page: self.strict_previous_page,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            strict_previous_page: false,
        }
    }
}

/// Image upload configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Root directory for stored images
    #[serde(default = "default_upload_dir")]
    pub directory: PathBuf,

    /// Largest accepted image in MB
    #[serde(default = "default_max_image_mb")]
    pub max_image_mb: usize,
}

impl UploadsConfig {
    /// Largest accepted image in bytes
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_mb * 1024 * 1024
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            directory: default_upload_dir(),
            max_image_mb: default_max_image_mb(),
        }
    }
}

/// Start-up seeding configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// JSON array of products loaded before serving
    #[serde(default)]
    pub products_file: Option<PathBuf>,
}

fn default_name() -> String {
    APP_DIR.to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

fn default_page_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_image_mb() -> usize {
    5
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Searches for config files in this order (first found wins):
    /// 1. Current working directory: ./config.toml
    /// 2. XDG config directory: ~/.config/catalog-service/{service_name}/config.toml
    /// 3. System directory: /etc/catalog-service/{service_name}/config.toml
    ///
    /// Environment variables (`CATALOG_` prefix) override all file-based configs.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(default_name);

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // lowest priority first so later merges win
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment.merge(Self::env()).extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path; environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env())
            .extract()?;

        Ok(config)
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    /// Candidate config files, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_DIR);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Some(path) = xdg_dirs.find_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(APP_DIR)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.service.timeout(), Duration::from_secs(30));
        assert_eq!(config.middleware.body_limit_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.pagination.policy(), PaginationPolicy::default());
        assert_eq!(config.uploads.directory, PathBuf::from("uploads"));
        assert!(config.seed.products_file.is_none());
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "catalog.toml",
                r#"
                [service]
                port = 9000

                [pagination]
                default_limit = 20
                strict_previous_page = true
                "#,
            )?;
            jail.set_env("CATALOG_SERVICE__PORT", "9100");
            jail.set_env("CATALOG_UPLOADS__MAX_IMAGE_MB", "2");

            let config = Config::load_from("catalog.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.service.port, 9100);
            assert_eq!(config.pagination.default_limit, 20);
            assert!(config.pagination.strict_previous_page);
            assert_eq!(config.uploads.max_image_bytes(), 2 * 1024 * 1024);
            assert_eq!(config.service.name, "catalog-service");
            Ok(())
        });
    }
}
