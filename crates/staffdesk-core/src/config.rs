//! Configuration management for staffdesk

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// List view configuration
    #[serde(default)]
    pub view: ViewConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which side of the dashboard the client acts as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    /// Reviewers and managers: sees every record
    Admin,
    /// A single employee: sees their own tasks and work logs
    #[default]
    Employee,
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Employee => write!(f, "employee"),
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://hr.example.com/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Portal the client acts as
    #[serde(default)]
    pub portal: Portal,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Bearer token for the session
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

/// List view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

const fn default_timeout_seconds() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            portal: Portal::default(),
            timeout_seconds: default_timeout_seconds(),
            token: None,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from `staffdesk.toml` (if present) and environment
    ///
    /// Environment variables use the `STAFFDESK_` prefix with `__` between
    /// nested keys, e.g. `STAFFDESK_API__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        Self::build(config::File::with_name("staffdesk").required(false))
    }

    /// Load configuration from an explicit file, still layered under environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or invalid.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("STAFFDESK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| crate::Error::config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| crate::Error::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first bad value.
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::Error::config("api.base_url must not be empty"));
        }
        if self.api.timeout_seconds == 0 {
            return Err(crate::Error::config("api.timeout_seconds must be positive"));
        }
        if self.view.page_size == 0 {
            return Err(crate::Error::config("view.page_size must be positive"));
        }
        Ok(())
    }
}
