use anyhow::{anyhow, Result};
use std::env;
use tracing::{info, warn};

use crate::{log_system_event, log_validation};

pub const DEFAULT_BASE_URL: &str = "https://localhost:8000";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
pub const DEFAULT_LOG_LEVEL: &str = "info,interviewq=debug";

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Where the backend lives and how its anti-forgery cookie is echoed
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub log_directory: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file_enabled: false,
            log_directory: "logs".to_string(),
        }
    }
}

impl ApiConfig {
    /// Defaults everywhere except the base URL. Handy for tests and embedding.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn from_env() -> Result<Self> {
        let base_url = env::var("INTERVIEWQ_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let csrf_cookie = env::var("INTERVIEWQ_CSRF_COOKIE")
            .unwrap_or_else(|_| DEFAULT_CSRF_COOKIE.to_string());

        let csrf_header = env::var("INTERVIEWQ_CSRF_HEADER")
            .unwrap_or_else(|_| DEFAULT_CSRF_HEADER.to_string());

        let accept_invalid_certs = parse_flag("INTERVIEWQ_ACCEPT_INVALID_CERTS", false)?;

        Ok(ApiConfig {
            base_url,
            csrf_cookie,
            csrf_header,
            accept_invalid_certs,
        })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let file_enabled = parse_flag("LOG_FILE_ENABLED", false)?;
        let log_directory = env::var("LOG_DIRECTORY").unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            log_directory,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading client configuration from environment variables");

        let config = Config {
            api: ApiConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        };

        info!(
            base_url = %config.api.base_url,
            csrf_cookie = %config.api.csrf_cookie,
            csrf_header = %config.api.csrf_header,
            accept_invalid_certs = config.api.accept_invalid_certs,
            log_level = %config.logging.level,
            "Configuration summary"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.to_lowercase();
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(anyhow!(
                "INTERVIEWQ_API_BASE_URL must start with 'http://' or 'https://', got '{}'",
                self.api.base_url
            ));
        }

        if self.api.csrf_cookie.trim().is_empty() {
            return Err(anyhow!("CSRF cookie name must not be empty"));
        }

        if self.api.csrf_header.trim().is_empty() {
            return Err(anyhow!("CSRF header name must not be empty"));
        }

        if self.api.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for the API client");
        }

        let first_directive = self.logging.level.split(',').next().unwrap_or_default();
        if !["trace", "debug", "info", "warn", "error"]
            .contains(&first_directive.to_lowercase().as_str())
        {
            warn!("Unusual log level '{}', the default filter may apply", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

fn parse_flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(anyhow!("Invalid {} value: '{}'. Expected true or false", name, other)),
        },
        Err(_) => Ok(default),
    }
}
