//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub log_level: Level,
    pub storage_path: PathBuf,
    pub profile_poll_interval: Duration,
    pub identity_base_url: String,
    pub identity_api_key: Option<String>,
    pub demo_document_id: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Backend ---
        let api_base_url = std::env::var("LENS_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "LENS_API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Local storage ---
        let storage_path = std::env::var("LENS_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.lens/local_storage.json"));

        let poll_secs_str =
            std::env::var("LENS_PROFILE_POLL_SECS").unwrap_or_else(|_| "5".to_string());
        let poll_secs = poll_secs_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "LENS_PROFILE_POLL_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", poll_secs_str),
                )
            })?;

        // --- Identity provider ---
        let identity_base_url = std::env::var("LENS_IDENTITY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_IDENTITY_BASE_URL.to_string());
        let identity_api_key = std::env::var("LENS_IDENTITY_API_KEY").ok();

        let demo_document_id =
            std::env::var("LENS_DEMO_DOCUMENT_ID").unwrap_or_else(|_| "demo".to_string());

        Ok(Self {
            api_base_url,
            log_level,
            storage_path,
            profile_poll_interval: Duration::from_secs(poll_secs),
            identity_base_url,
            identity_api_key,
            demo_document_id,
        })
    }

    /// Settings pointing at a given backend, used by tests and embedders.
    pub fn for_backend(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            log_level: Level::INFO,
            storage_path: PathBuf::from("./.lens/local_storage.json"),
            profile_poll_interval: Duration::from_secs(5),
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            identity_api_key: None,
            demo_document_id: "demo".to_string(),
        }
    }

    /// The identity provider API key, required by every identity command.
    pub fn require_identity_api_key(&self) -> Result<&str, ConfigError> {
        self.identity_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("LENS_IDENTITY_API_KEY".to_string()))
    }
}
