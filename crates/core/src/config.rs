//! Admin console client configuration
//!
//! Values are layered: built-in defaults, then an optional `storedesk.toml`
//! found in the usual locations, then `STOREDESK__*` environment variables
//! (for example `STOREDESK__API__BASE_URL`).

use crate::error::CoreResult;
use crate::validation::{ValidateConfig, validators};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "STOREDESK";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Credential settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the backend, including the version segment
    pub base_url: String,
    /// Request timeout in seconds (ignored on wasm)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Header carrying the session access token
    #[serde(default = "default_access_header")]
    pub access_header: String,
}

/// Credential settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    /// Static application token, seeded into the credential store
    #[serde(default)]
    pub api_token: Option<String>,
    /// Where session credentials are persisted
    #[serde(default)]
    pub store: StoreConfig,
}

/// Credential store selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    /// File path for [`StoreKind::File`]; defaults to the platform data dir
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Credential store backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
    Browser,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("storedesk/{}", env!("CARGO_PKG_VERSION"))
}

fn default_access_header() -> String {
    "x-access-token".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            access_header: default_access_header(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl StoreConfig {
    /// Path of the session file, falling back to the platform data directory
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        default_store_path()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_store_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "storedesk", "storedesk")
        .map(|dirs| dirs.data_dir().join("session.json"))
}

#[cfg(target_arch = "wasm32")]
fn default_store_path() -> Option<PathBuf> {
    None
}

impl AdminConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let config_paths = [
            "storedesk.toml",
            "config/storedesk.toml",
            "/etc/storedesk/storedesk.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load from the default locations and validate the result
    pub fn load_validated() -> CoreResult<Self> {
        Self::load()?.validated()
    }

    /// Load from a specific config file and validate the result
    pub fn load_validated_from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::load_from_file(path)?.validated()
    }

    fn validated(self) -> CoreResult<Self> {
        self.validate()?;
        Ok(self)
    }
}

impl ValidateConfig for AdminConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_url(&self.api.base_url, "api.base_url")?;
        validators::validate_range(self.api.timeout_secs, 1, 600, "api.timeout_secs")?;
        validators::validate_not_empty(&self.api.user_agent, "api.user_agent")?;
        validators::validate_header_name(&self.api.access_header, "api.access_header")?;
        if self.api.access_header.eq_ignore_ascii_case("authorization") {
            return Err(ConfigError::Message(
                "api.access_header: must differ from the authorization header".into(),
            ));
        }
        if let Some(token) = &self.auth.api_token {
            validators::validate_not_empty(token, "auth.api_token")?;
        }
        validators::validate_not_empty(&self.logging.level, "logging.level")?;
        Ok(())
    }
}
