//! Client configuration loading from file and environment variables.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::attestation::types::DEFAULT_APP_CHECK_ENDPOINT;
use crate::attestation::{AppCheckOptions, FirebaseConfig};
use crate::routes::DEFAULT_ROUTES_ENDPOINT;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Firebase app identity.
    #[serde(default)]
    pub firebase: FirebaseSection,

    /// App Check provider settings.
    #[serde(default)]
    pub app_check: AppCheckSection,

    /// Token exchange backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Routes API settings.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseSection {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub app_id: String,

    #[serde(default = "default_app_check_endpoint")]
    pub app_check_endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppCheckSection {
    /// Public site key of the challenge provider.
    #[serde(default)]
    pub site_key: String,

    #[serde(default = "default_true")]
    pub auto_refresh: bool,

    /// Debug secret registered for this app; selects the debug provider.
    #[serde(default)]
    pub debug_token: Option<String>,

    /// Pre-solved reCAPTCHA v3 token; selects the reCAPTCHA provider.
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    /// URL of the token exchange endpoint.
    #[serde(default)]
    pub url: String,

    /// APIs to request a token for; empty lets the backend decide.
    #[serde(default)]
    pub apis: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_routes_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "appcheck_routes=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_true() -> bool {
    true
}

fn default_app_check_endpoint() -> String {
    DEFAULT_APP_CHECK_ENDPOINT.to_string()
}

fn default_routes_endpoint() -> String {
    DEFAULT_ROUTES_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FirebaseSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            app_id: String::new(),
            app_check_endpoint: default_app_check_endpoint(),
        }
    }
}

impl Default for AppCheckSection {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            auto_refresh: true,
            debug_token: None,
            recaptcha_token: None,
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_routes_endpoint(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
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

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required setting has no value.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A setting could not be parsed.
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Which App Check provider the settings select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderChoice {
    Debug(String),
    RecaptchaV3(String),
}

impl Config {
    pub fn firebase_config(&self) -> FirebaseConfig {
        FirebaseConfig::new(
            self.firebase.api_key.clone(),
            self.firebase.project_id.clone(),
            self.firebase.app_id.clone(),
        )
        .with_endpoint(self.firebase.app_check_endpoint.clone())
    }

    pub fn app_check_options(&self) -> AppCheckOptions {
        AppCheckOptions::new(self.app_check.site_key.clone()).with_auto_refresh(self.app_check.auto_refresh)
    }

    /// The debug provider wins when both secrets are set.
    pub fn provider_choice(&self) -> Result<ProviderChoice, ConfigError> {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();
        if let Some(token) = non_empty(&self.app_check.debug_token) {
            return Ok(ProviderChoice::Debug(token));
        }
        if let Some(token) = non_empty(&self.app_check.recaptcha_token) {
            return Ok(ProviderChoice::RecaptchaV3(token));
        }
        Err(ConfigError::Missing("app_check.debug_token or app_check.recaptcha_token"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }

    /// Check that everything the flow needs is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (&self.firebase.api_key, "firebase.api_key"),
            (&self.firebase.project_id, "firebase.project_id"),
            (&self.firebase.app_id, "firebase.app_id"),
            (&self.app_check.site_key, "app_check.site_key"),
            (&self.backend.url, "backend.url"),
        ];
        for (value, key) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(key));
            }
        }

        for (value, key) in [
            (&self.backend.url, "backend.url"),
            (&self.routes.endpoint, "routes.endpoint"),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::Invalid {
                    key,
                    value: value.clone(),
                });
            }
        }

        self.provider_choice()?;
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment variable overrides.
///
/// Environment variable overrides:
/// - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID`, `FIREBASE_APP_ID`
/// - `APPCHECK_SITE_KEY`, `APPCHECK_DEBUG_TOKEN`, `RECAPTCHA_TOKEN`
/// - `TOKEN_BACKEND_URL`, `TOKEN_BACKEND_APIS` (comma-separated)
/// - `ROUTES_ENDPOINT`
/// - `HTTP_TIMEOUT_SECS`
/// - `APPCHECK_ROUTES_LOG_LEVEL`, `APPCHECK_ROUTES_LOG_JSON` ("true" or "1")
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// an override cannot be parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with a custom variable lookup.
pub fn load_config_with<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(v) = env("FIREBASE_API_KEY") {
        config.firebase.api_key = v;
    }
    if let Some(v) = env("FIREBASE_PROJECT_ID") {
        config.firebase.project_id = v;
    }
    if let Some(v) = env("FIREBASE_APP_ID") {
        config.firebase.app_id = v;
    }
    if let Some(v) = env("APPCHECK_SITE_KEY") {
        config.app_check.site_key = v;
    }
    if let Some(v) = env("APPCHECK_DEBUG_TOKEN") {
        config.app_check.debug_token = Some(v);
    }
    if let Some(v) = env("RECAPTCHA_TOKEN") {
        config.app_check.recaptcha_token = Some(v);
    }
    if let Some(v) = env("TOKEN_BACKEND_URL") {
        config.backend.url = v;
    }
    if let Some(v) = env("TOKEN_BACKEND_APIS") {
        config.backend.apis = split_list(&v);
    }
    if let Some(v) = env("ROUTES_ENDPOINT") {
        config.routes.endpoint = v;
    }
    if let Some(v) = env("HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = v.parse().map_err(|_| ConfigError::Invalid {
            key: "HTTP_TIMEOUT_SECS",
            value: v.clone(),
        })?;
    }
    if let Some(v) = env("APPCHECK_ROUTES_LOG_LEVEL") {
        config.logging.level = v;
    }
    if let Some(v) = env("APPCHECK_ROUTES_LOG_JSON") {
        config.logging.json = v == "true" || v == "1";
    }

    Ok(config)
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
