//! Core types for App Check attestation

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Public App Check REST endpoint
pub const DEFAULT_APP_CHECK_ENDPOINT: &str = "https://firebaseappcheck.googleapis.com";

/// Firebase application identity the attestation is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub app_id: String,

    #[serde(default = "default_app_check_endpoint")]
    pub app_check_endpoint: String,
}

fn default_app_check_endpoint() -> String {
    DEFAULT_APP_CHECK_ENDPOINT.to_string()
}

impl FirebaseConfig {
    pub fn new(
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            app_id: app_id.into(),
            app_check_endpoint: default_app_check_endpoint(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.app_check_endpoint = endpoint.into();
        self
    }

    /// Check the identifiers are well-formed.
    ///
    /// App ids have the shape `1:<project number>:<platform>:<hex>`.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key is empty".into());
        }
        if self.project_id.trim().is_empty() {
            return Err("project id is empty".into());
        }

        let parts: Vec<&str> = self.app_id.split(':').collect();
        let well_formed = parts.len() == 4
            && parts[0].chars().all(|c| c.is_ascii_digit())
            && !parts[1].is_empty()
            && parts[1].chars().all(|c| c.is_ascii_digit())
            && matches!(parts[2], "web" | "android" | "ios")
            && !parts[3].is_empty()
            && parts[3].chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(format!("malformed app id '{}'", self.app_id));
        }

        if url::Url::parse(&self.app_check_endpoint).is_err() {
            return Err(format!("invalid App Check endpoint '{}'", self.app_check_endpoint));
        }

        Ok(())
    }

    /// Exchange URL for the given App Check method, e.g. `exchangeDebugToken`
    pub fn exchange_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/apps/{}:{}",
            self.app_check_endpoint.trim_end_matches('/'),
            self.project_id,
            self.app_id,
            method
        )
    }
}

/// App Check initialization options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCheckOptions {
    /// Public site key of the challenge provider
    pub site_key: String,

    /// Keep a fresh token cached in the background
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
}

fn default_auto_refresh() -> bool {
    true
}

impl AppCheckOptions {
    pub fn new(site_key: impl Into<String>) -> Self {
        Self {
            site_key: site_key.into(),
            auto_refresh: true,
        }
    }

    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }
}

/// A short-lived App Check token
#[derive(Clone)]
pub struct AttestationToken {
    token: String,
    issued_at: Instant,
    expires_at: Instant,
}

impl AttestationToken {
    /// `None` when `ttl` reaches past what the clock can represent
    pub fn new(token: impl Into<String>, ttl: Duration) -> Option<Self> {
        let now = Instant::now();
        Some(Self {
            token: token.into(),
            issued_at: now,
            expires_at: now.checked_add(ttl)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// True if the token stays valid for at least `margin` from now
    pub fn is_valid_for(&self, margin: Duration) -> bool {
        Instant::now()
            .checked_add(margin)
            .is_some_and(|deadline| deadline < self.expires_at)
    }

    /// Instant at which half the lifetime has elapsed
    pub fn refresh_at(&self) -> Instant {
        self.issued_at + (self.expires_at - self.issued_at) / 2
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.token)
    }
}

impl fmt::Debug for AttestationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationToken")
            .field("fingerprint", &self.fingerprint())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body of a successful App Check exchange
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeTokenResponse {
    pub token: String,
    pub ttl: String,
}

/// Short SHA-256 fingerprint used to refer to secrets in logs
pub fn fingerprint(secret: &str) -> String {
    let hash = Sha256::digest(secret.as_bytes());
    hex::encode(&hash[..8])
}
