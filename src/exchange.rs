//! Attestation token to authorization token exchange
//!
//! The backend checks the App Check token sent in `X-Firebase-AppCheck` and
//! answers with a signed token (plain text body) for the requested APIs.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::apis;
use crate::attestation::fingerprint;
use crate::config::ConfigError;
use crate::error::{Error, Result};

pub const APP_CHECK_HEADER: &str = "X-Firebase-AppCheck";

/// Backend-issued credential, opaque to this client
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken({})", self.fingerprint())
    }
}

pub struct TokenExchanger {
    http: reqwest::Client,
    backend_url: String,
    apis: Vec<String>,
}

impl TokenExchanger {
    pub fn new(http: reqwest::Client, backend_url: impl Into<String>) -> Self {
        Self {
            http,
            backend_url: backend_url.into(),
            apis: Vec::new(),
        }
    }

    /// Ask the backend for a token limited to these APIs (`*` for all).
    ///
    /// Unknown names are dropped. A list with no known API is rejected, since
    /// the backend would mint a token without any scope.
    pub fn with_apis(mut self, requested: Vec<String>) -> Result<Self> {
        if requested.is_empty() {
            self.apis = requested;
            return Ok(self);
        }

        let (known, unknown): (Vec<String>, Vec<String>) = if apis::is_wildcard(&requested) {
            (requested, Vec::new())
        } else {
            requested.into_iter().partition(|name| apis::is_known(name))
        };
        for name in &unknown {
            warn!(api = %name, "API not in the known API table, skipping");
        }

        let claims = apis::lookup(&known);
        if claims.scope.is_empty() {
            return Err(ConfigError::Invalid {
                key: "backend.apis",
                value: unknown.join(","),
            }
            .into());
        }
        debug!(scope = %claims.scope, audience = %claims.audience, "requesting token for APIs");

        self.apis = known;
        Ok(self)
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Exchange an App Check token for an authorization token.
    ///
    /// Any non-2xx reply or an empty body is an error.
    #[instrument(skip_all, fields(backend = %self.backend_url))]
    pub async fn exchange(&self, attestation_token: &str) -> Result<AuthToken> {
        let mut request = self
            .http
            .get(&self.backend_url)
            .header(APP_CHECK_HEADER, attestation_token);
        if !self.apis.is_empty() {
            request = request.query(&[("apis", self.apis.join(","))]);
        }

        let response = request.send().await.map_err(Error::TokenExchangeTransport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenExchange { status, message: body });
        }

        let status = response.status().as_u16();
        let body = response.text().await.map_err(Error::TokenExchangeTransport)?;
        if body.is_empty() {
            return Err(Error::TokenExchange {
                status,
                message: "empty token in response body".into(),
            });
        }

        let token = AuthToken::new(body);
        info!(fingerprint = %token.fingerprint(), "received authorization token");
        Ok(token)
    }
}
