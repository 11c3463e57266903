//! App Check providers backed by the Firebase App Check REST API
//!
//! Both providers trade a proof for an App Check token:
//! - `DebugProvider` sends a registered debug secret (`exchangeDebugToken`)
//! - `RecaptchaV3Provider` sends a reCAPTCHA v3 token obtained for the site key
//!   (`exchangeRecaptchaV3Token`)

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use super::types::{AttestationToken, ExchangeTokenResponse};
use super::{AttestationProvider, ExchangeContext};
use crate::duration::parse_duration;
use crate::error::{Error, Result};

/// Exchanges a debug secret registered in the Firebase console
pub struct DebugProvider {
    debug_token: String,
}

impl DebugProvider {
    pub fn new(debug_token: impl Into<String>) -> Self {
        Self {
            debug_token: debug_token.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugTokenRequest<'a> {
    debug_token: &'a str,
}

#[async_trait]
impl AttestationProvider for DebugProvider {
    fn name(&self) -> &'static str {
        "debug"
    }

    #[instrument(skip_all, fields(provider = "debug"))]
    async fn fetch_token(&self, ctx: &ExchangeContext) -> Result<AttestationToken> {
        exchange(
            ctx,
            "exchangeDebugToken",
            &DebugTokenRequest {
                debug_token: &self.debug_token,
            },
        )
        .await
    }
}

/// Source of reCAPTCHA v3 challenge responses for a site key.
///
/// Solving the challenge needs a browser; native callers hand in tokens
/// produced elsewhere.
#[async_trait]
pub trait ChallengeSource: Send + Sync {
    async fn challenge_token(&self, site_key: &str) -> Result<String>;
}

/// A pre-solved challenge token, e.g. from the environment
pub struct StaticChallenge(String);

impl StaticChallenge {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl ChallengeSource for StaticChallenge {
    async fn challenge_token(&self, _site_key: &str) -> Result<String> {
        if self.0.is_empty() {
            return Err(Error::AttestationToken("no reCAPTCHA token available".into()));
        }
        Ok(self.0.clone())
    }
}

pub struct RecaptchaV3Provider {
    source: Box<dyn ChallengeSource>,
}

impl RecaptchaV3Provider {
    pub fn new(source: impl ChallengeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecaptchaV3TokenRequest<'a> {
    recaptcha_v3_token: &'a str,
}

#[async_trait]
impl AttestationProvider for RecaptchaV3Provider {
    fn name(&self) -> &'static str {
        "recaptcha-v3"
    }

    #[instrument(skip_all, fields(provider = "recaptcha-v3"))]
    async fn fetch_token(&self, ctx: &ExchangeContext) -> Result<AttestationToken> {
        let challenge = self.source.challenge_token(&ctx.site_key).await?;
        exchange(
            ctx,
            "exchangeRecaptchaV3Token",
            &RecaptchaV3TokenRequest {
                recaptcha_v3_token: &challenge,
            },
        )
        .await
    }
}

/// POST an exchange request and turn the reply into a token
async fn exchange<B: Serialize>(ctx: &ExchangeContext, method: &str, body: &B) -> Result<AttestationToken> {
    let url = ctx.firebase.exchange_url(method);
    debug!(%url, "requesting App Check token");

    let response = ctx
        .http
        .post(&url)
        .query(&[("key", ctx.firebase.api_key.as_str())])
        .json(body)
        .send()
        .await
        .map_err(|e| Error::AttestationToken(format!("HTTP request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::AttestationToken(format!("HTTP {}: {}", status, body.trim())));
    }

    let reply: ExchangeTokenResponse = response
        .json()
        .await
        .map_err(|e| Error::AttestationToken(format!("JSON parse failed: {}", e)))?;

    if reply.token.is_empty() {
        return Err(Error::AttestationToken("empty token in exchange response".into()));
    }

    parse_duration(&reply.ttl)
        .and_then(|ttl| AttestationToken::new(reply.token, ttl))
        .ok_or_else(|| Error::AttestationToken(format!("invalid ttl '{}'", reply.ttl)))
}
