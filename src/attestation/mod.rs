//! App Check attestation
//!
//! `AppCheck` is the client-side attestation handle:
//! - Bound to a Firebase app and a provider site key at initialization
//! - Hands out cached tokens while they stay valid for a few more minutes
//! - Fetches a new token from its provider when the cache runs dry
//! - With auto refresh, renews the cached token in the background once half
//!   of its lifetime has elapsed
//!
//! Providers trade some proof of app integrity for a token. The bundled ones
//! talk to the App Check REST API (see [`providers`]); anything implementing
//! [`AttestationProvider`] can be plugged in.

pub mod providers;
pub mod types;

pub use providers::{ChallengeSource, DebugProvider, RecaptchaV3Provider, StaticChallenge};
pub use types::{fingerprint, AppCheckOptions, AttestationToken, FirebaseConfig};

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Cached tokens closer than this to expiry are not handed out
pub const TOKEN_MIN_VALIDITY: Duration = Duration::from_secs(5 * 60);

/// Lower bound between background refreshes
pub const MIN_REFRESH_DELAY: Duration = Duration::from_secs(30);

/// Everything a provider needs to perform an exchange
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    pub firebase: FirebaseConfig,
    pub site_key: String,
    pub http: reqwest::Client,
}

#[async_trait]
pub trait AttestationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_token(&self, ctx: &ExchangeContext) -> Result<AttestationToken>;
}

struct Inner {
    ctx: ExchangeContext,
    provider: Box<dyn AttestationProvider>,
    cached: Mutex<Option<AttestationToken>>,
}

impl Inner {
    /// Return the cached token when `reuse` accepts it, otherwise fetch a new
    /// one. The flag is true when the provider was called.
    ///
    /// The decision is made under the cache lock, so callers that queued
    /// behind a fetch see its result instead of fetching again.
    async fn token<F>(&self, reuse: F) -> Result<(AttestationToken, bool)>
    where
        F: Fn(&AttestationToken) -> bool,
    {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| reuse(t)) {
            debug!(fingerprint = %token.fingerprint(), "reusing cached App Check token");
            return Ok((token.clone(), false));
        }

        let token = self.provider.fetch_token(&self.ctx).await?;
        debug!(
            provider = self.provider.name(),
            fingerprint = %token.fingerprint(),
            "obtained App Check token"
        );
        *cached = Some(token.clone());
        Ok((token, true))
    }

    async fn refresh_delay(&self) -> Duration {
        let cached = self.cached.lock().await;
        let delay = cached
            .as_ref()
            .map(|t| t.refresh_at().saturating_duration_since(tokio::time::Instant::now()))
            .unwrap_or(MIN_REFRESH_DELAY);
        delay.max(MIN_REFRESH_DELAY)
    }
}

/// Initialized App Check handle
pub struct AppCheck {
    inner: Arc<Inner>,
    auto_refresh: bool,
    refresher: StdMutex<Option<JoinHandle<()>>>,
}

impl AppCheck {
    /// Bind an attestation provider to a Firebase app
    ///
    /// Fails with `Error::AttestationInit` on malformed identifiers or an
    /// empty site key.
    pub fn initialize(
        firebase: FirebaseConfig,
        options: AppCheckOptions,
        provider: impl AttestationProvider + 'static,
        http: reqwest::Client,
    ) -> Result<Self> {
        firebase.validate().map_err(Error::AttestationInit)?;
        if options.site_key.trim().is_empty() {
            return Err(Error::AttestationInit("site key is empty".into()));
        }

        info!(
            project = %firebase.project_id,
            provider = provider.name(),
            auto_refresh = options.auto_refresh,
            "App Check initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                ctx: ExchangeContext {
                    firebase,
                    site_key: options.site_key,
                    http,
                },
                provider: Box::new(provider),
                cached: Mutex::new(None),
            }),
            auto_refresh: options.auto_refresh,
            refresher: StdMutex::new(None),
        })
    }

    pub fn is_auto_refresh_enabled(&self) -> bool {
        self.auto_refresh
    }

    /// Get an App Check token, reusing the cached one unless it is close to
    /// expiry or `force_refresh` is set
    pub async fn get_token(&self, force_refresh: bool) -> Result<AttestationToken> {
        let (token, fetched) = self
            .inner
            .token(|t| !force_refresh && t.is_valid_for(TOKEN_MIN_VALIDITY))
            .await?;
        if fetched && self.auto_refresh {
            self.ensure_refresher();
        }
        Ok(token)
    }

    fn ensure_refresher(&self) {
        let Ok(mut slot) = self.refresher.lock() else {
            warn!("App Check refresher state poisoned, background refresh disabled");
            return;
        };
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *slot = Some(tokio::spawn(refresh_loop(inner)));
    }

    #[cfg(test)]
    fn is_refreshing(&self) -> bool {
        self.refresher
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for AppCheck {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.refresher.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

/// Background renewal. Stops on the first failure; the next `get_token`
/// fetches on demand and restarts it.
async fn refresh_loop(inner: Arc<Inner>) {
    loop {
        let delay = inner.refresh_delay().await;
        debug!(delay_secs = delay.as_secs(), "next App Check refresh scheduled");
        tokio::time::sleep(delay).await;

        // skipped when a caller already renewed the token
        let not_due = |t: &AttestationToken| t.refresh_at() > tokio::time::Instant::now();
        if let Err(e) = inner.token(not_due).await {
            warn!(error = %e, "background App Check refresh failed");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        ttl: Duration,
        latency: Duration,
        fail_on_call: Option<usize>,
    }

    impl CountingProvider {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                ttl: Duration::from_secs(3600),
                latency: Duration::ZERO,
                fail_on_call: None,
            }
        }
    }

    #[async_trait]
    impl AttestationProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_token(&self, _ctx: &ExchangeContext) -> Result<AttestationToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail_on_call == Some(n) {
                return Err(Error::AttestationToken("network unavailable".into()));
            }
            AttestationToken::new(format!("AT{}", n), self.ttl)
                .ok_or_else(|| Error::AttestationToken("invalid ttl".into()))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl AttestationProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_token(&self, _ctx: &ExchangeContext) -> Result<AttestationToken> {
            Err(Error::AttestationToken("network unavailable".into()))
        }
    }

    fn firebase() -> FirebaseConfig {
        FirebaseConfig::new("key", "demo-project", "1:1234:web:abcdef")
    }

    fn app_check_with(auto_refresh: bool, provider: CountingProvider) -> AppCheck {
        AppCheck::initialize(
            firebase(),
            AppCheckOptions::new("site-key").with_auto_refresh(auto_refresh),
            provider,
            reqwest::Client::new(),
        )
        .unwrap()
    }

    fn app_check(auto_refresh: bool, calls: Arc<AtomicUsize>) -> AppCheck {
        app_check_with(auto_refresh, CountingProvider::new(calls))
    }

    #[test]
    fn test_initialize_rejects_empty_site_key() {
        let result = AppCheck::initialize(
            firebase(),
            AppCheckOptions::new(""),
            FailingProvider,
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(Error::AttestationInit(_))));
    }

    #[test]
    fn test_initialize_rejects_bad_app_id() {
        let result = AppCheck::initialize(
            FirebaseConfig::new("key", "demo-project", "demo"),
            AppCheckOptions::new("site-key"),
            FailingProvider,
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(Error::AttestationInit(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_token_reused_until_near_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app_check = app_check(false, calls.clone());

        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT1");
        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3400)).await;
        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_bypasses_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app_check = app_check(false, calls.clone());

        app_check.get_token(false).await.unwrap();
        assert_eq!(app_check.get_token(true).await.unwrap().as_str(), "AT2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_renews_in_background() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app_check = app_check(true, calls.clone());

        app_check.get_token(false).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1801)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // served from the renewed cache
        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_background_refresh_keeps_cache_and_restarts_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut provider = CountingProvider::new(calls.clone());
        provider.fail_on_call = Some(2);
        let app_check = app_check_with(true, provider);

        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT1");
        assert!(app_check.is_refreshing());

        // background renewal at 1800s fails and the loop stops
        tokio::time::sleep(Duration::from_secs(1801)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!app_check.is_refreshing());

        // the cached token is still handed out
        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!app_check.is_refreshing());

        // once stale, get_token fetches on demand and restarts the refresher
        tokio::time::sleep(Duration::from_secs(1600)).await;
        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(app_check.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut provider = CountingProvider::new(calls.clone());
        provider.latency = Duration::from_secs(10);
        let app_check = app_check_with(false, provider);

        let (first, second) = tokio::join!(app_check.get_token(false), app_check.get_token(false));
        assert_eq!(first.unwrap().as_str(), "AT1");
        assert_eq!(second.unwrap().as_str(), "AT1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_refresh_skips_token_renewed_by_caller() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app_check = app_check(true, calls.clone());

        app_check.get_token(false).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1000)).await;
        // forced renewal moves the next refresh point to 2800s
        assert_eq!(app_check.get_token(true).await.unwrap().as_str(), "AT2");

        tokio::time::sleep(Duration::from_secs(801)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(app_check.get_token(false).await.unwrap().as_str(), "AT2");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let app_check = AppCheck::initialize(
            firebase(),
            AppCheckOptions::new("site-key"),
            FailingProvider,
            reqwest::Client::new(),
        )
        .unwrap();
        let err = app_check.get_token(false).await.unwrap_err();
        assert!(matches!(err, Error::AttestationToken(_)));
    }
}
