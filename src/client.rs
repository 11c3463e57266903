//! Attested routes client
//!
//! Chains the three legs, each awaiting the previous one:
//! 1. Get an App Check token (cached or freshly exchanged)
//! 2. Trade it at the backend for an authorization token
//! 3. Call computeRoutes with that token as bearer credential
//!
//! A failing leg ends the run; later legs are never attempted.

use std::time::Duration;

use tracing::{info, instrument};

use crate::api::{ComputeRoutesResponse, LatLng, TravelMode};
use crate::attestation::{AppCheck, DebugProvider, RecaptchaV3Provider, StaticChallenge};
use crate::config::{Config, ProviderChoice};
use crate::error::Result;
use crate::exchange::TokenExchanger;
use crate::routes::RoutesClient;

/// Default origin (Google campus, Mountain View)
pub const REFERENCE_ORIGIN: LatLng = LatLng {
    latitude: 37.419734,
    longitude: -122.0827784,
};

/// Default destination
pub const REFERENCE_DESTINATION: LatLng = LatLng {
    latitude: 37.417670,
    longitude: -122.079595,
};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    /// Fingerprint of the authorization token that was used
    pub auth_fingerprint: String,
    pub response: ComputeRoutesResponse,
}

pub struct RoutesDemo {
    app_check: AppCheck,
    exchanger: TokenExchanger,
    routes: RoutesClient,
}

/// Shared HTTP client for all legs
pub fn build_http_client(timeout: Duration, connect_timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(format!("appcheck-routes/{}", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

impl RoutesDemo {
    pub fn new(app_check: AppCheck, exchanger: TokenExchanger, routes: RoutesClient) -> Self {
        Self {
            app_check,
            exchanger,
            routes,
        }
    }

    /// Wire up every leg from configuration.
    ///
    /// Initializes App Check; a failure here is fatal for the flow.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let http = build_http_client(config.request_timeout(), config.connect_timeout())?;
        let firebase = config.firebase_config();
        let options = config.app_check_options();

        let app_check = match config.provider_choice()? {
            ProviderChoice::Debug(secret) => {
                AppCheck::initialize(firebase, options, DebugProvider::new(secret), http.clone())?
            }
            ProviderChoice::RecaptchaV3(token) => AppCheck::initialize(
                firebase,
                options,
                RecaptchaV3Provider::new(StaticChallenge::new(token)),
                http.clone(),
            )?,
        };

        let exchanger = TokenExchanger::new(http.clone(), config.backend.url.clone())
            .with_apis(config.backend.apis.clone())?;
        let routes = RoutesClient::with_endpoint(http, config.routes.endpoint.clone());

        Ok(Self::new(app_check, exchanger, routes))
    }

    pub fn app_check(&self) -> &AppCheck {
        &self.app_check
    }

    /// Run the whole flow once
    #[instrument(skip(self))]
    pub async fn run(&self, origin: LatLng, destination: LatLng, mode: TravelMode) -> Result<RouteOutcome> {
        let attestation = self.app_check.get_token(false).await?;

        let auth = self.exchanger.exchange(attestation.as_str()).await?;

        let response = self.routes.compute_route(&auth, origin, destination, mode).await?;

        info!(
            routes = response.routes.len(),
            auth = %auth.fingerprint(),
            "route computed"
        );
        Ok(RouteOutcome {
            auth_fingerprint: auth.fingerprint(),
            response,
        })
    }

    /// Run with the reference coordinates
    pub async fn run_reference(&self) -> Result<RouteOutcome> {
        self.run(REFERENCE_ORIGIN, REFERENCE_DESTINATION, TravelMode::Drive).await
    }
}
