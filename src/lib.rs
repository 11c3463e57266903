//! # App Check Routes Client
//!
//! Calls the Google Routes API with a short-lived token that a backend only
//! issues to attested app instances.
//!
//! ## Three-Step Flow
//!
//! ### Step 1: App Check Attestation
//! - Initializes an App Check handle bound to a Firebase app and site key
//! - Obtains an App Check token from a provider (debug secret or reCAPTCHA v3)
//! - Caches the token and refreshes it in the background when enabled
//!
//! ### Step 2: Token Exchange
//! - Sends the App Check token to the backend in `X-Firebase-AppCheck`
//! - Receives an opaque authorization token (a signed JWT) as the body
//!
//! ### Step 3: computeRoutes
//! - POSTs origin, destination and travel mode to the Routes API
//! - Authenticates with `Authorization: Bearer <token>`
//! - Restricts the reply with a fixed field mask (duration, distance, polyline)
//!
//! Each step waits for the previous one; if one fails the rest never run,
//! and [`Error::stage`] tells which one it was.
//!
//! ## Example
//!
//! ```rust,ignore
//! use appcheck_routes::{config, RoutesDemo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = config::load_config(Some("appcheck-routes.toml"))?;
//!     let demo = RoutesDemo::from_config(&config)?;
//!
//!     let outcome = demo.run_reference().await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome.response)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod apis;
pub mod attestation;
pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod exchange;
pub mod routes;

pub use api::{ComputeRoutesRequest, ComputeRoutesResponse, LatLng, Route, TravelMode};
pub use attestation::{AppCheck, AppCheckOptions, AttestationProvider, FirebaseConfig};
pub use client::{RouteOutcome, RoutesDemo};
pub use error::{Error, Stage};
pub use exchange::{AuthToken, TokenExchanger};
pub use routes::RoutesClient;
