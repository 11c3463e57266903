//! Error types for the attested routes client

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("App Check initialization failed: {0}")]
    AttestationInit(String),

    #[error("App Check token fetch failed: {0}")]
    AttestationToken(String),

    #[error("Token exchange failed: HTTP {status}: {message}")]
    TokenExchange { status: u16, message: String },

    #[error("Token exchange request failed: {0}")]
    TokenExchangeTransport(#[source] reqwest::Error),

    #[error("Routes API error: HTTP {status}: {message}")]
    RoutesApi { status: u16, message: String },

    #[error("Routes API request failed: {0}")]
    RoutesTransport(#[source] reqwest::Error),

    #[error("Routes API response parsing failed: {0}")]
    RoutesResponse(#[source] serde_json::Error),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The leg of the flow an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    AttestationInit,
    AttestationToken,
    TokenExchange,
    ComputeRoute,
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::AttestationInit(_) => Stage::AttestationInit,
            Error::AttestationToken(_) => Stage::AttestationToken,
            Error::TokenExchange { .. } | Error::TokenExchangeTransport(_) => Stage::TokenExchange,
            Error::RoutesApi { .. } | Error::RoutesTransport(_) | Error::RoutesResponse(_) => {
                Stage::ComputeRoute
            }
            Error::Http(_) | Error::Config(_) => Stage::Setup,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
