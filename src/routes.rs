//! Routes API caller

use tracing::{info, instrument};

use crate::api::{ComputeRoutesRequest, ComputeRoutesResponse, LatLng, TravelMode};
use crate::error::{Error, Result};
use crate::exchange::AuthToken;

pub const DEFAULT_ROUTES_ENDPOINT: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

pub const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

/// Only these fields come back from computeRoutes
pub const FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline";

pub struct RoutesClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RoutesClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_endpoint(http, DEFAULT_ROUTES_ENDPOINT)
    }

    pub fn with_endpoint(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Compute a route between two points
    #[instrument(skip(self, auth_token), fields(endpoint = %self.endpoint))]
    pub async fn compute_route(
        &self,
        auth_token: &AuthToken,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
    ) -> Result<ComputeRoutesResponse> {
        let request = ComputeRoutesRequest::new(origin, destination, mode);

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", auth_token.as_str()))
            .header("Content-Type", "application/json")
            .header(FIELD_MASK_HEADER, FIELD_MASK)
            .json(&request)
            .send()
            .await
            .map_err(Error::RoutesTransport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RoutesApi { status, message: body });
        }

        let body = response.bytes().await.map_err(Error::RoutesTransport)?;
        let routes: ComputeRoutesResponse = serde_json::from_slice(&body).map_err(Error::RoutesResponse)?;

        info!(routes = routes.routes.len(), "computeRoutes succeeded");
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let client = RoutesClient::new(reqwest::Client::new());
        assert_eq!(client.endpoint(), DEFAULT_ROUTES_ENDPOINT);
    }

    #[test]
    fn test_field_mask_lists_three_fields() {
        let fields: Vec<&str> = FIELD_MASK.split(',').collect();
        assert_eq!(
            fields,
            ["routes.duration", "routes.distanceMeters", "routes.polyline.encodedPolyline"]
        );
    }
}
