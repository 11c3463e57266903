//! Routes API types (`directions/v2:computeRoutes`)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::str::FromStr for LatLng {
    type Err = String;

    /// Parses `"lat,lng"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LNG, got '{}'", s))?;
        let latitude = lat.trim().parse().map_err(|_| format!("invalid latitude '{}'", lat))?;
        let longitude = lng.trim().parse().map_err(|_| format!("invalid longitude '{}'", lng))?;

        let point = LatLng::new(latitude, longitude);
        if !point.is_valid() {
            return Err(format!("coordinate out of range: {}", s));
        }
        Ok(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: Location,
}

impl From<LatLng> for Waypoint {
    fn from(lat_lng: LatLng) -> Self {
        Self {
            location: Location { lat_lng },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Bicycle,
    Walk,
    TwoWheeler,
    Transit,
}

impl std::str::FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRIVE" => Ok(Self::Drive),
            "BICYCLE" => Ok(Self::Bicycle),
            "WALK" => Ok(Self::Walk),
            "TWO_WHEELER" => Ok(Self::TwoWheeler),
            "TRANSIT" => Ok(Self::Transit),
            other => Err(format!("unknown travel mode '{}'", other)),
        }
    }
}

/// Request body for computeRoutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRoutesRequest {
    pub origin: Waypoint,
    pub destination: Waypoint,
    pub travel_mode: TravelMode,
}

impl ComputeRoutesRequest {
    pub fn new(origin: LatLng, destination: LatLng, travel_mode: TravelMode) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            travel_mode,
        }
    }
}

/// computeRoutes reply, restricted by the field mask.
///
/// Masked-out or zero-valued fields are omitted by the API, so every field
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeRoutesResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub distance_meters: u64,

    #[serde(default)]
    pub polyline: Polyline,
}

impl Route {
    /// Travel time, if the API returned a parseable duration
    pub fn duration_secs(&self) -> Option<Duration> {
        parse_duration(&self.duration)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    #[serde(default)]
    pub encoded_polyline: String,
}
