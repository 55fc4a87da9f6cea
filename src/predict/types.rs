use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::Source;

/// Azimuth/elevation/range of a satellite as seen from a ground station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

/// Geodetic state of one satellite at one instant
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SatellitePosition {
    pub satellite_id: String,
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Height above the WGS-84 ellipsoid
    pub altitude_km: f64,
    /// Magnitude of the inertial velocity
    pub velocity_km_s: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub look_angles: Option<LookAngles>,
    pub source: Source,
}

/// A visibility window over a ground station
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassWindow {
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
    pub duration_seconds: i64,
}

/// Sampled ground track over a future window plus the next pass
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrbitPrediction {
    pub satellite_id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval_minutes: f64,
    pub positions: Vec<SatellitePosition>,
    pub next_pass: Option<PassWindow>,
    pub source: Source,
}
