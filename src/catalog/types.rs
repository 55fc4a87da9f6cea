use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Where a piece of orbital data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Fetched from the catalog and propagated.
    Live,
    /// Synthesized from the reference element set because the catalog was unavailable.
    Fallback,
}

/// Named satellite groups understood by the catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum SatelliteGroup {
    Active,
    Stations,
    Starlink,
    Visual,
    Weather,
    GpsOps,
    Galileo,
    #[strum(serialize = "iridium-NEXT")]
    #[serde(rename = "iridium-NEXT")]
    IridiumNext,
    Oneweb,
    Geo,
    Amateur,
    #[strum(serialize = "last-30-days")]
    #[serde(rename = "last-30-days")]
    LastThirtyDays,
}

/// One satellite's mean elements at a reference epoch, with the descriptive
/// quantities derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TleRecord {
    pub norad_id: u64,
    pub name: String,
    pub international_designator: Option<String>,
    pub line1: String,
    pub line2: String,
    pub epoch: DateTime<Utc>,
    /// Revolutions per day
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Semi-major axis minus mean Earth radius
    pub altitude_km: f64,
    pub period_minutes: f64,
    pub source: Source,
}

impl TleRecord {
    pub fn satellite_id(&self) -> String {
        self.norad_id.to_string()
    }

    /// Time elapsed since the element epoch (negative for instants before it).
    pub fn age_at(&self, at: DateTime<Utc>) -> Duration {
        at - self.epoch
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}
