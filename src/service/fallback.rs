use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::catalog::parsing::{EARTH_MEAN_RADIUS_KM, EARTH_MU_KM3_S2};
use crate::catalog::{parse_tle, CatalogError, Source, TleRecord};
use crate::predict::SatellitePosition;

pub const REFERENCE_NAME: &str = "ISS (ZARYA)";
pub const REFERENCE_LINE1: &str =
    "1 25544U 98067A   24277.50000000  .00016717  00000-0  30244-3 0  9995";
pub const REFERENCE_LINE2: &str =
    "2 25544  51.6414 339.2971 0002829 106.9017 253.2445 15.48919103463641";

/// Spread of synthetic altitudes around the reference orbit, km.
const ALTITUDE_JITTER_KM: f64 = 15.0;

/// What to answer for an id when the catalog cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdFallback {
    /// Synthetic position tagged as fallback.
    #[default]
    Synthetic,
    /// Report the id as a failure.
    Omit,
}

/// What to answer for a group listing when the catalog cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFallback {
    #[default]
    Empty,
    /// A single reference element set tagged as fallback.
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    pub by_id: IdFallback,
    pub by_group: GroupFallback,
}

/// The reference element set, tagged as fallback data.
pub fn reference_record() -> Result<TleRecord, CatalogError> {
    let mut record = parse_tle(Some(REFERENCE_NAME.into()), REFERENCE_LINE1, REFERENCE_LINE2)?;
    record.source = Source::Fallback;
    Ok(record)
}

/// Reference elements relabeled as `satellite_id`, so a prediction over them
/// reports the id that was asked for.
pub fn fallback_record(satellite_id: &str) -> Result<TleRecord, CatalogError> {
    let mut record = reference_record()?;
    if let Ok(norad_id) = satellite_id.parse() {
        record.norad_id = norad_id;
    }
    record.name = format!("{} (fallback)", satellite_id);
    Ok(record)
}

/// Plausible position for `satellite_id` built around the reference orbit.
///
/// Coordinates are drawn from a generator seeded by the id, so repeated calls
/// for the same id agree with each other.
pub fn fallback_position(
    satellite_id: &str,
    at: DateTime<Utc>,
) -> Result<SatellitePosition, CatalogError> {
    let reference = reference_record()?;
    let mut rng = StdRng::seed_from_u64(seed_for(satellite_id));

    let max_lat = reference.inclination_deg.min(90.0);
    let latitude_deg = rng.random_range(-max_lat..=max_lat);
    let longitude_deg = rng.random_range(-180.0..180.0);
    let altitude_km = reference.altitude_km + rng.random_range(-ALTITUDE_JITTER_KM..=ALTITUDE_JITTER_KM);
    let velocity_km_s = (EARTH_MU_KM3_S2 / (EARTH_MEAN_RADIUS_KM + altitude_km)).sqrt();

    Ok(SatellitePosition {
        satellite_id: satellite_id.to_string(),
        name: format!("{} (fallback)", satellite_id),
        latitude_deg,
        longitude_deg,
        altitude_km,
        velocity_km_s,
        timestamp: at,
        look_angles: None,
        source: Source::Fallback,
    })
}

// FNV-1a, stable across platforms and releases
fn seed_for(satellite_id: &str) -> u64 {
    satellite_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_elements_parse() {
        let record = reference_record().unwrap();
        assert_eq!(record.norad_id, 25544);
        assert!(record.is_fallback());
    }

    #[test]
    fn fallback_record_takes_requested_id() {
        let record = fallback_record("43013").unwrap();
        assert_eq!(record.satellite_id(), "43013");
        assert_eq!(record.source, Source::Fallback);
        // the orbit itself is the reference one
        assert_eq!(record.line2, REFERENCE_LINE2);
    }

    #[test]
    fn fallback_position_is_plausible() {
        let at = Utc::now();
        for id in ["25544", "20580", "48274", "99999"] {
            let pos = fallback_position(id, at).unwrap();
            assert_eq!(pos.satellite_id, id);
            assert_eq!(pos.source, Source::Fallback);
            assert_eq!(pos.timestamp, at);
            assert!(pos.latitude_deg.abs() <= 51.7);
            assert!((-180.0..180.0).contains(&pos.longitude_deg));
            assert!(pos.altitude_km > 390.0 && pos.altitude_km < 450.0);
            assert!(pos.velocity_km_s > 7.5 && pos.velocity_km_s < 7.8);
        }
    }

    #[test]
    fn fallback_position_is_deterministic_per_id() {
        let at = Utc::now();
        let a = fallback_position("25544", at).unwrap();
        let b = fallback_position("25544", at).unwrap();
        let c = fallback_position("20580", at).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.latitude_deg, c.latitude_deg);
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: FallbackPolicy = serde_yaml::from_str("by_group: synthetic").unwrap();
        assert_eq!(policy.by_id, IdFallback::Synthetic);
        assert_eq!(policy.by_group, GroupFallback::Synthetic);

        let policy: FallbackPolicy = serde_yaml::from_str("by_id: omit").unwrap();
        assert_eq!(policy.by_id, IdFallback::Omit);
        assert_eq!(policy.by_group, GroupFallback::Empty);
    }
}
