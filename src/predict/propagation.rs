use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::catalog::{Source, TleRecord};
use crate::predict::error::PredictError;
use crate::predict::frames::{
    ecef_to_geodetic, gmst_rad, norm, normalize_longitude_deg, teme_to_ecef_position, WGS84_A_KM,
};
use crate::predict::ground_station::GroundStation;
use crate::predict::types::{LookAngles, SatellitePosition};

/// Position and velocity in the TEME frame, km and km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

/// SGP4/SDP4 state for one element set, initialized once and sampled at
/// arbitrary instants.
pub struct Propagator {
    satellite_id: String,
    name: String,
    source: Source,
    elements: Elements,
    constants: Constants,
}

impl Propagator {
    pub fn new(tle: &TleRecord) -> Result<Self, PredictError> {
        let satellite_id = tle.satellite_id();
        let invalid = |message: String| PredictError::InvalidElements {
            satellite: satellite_id.clone(),
            message,
        };

        let elements = Elements::from_tle(
            Some(tle.name.clone()),
            tle.line1.as_bytes(),
            tle.line2.as_bytes(),
        )
        .map_err(|e| invalid(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            satellite_id: satellite_id.clone(),
            name: tle.name.clone(),
            source: tle.source,
            elements,
            constants,
        })
    }

    pub fn satellite_id(&self) -> &str {
        &self.satellite_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Inertial state at `at`, before or after the element epoch.
    pub fn state_at(&self, at: DateTime<Utc>) -> Result<StateVector, PredictError> {
        let failed = |message: String| PredictError::Propagation {
            satellite: self.satellite_id.clone(),
            at,
            message,
        };

        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&at.naive_utc())
            .map_err(|e| failed(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| failed(e.to_string()))?;

        let finite = prediction
            .position
            .iter()
            .chain(prediction.velocity.iter())
            .all(|v| v.is_finite());
        if !finite || norm(prediction.position) == 0.0 {
            return Err(failed("model produced a non-physical state".to_string()));
        }
        // below one Earth radius the elements describe a re-entered object
        let radius = norm(prediction.position);
        if radius < WGS84_A_KM {
            return Err(self.decayed(at, radius - WGS84_A_KM));
        }

        Ok(StateVector {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        })
    }

    /// Earth-fixed position at `at`.
    pub fn ecef_at(&self, at: DateTime<Utc>) -> Result<[f64; 3], PredictError> {
        let state = self.state_at(at)?;
        Ok(teme_to_ecef_position(state.position_km, gmst_rad(at)))
    }

    pub fn look_angles_at(
        &self,
        station: &GroundStation,
        at: DateTime<Utc>,
    ) -> Result<LookAngles, PredictError> {
        Ok(station.look_angles(self.ecef_at(at)?))
    }

    pub fn position_at(
        &self,
        at: DateTime<Utc>,
        station: Option<&GroundStation>,
    ) -> Result<SatellitePosition, PredictError> {
        let state = self.state_at(at)?;
        let ecef = teme_to_ecef_position(state.position_km, gmst_rad(at));
        let (lat, lon, alt) = ecef_to_geodetic(ecef);
        if alt < 0.0 {
            return Err(self.decayed(at, alt));
        }

        Ok(SatellitePosition {
            satellite_id: self.satellite_id.clone(),
            name: self.name.clone(),
            latitude_deg: lat.to_degrees().clamp(-90.0, 90.0),
            longitude_deg: normalize_longitude_deg(lon.to_degrees()),
            altitude_km: alt,
            velocity_km_s: norm(state.velocity_km_s),
            timestamp: at,
            look_angles: station.map(|s| s.look_angles(ecef)),
            source: self.source,
        })
    }
}

impl Propagator {
    fn decayed(&self, at: DateTime<Utc>, altitude_km: f64) -> PredictError {
        PredictError::Decayed {
            satellite: self.satellite_id.clone(),
            at,
            altitude_km,
        }
    }
}

/// Geodetic position and speed of `tle`'s satellite at `at`.
pub fn propagate_one(
    tle: &TleRecord,
    at: DateTime<Utc>,
    station: Option<&GroundStation>,
) -> Result<SatellitePosition, PredictError> {
    Propagator::new(tle)?.position_at(at, station)
}
