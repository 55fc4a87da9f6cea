use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::frames::{ecef_to_enu, geodetic_to_ecef};
use crate::predict::types::LookAngles;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Default for GroundStation {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        }
    }
}

impl GroundStation {
    /// Parse `"lat, lon"` in degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self {
            latitude_deg: lat,
            longitude_deg: lon,
            altitude_m: altitude_m.unwrap_or(0.0),
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        geodetic_to_ecef(self.lat_rad(), self.lon_rad(), self.altitude_m / 1000.0)
    }

    /// Look angles towards a satellite at an Earth-fixed position.
    pub fn look_angles(&self, sat_ecef_km: [f64; 3]) -> LookAngles {
        let sta = self.position_ecef_km();
        let dr = [
            sat_ecef_km[0] - sta[0],
            sat_ecef_km[1] - sta[1],
            sat_ecef_km[2] - sta[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let (east, north, up) = ecef_to_enu(dr, self.lat_rad(), self.lon_rad());
        let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation = if range_km > 0.0 {
            (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
        } else {
            90.0
        };

        LookAngles {
            azimuth_deg: azimuth,
            elevation_deg: elevation,
            range_km,
        }
    }
}
