use chrono::{DateTime, Duration, Utc};

use crate::catalog::TleRecord;
use crate::predict::error::PredictError;
use crate::predict::ground_station::GroundStation;
use crate::predict::pass_finder::find_next_pass;
use crate::predict::propagation::Propagator;
use crate::predict::types::OrbitPrediction;

pub const DEFAULT_INTERVAL_MINUTES: f64 = 10.0;
pub const MAX_HORIZON_HOURS: f64 = 168.0;
/// Upper bound on ground track samples per prediction (a week at one minute).
pub const MAX_SAMPLES: i64 = 10_081;

pub fn check_horizon(horizon_hours: f64) -> Result<(), PredictError> {
    if !horizon_hours.is_finite() || horizon_hours <= 0.0 || horizon_hours > MAX_HORIZON_HOURS {
        return Err(PredictError::InvalidHorizon(horizon_hours));
    }
    Ok(())
}

/// Sample the ground track of `tle` every `interval` from `start` up to
/// `start + horizon_hours`, and look for the next pass over `station`.
pub fn predict(
    tle: &TleRecord,
    horizon_hours: f64,
    start: DateTime<Utc>,
    interval: Duration,
    station: &GroundStation,
) -> Result<OrbitPrediction, PredictError> {
    check_horizon(horizon_hours)?;
    let interval_minutes = interval.num_milliseconds() as f64 / 60_000.0;
    if interval <= Duration::zero() {
        return Err(PredictError::InvalidInterval(interval_minutes));
    }

    let horizon = Duration::milliseconds((horizon_hours * 3_600_000.0).round() as i64);
    if horizon.num_milliseconds() / interval.num_milliseconds().max(1) + 1 > MAX_SAMPLES {
        return Err(PredictError::InvalidInterval(interval_minutes));
    }

    let end = start + horizon;
    let propagator = Propagator::new(tle)?;

    let mut positions = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        positions.push(propagator.position_at(cursor, Some(station))?);
        cursor += interval;
    }

    let next_pass = find_next_pass(&propagator, station, start, end)?;

    log::debug!(
        "Predicted {} positions for {} over {}h (next pass: {})",
        positions.len(),
        tle.name,
        horizon_hours,
        next_pass
            .as_ref()
            .map(|p| p.aos.to_rfc3339())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(OrbitPrediction {
        satellite_id: tle.satellite_id(),
        name: tle.name.clone(),
        start,
        end,
        interval_minutes,
        positions,
        next_pass,
        source: tle.source,
    })
}
