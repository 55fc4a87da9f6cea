use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::ground_station::GroundStation;
use crate::predict::propagation::Propagator;
use crate::predict::types::PassWindow;

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement
const HORIZON_ELEVATION: f64 = 0.0;

/// Find all passes over `station` within `[start, end]` whose peak elevation
/// reaches `min_elevation`.
pub fn find_passes(
    propagator: &Propagator,
    station: &GroundStation,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation: f64,
) -> Result<Vec<PassWindow>, PredictError> {
    let mut passes = Vec::new();
    let mut scan = PassScan::new(propagator, station, start, end, min_elevation);
    while let Some(pass) = scan.next_pass()? {
        passes.push(pass);
    }
    Ok(passes)
}

/// First pass over `station` within `[start, end]`, if any.
pub fn find_next_pass(
    propagator: &Propagator,
    station: &GroundStation,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Option<PassWindow>, PredictError> {
    PassScan::new(propagator, station, start, end, HORIZON_ELEVATION).next_pass()
}

struct PassScan<'a> {
    propagator: &'a Propagator,
    station: &'a GroundStation,
    cursor: DateTime<Utc>,
    /// Time of the previous coarse sample
    previous: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation: f64,
}

struct OpenPass {
    aos: DateTime<Utc>,
    aos_az: f64,
    max_el: f64,
    max_el_time: DateTime<Utc>,
}

impl<'a> PassScan<'a> {
    fn new(
        propagator: &'a Propagator,
        station: &'a GroundStation,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_elevation: f64,
    ) -> Self {
        Self {
            propagator,
            station,
            cursor: start,
            previous: start,
            start,
            end,
            min_elevation,
        }
    }

    fn next_pass(&mut self) -> Result<Option<PassWindow>, PredictError> {
        let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
        let mut open: Option<OpenPass> = None;

        while self.cursor <= self.end {
            let cursor = self.cursor;
            let angles = self.propagator.look_angles_at(self.station, cursor)?;
            let visible = angles.elevation_deg >= HORIZON_ELEVATION;
            let previous = std::mem::replace(&mut self.previous, cursor);
            // the last step is shortened so that `end` itself is sampled
            self.cursor = if cursor < self.end {
                (cursor + coarse_step).min(self.end)
            } else {
                cursor + coarse_step
            };

            if visible && open.is_none() {
                // already above the horizon at the window start: the pass is
                // clipped to the window
                let (aos, aos_az) = if cursor == self.start {
                    (cursor, angles.azimuth_deg)
                } else {
                    self.refine_crossing(previous, cursor, true)?
                };
                open = Some(OpenPass {
                    aos,
                    aos_az,
                    max_el: angles.elevation_deg,
                    max_el_time: cursor,
                });
            } else if visible {
                if let Some(pass) = open.as_mut() {
                    if angles.elevation_deg > pass.max_el {
                        pass.max_el = angles.elevation_deg;
                        pass.max_el_time = cursor;
                    }
                }
            } else if let Some(pass) = open.take() {
                let (los, los_az) = self.refine_crossing(previous, cursor, false)?;
                if pass.max_el >= self.min_elevation {
                    return Ok(Some(close_pass(pass, los, los_az)));
                }
            }
        }

        // pass in progress at the end of the window
        if let Some(pass) = open {
            if pass.max_el >= self.min_elevation {
                let angles = self.propagator.look_angles_at(self.station, self.end)?;
                return Ok(Some(close_pass(pass, self.end, angles.azimuth_deg)));
            }
        }

        Ok(None)
    }

    /// Binary search for the horizon crossing between `before` and `after`.
    fn refine_crossing(
        &self,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        rising: bool,
    ) -> Result<(DateTime<Utc>, f64), PredictError> {
        let mut low = before.max(self.start);
        let mut high = after;

        while (high - low).num_seconds() > FINE_STEP_SECONDS {
            let mid = low + (high - low) / 2;
            let above = self
                .propagator
                .look_angles_at(self.station, mid)?
                .elevation_deg
                >= HORIZON_ELEVATION;

            if above == rising {
                high = mid;
            } else {
                low = mid;
            }
        }

        let angles = self.propagator.look_angles_at(self.station, high)?;
        Ok((high, angles.azimuth_deg))
    }
}

fn close_pass(pass: OpenPass, los: DateTime<Utc>, los_az: f64) -> PassWindow {
    PassWindow {
        aos: pass.aos,
        los,
        tca: pass.max_el_time,
        max_elevation_deg: round2(pass.max_el),
        aos_azimuth_deg: round2(pass.aos_az),
        los_azimuth_deg: round2(los_az),
        duration_seconds: (los - pass.aos).num_seconds(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
