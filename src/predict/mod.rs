mod error;
pub mod frames;
mod ground_station;
mod pass_finder;
mod prediction;
mod propagation;
mod types;

pub use error::PredictError;
pub use ground_station::GroundStation;
pub use pass_finder::{find_next_pass, find_passes};
pub use prediction::{
    check_horizon, predict, DEFAULT_INTERVAL_MINUTES, MAX_HORIZON_HOURS, MAX_SAMPLES,
};
pub use propagation::{propagate_one, Propagator, StateVector};
pub use types::{LookAngles, OrbitPrediction, PassWindow, SatellitePosition};
