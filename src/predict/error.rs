use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PredictError {
    #[error("Invalid elements for {satellite}: {message}")]
    InvalidElements { satellite: String, message: String },
    #[error("Propagation failed for {satellite} at {at}: {message}")]
    Propagation {
        satellite: String,
        at: DateTime<Utc>,
        message: String,
    },
    #[error("{satellite} has decayed at {at} (altitude {altitude_km:.1} km)")]
    Decayed {
        satellite: String,
        at: DateTime<Utc>,
        altitude_km: f64,
    },
    #[error("Invalid prediction horizon: {0} hours")]
    InvalidHorizon(f64),
    #[error("Invalid sampling interval: {0} minutes")]
    InvalidInterval(f64),
}
