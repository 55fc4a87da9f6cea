mod error;
mod fallback;
mod orbital_service;
mod types;

pub use error::ServiceError;
pub use fallback::{
    fallback_position, fallback_record, reference_record, FallbackPolicy, GroupFallback,
    IdFallback, REFERENCE_LINE1, REFERENCE_LINE2, REFERENCE_NAME,
};
pub use orbital_service::{OrbitalStateService, ServiceSettings};
pub use types::{FailureKind, PositionBatch, SatelliteFailure};
