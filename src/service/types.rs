use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{CatalogError, Source};
use crate::predict::{PredictError, SatellitePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidId,
    NotFound,
    InvalidData,
    Unreachable,
    Propagation,
}

impl From<&CatalogError> for FailureKind {
    fn from(err: &CatalogError) -> Self {
        match err {
            CatalogError::InvalidId(_) => FailureKind::InvalidId,
            CatalogError::NotFound(_) => FailureKind::NotFound,
            CatalogError::InvalidResponse(_) | CatalogError::InvalidTle { .. } => {
                FailureKind::InvalidData
            }
            CatalogError::Timeout | CatalogError::Transport(_) | CatalogError::Status(_) => {
                FailureKind::Unreachable
            }
        }
    }
}

/// Why one satellite of a batch has no position.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SatelliteFailure {
    pub satellite_id: String,
    pub kind: FailureKind,
    pub message: String,
}

impl SatelliteFailure {
    pub fn from_catalog(satellite_id: &str, err: &CatalogError) -> Self {
        Self {
            satellite_id: satellite_id.to_string(),
            kind: err.into(),
            message: err.to_string(),
        }
    }

    pub fn from_predict(satellite_id: &str, err: &PredictError) -> Self {
        Self {
            satellite_id: satellite_id.to_string(),
            kind: FailureKind::Propagation,
            message: err.to_string(),
        }
    }
}

/// Positions for a list of ids, in request order, plus per-id failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PositionBatch {
    pub positions: Vec<SatellitePosition>,
    pub failures: Vec<SatelliteFailure>,
}

impl PositionBatch {
    pub fn position(&self, satellite_id: &str) -> Option<&SatellitePosition> {
        self.positions.iter().find(|p| p.satellite_id == satellite_id)
    }

    /// Contains synthetic data or ids the catalog could not be asked about.
    pub fn is_degraded(&self) -> bool {
        self.positions.iter().any(|p| p.source == Source::Fallback)
            || self.failures.iter().any(|f| f.kind == FailureKind::Unreachable)
    }
}
