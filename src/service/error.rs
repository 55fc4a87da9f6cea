use thiserror::Error;

use crate::catalog::CatalogError;
use crate::predict::PredictError;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Predict(#[from] PredictError),
}
