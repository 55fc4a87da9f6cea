use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogError;
use crate::predict::PredictError;
use crate::service::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Propagation(String),
    Unavailable(String),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Catalog(CatalogError::InvalidId(_)) => ApiError::Validation(e.to_string()),
            ServiceError::Catalog(CatalogError::NotFound(_)) => ApiError::NotFound(e.to_string()),
            ServiceError::Catalog(_) => ApiError::Unavailable(e.to_string()),
            ServiceError::Predict(
                PredictError::InvalidHorizon(_) | PredictError::InvalidInterval(_),
            ) => ApiError::Validation(e.to_string()),
            ServiceError::Predict(_) => ApiError::Propagation(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_message("validation_failed", &msg),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::with_message("satellite_not_found", &msg),
            ),
            ApiError::Propagation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::with_message("propagation_failed", &msg),
            ),
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::with_message("catalog_unavailable", &msg),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                ServiceError::Catalog(CatalogError::InvalidId("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Catalog(CatalogError::NotFound("CATNR=1".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Catalog(CatalogError::Timeout),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::Predict(PredictError::InvalidHorizon(0.0)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Predict(PredictError::InvalidElements {
                    satellite: "1".into(),
                    message: "bad".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
