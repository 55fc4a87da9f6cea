use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::predict::OrbitPrediction;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PredictQuery {
    /// Horizon in hours; the configured default when omitted
    #[serde(default)]
    pub hours: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/api/predict/{id}",
    tag = "predict",
    params(
        ("id" = String, Path, description = "Catalog number"),
        PredictQuery
    ),
    responses(
        (status = 200, description = "Sampled ground track and next pass", body = OrbitPrediction),
        (status = 400, description = "Invalid id or horizon", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 422, description = "Elements could not be propagated", body = ErrorResponse),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    )
)]
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PredictQuery>,
) -> ApiResult<Json<OrbitPrediction>> {
    let hours = query.hours.unwrap_or(state.default_hours);
    Ok(Json(state.service.predict(&id, hours).await?))
}
