use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::service::PositionBatch;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

pub const MAX_IDS_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PositionsQuery {
    /// Comma separated catalog numbers
    pub ids: String,
    /// Instant to propagate to (RFC3339); now when omitted
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

impl PositionsQuery {
    fn parse_ids(&self) -> Result<Vec<String>, ApiError> {
        let ids: Vec<String> = self
            .ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();
        if ids.is_empty() {
            return Err(ApiError::Validation("ids must name at least one satellite".into()));
        }
        if ids.len() > MAX_IDS_PER_REQUEST {
            return Err(ApiError::Validation(format!(
                "at most {} ids per request",
                MAX_IDS_PER_REQUEST
            )));
        }
        Ok(ids)
    }
}

#[utoipa::path(
    get,
    path = "/api/positions",
    tag = "positions",
    params(PositionsQuery),
    responses(
        (status = 200, description = "Positions and per-satellite failures", body = PositionBatch),
        (status = 400, description = "Invalid parameters", body = ErrorResponse)
    )
)]
pub async fn get_positions(
    State(state): State<AppState>,
    Query(query): Query<PositionsQuery>,
) -> ApiResult<Json<PositionBatch>> {
    let ids = query.parse_ids()?;
    let batch = match query.at {
        Some(at) => state.service.positions_at(&ids, at).await,
        None => state.service.current_positions(&ids).await,
    };
    Ok(Json(batch))
}
