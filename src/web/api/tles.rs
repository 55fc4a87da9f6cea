use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;
use utoipa::IntoParams;

use crate::catalog::{SatelliteGroup, TleRecord};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

pub const DEFAULT_GROUP_LIMIT: usize = 100;
pub const MAX_GROUP_LIMIT: usize = 1000;

#[derive(Debug, Deserialize, IntoParams)]
pub struct GroupQuery {
    /// Group name, e.g. `stations` or `gps-ops`
    pub group: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/tles",
    tag = "tles",
    params(GroupQuery),
    responses(
        (status = 200, description = "Element sets of the group; empty when the catalog is unavailable", body = Vec<TleRecord>),
        (status = 400, description = "Unknown group or bad limit", body = ErrorResponse)
    )
)]
pub async fn list_group(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> ApiResult<Json<Vec<TleRecord>>> {
    let group = SatelliteGroup::from_str(query.group.trim())
        .map_err(|_| ApiError::Validation(format!("unknown group: {}", query.group)))?;
    let limit = query.limit.unwrap_or(DEFAULT_GROUP_LIMIT);
    if limit == 0 || limit > MAX_GROUP_LIMIT {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_GROUP_LIMIT
        )));
    }

    Ok(Json(state.service.group_listing(group, limit).await))
}

#[utoipa::path(
    get,
    path = "/api/tles/{id}",
    tag = "tles",
    params(("id" = String, Path, description = "Catalog number")),
    responses(
        (status = 200, description = "Current element set", body = TleRecord),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    )
)]
pub async fn get_tle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TleRecord>> {
    Ok(Json(state.service.tle(&id).await?))
}
