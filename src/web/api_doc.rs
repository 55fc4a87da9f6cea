use utoipa::OpenApi;

use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::positions::get_positions,
        super::api::tles::list_group,
        super::api::tles::get_tle,
        super::api::predict::get_prediction,
    ),
    components(
        schemas(
            ErrorResponse,
            crate::catalog::TleRecord,
            crate::catalog::Source,
            crate::catalog::SatelliteGroup,
            crate::predict::SatellitePosition,
            crate::predict::LookAngles,
            crate::predict::PassWindow,
            crate::predict::OrbitPrediction,
            crate::service::PositionBatch,
            crate::service::SatelliteFailure,
            crate::service::FailureKind,
        )
    ),
    info(
        title = "Orbstate API",
        description = "Current and predicted satellite positions from catalog element sets",
        version = "0.1.0"
    ),
    tags(
        (name = "positions", description = "Current positions"),
        (name = "tles", description = "Element sets"),
        (name = "predict", description = "Ground track prediction")
    )
)]
pub struct ApiDoc;
