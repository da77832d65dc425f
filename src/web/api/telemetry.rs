use axum::{extract::State, Json};

use crate::telemetry::{ConditionsStatus, TelemetrySample, TelemetryStatus, Trails};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/telemetry/current",
    responses(
        (status = 200, description = "Latest telemetry sample, null before the first successful poll", body = Option<TelemetrySample>)
    ),
    tag = "telemetry"
)]
pub async fn current(State(state): State<AppState>) -> Json<Option<TelemetrySample>> {
    Json(state.telemetry.current())
}

#[utoipa::path(
    get,
    path = "/api/telemetry/status",
    responses(
        (status = 200, description = "Poller status including the last error", body = TelemetryStatus)
    ),
    tag = "telemetry"
)]
pub async fn status(State(state): State<AppState>) -> Json<TelemetryStatus> {
    Json(state.telemetry.status())
}

#[utoipa::path(
    get,
    path = "/api/telemetry/trails",
    responses(
        (status = 200, description = "Orbital path and ground track points, oldest first", body = Trails)
    ),
    tag = "telemetry"
)]
pub async fn trails(State(state): State<AppState>) -> Json<Trails> {
    Json(state.telemetry.trails())
}

#[utoipa::path(
    get,
    path = "/api/conditions",
    responses(
        (status = 200, description = "Latest weather at the sub-satellite point and the last refresh error", body = ConditionsStatus),
        (status = 404, description = "Ground conditions disabled", body = ErrorResponse)
    ),
    tag = "telemetry"
)]
pub async fn conditions(State(state): State<AppState>) -> ApiResult<Json<ConditionsStatus>> {
    let handle = state
        .conditions
        .as_ref()
        .ok_or(ApiError::NotFound("conditions_disabled"))?;
    Ok(Json(handle.status()))
}
