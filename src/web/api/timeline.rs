use axum::{extract::State, Json};

use crate::timeline::Milestone;
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/timeline",
    responses(
        (status = 200, description = "Station milestones, oldest first", body = Vec<Milestone>)
    ),
    tag = "timeline"
)]
pub async fn list_milestones(State(state): State<AppState>) -> Json<Vec<Milestone>> {
    Json(state.timeline.milestones.clone())
}
