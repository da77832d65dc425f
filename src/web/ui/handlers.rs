use axum::{extract::State, response::IntoResponse};

use crate::web::state::AppState;

use super::templates::{DashboardTemplate, TimelineTemplate};

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    DashboardTemplate {
        status: state.telemetry.status(),
        conditions: state.conditions.as_ref().and_then(|c| c.latest()),
        trail_points: state.telemetry.trails().orbit_path.len(),
    }
}

pub async fn timeline(State(state): State<AppState>) -> impl IntoResponse {
    TimelineTemplate {
        milestones: state.timeline.milestones.clone(),
    }
}
