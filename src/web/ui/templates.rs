use askama::Template;
use askama_web::WebTemplate;

use crate::telemetry::{GroundConditions, TelemetryStatus};
use crate::timeline::Milestone;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub status: TelemetryStatus,
    pub conditions: Option<GroundConditions>,
    pub trail_points: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "timeline.html")]
pub struct TimelineTemplate {
    pub milestones: Vec<Milestone>,
}
