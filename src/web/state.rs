use std::sync::Arc;

use crate::genai::Assistant;
use crate::telemetry::{ConditionsHandle, TelemetryHandle};
use crate::timeline::Timeline;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub telemetry: TelemetryHandle,
    pub conditions: Option<ConditionsHandle>,
    pub assistant: Arc<Assistant>,
    pub timeline: Arc<Timeline>,
}
