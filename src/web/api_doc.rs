use utoipa::OpenApi;

use super::api::chat::{ChatRequest, ChatResponse};
use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::telemetry::current,
        super::api::telemetry::status,
        super::api::telemetry::trails,
        super::api::telemetry::conditions,
        super::api::chat::chat,
        super::api::timeline::list_milestones,
    ),
    components(
        schemas(
            ChatRequest,
            ChatResponse,
            ErrorResponse,
            crate::telemetry::TelemetrySample,
            crate::telemetry::Visibility,
            crate::telemetry::TelemetryStatus,
            crate::telemetry::PollerMode,
            crate::telemetry::Trails,
            crate::telemetry::GroundConditions,
            crate::telemetry::ConditionsStatus,
            crate::timeline::Milestone,
        )
    ),
    info(
        title = "ISS-O-Mat API",
        description = "Live International Space Station telemetry, trails and assistant",
        version = "0.1.0"
    ),
    tags(
        (name = "telemetry", description = "Station position and surroundings"),
        (name = "chat", description = "Generative assistant"),
        (name = "timeline", description = "Station history")
    )
)]
pub struct ApiDoc;
