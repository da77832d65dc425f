use axum::{routing::get, routing::post, Router};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::genai::{Assistant, CoalescingClient, GenAiError, GenerativeClient};
use crate::telemetry::{
    ConditionsClient, ConditionsMonitor, HttpTelemetrySource, TelemetryError, TelemetryPoller,
};
use crate::timeline::{Timeline, TimelineError};

use super::api::chat as chat_handlers;
use super::api::telemetry as telemetry_handlers;
use super::api::timeline as timeline_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;
use super::ui::handlers as ui_handlers;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("assistant: {0}")]
    Assistant(#[from] GenAiError),
    #[error("timeline: {0}")]
    Timeline(#[from] TimelineError),
}

pub fn build_assistant(config: &Config) -> Result<Assistant, GenAiError> {
    let settings = config.assistant.client_settings();
    if settings.api_key.is_none() {
        log::warn!(
            "{} is not set, chat requests will be answered with a configuration notice",
            settings.api_key_env
        );
    }
    let client = GenerativeClient::http(settings, config.assistant.request_timeout)?;
    Ok(Assistant::new(
        CoalescingClient::new(client),
        config.assistant.live_context,
    ))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        // UI routes
        .route("/", get(ui_handlers::dashboard))
        .route("/timeline", get(ui_handlers::timeline))
        // Telemetry API endpoints
        .route("/api/telemetry/current", get(telemetry_handlers::current))
        .route("/api/telemetry/status", get(telemetry_handlers::status))
        .route("/api/telemetry/trails", get(telemetry_handlers::trails))
        .route("/api/conditions", get(telemetry_handlers::conditions))
        // Chat API endpoints
        .route("/api/chat", post(chat_handlers::chat))
        // Timeline API endpoints
        .route("/api/timeline", get(timeline_handlers::list_milestones))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    if let Some(dir) = state.config.web.static_dir.as_deref() {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();

    let mut poller = TelemetryPoller::new(
        config.telemetry.interval,
        config.telemetry.projection(),
        config.telemetry.trail_capacity,
    );
    let source = HttpTelemetrySource::new(
        &config.telemetry.endpoint,
        config.telemetry.request_timeout,
    )?;
    log::info!("Polling telemetry from {}", source.url());
    poller.start(source)?;

    let mut monitor = match &config.conditions {
        Some(conditions) => {
            let mut monitor = ConditionsMonitor::new(conditions.interval);
            let client = ConditionsClient::new(&conditions.endpoint, conditions.request_timeout)?;
            monitor.start(client, poller.handle())?;
            Some(monitor)
        }
        None => None,
    };

    let timeline = Timeline::load(config.timeline.file.as_deref().map(Path::new))?;
    if timeline.is_empty() {
        log::warn!("Timeline has no milestones");
    } else {
        log::info!("Loaded {} timeline milestones", timeline.len());
    }

    let state = AppState {
        assistant: Arc::new(build_assistant(&config)?),
        telemetry: poller.handle(),
        conditions: monitor.as_ref().map(ConditionsMonitor::handle),
        timeline: Arc::new(timeline),
        config: Arc::new(config),
    };

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    poller.stop().await;
    if let Some(monitor) = monitor.as_mut() {
        monitor.stop().await;
    }
    let status = poller.status();
    log::info!(
        "Server stopped after {} telemetry polls ({} failed)",
        status.successes + status.failures,
        status.failures
    );

    served.map_err(ServerError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
