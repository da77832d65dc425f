use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("poller already running")]
    AlreadyRunning,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("endpoint returned HTTP {0}")]
    Status(u16),
    #[error("invalid sample: {0}")]
    InvalidSample(String),
    #[error("http client error: {0}")]
    Client(String),
}
