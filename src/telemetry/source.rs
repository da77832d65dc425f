use std::future::Future;
use std::time::Duration;

use super::error::TelemetryError;
use super::sample::TelemetrySample;

pub const DEFAULT_ENDPOINT: &str = "https://api.wheretheiss.at/v1/satellites/25544";

/// Anything that can produce the station's current position.
pub trait TelemetrySource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<TelemetrySample, TelemetryError>> + Send;
}

pub struct HttpTelemetrySource {
    client: reqwest::Client,
    url: String,
}

impl HttpTelemetrySource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::Client(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TelemetrySource for HttpTelemetrySource {
    async fn fetch(&self) -> Result<TelemetrySample, TelemetryError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        TelemetrySample::from_json(&body)
    }
}
