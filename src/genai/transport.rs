use std::future::Future;
use std::time::Duration;

use super::error::GenAiError;
use super::types::GenerateRequest;

/// Status and body of one HTTP exchange, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One outbound POST to the language model service.
pub trait Transport: Send + Sync + 'static {
    fn post_json(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<RawResponse, GenAiError>> + Send;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, GenAiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerateRequest,
    ) -> Result<RawResponse, GenAiError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse::new(status, body))
    }
}
