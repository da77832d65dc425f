use std::time::Duration;

use super::error::GenAiError;
use super::transport::{HttpTransport, RawResponse, Transport};
use super::types::{GenerateRequest, GenerateResponse};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Returned when the service answers with JSON that carries no candidate text.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't make sense of the assistant's reply. Please try asking again.";

/// Exponential backoff without jitter: `initial_backoff * 2^n` before retry `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Where the key was expected to come from, used in the missing-key message.
    pub api_key_env: String,
    pub retry: RetryPolicy,
    pub system_instruction: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            retry: RetryPolicy::default(),
            system_instruction: None,
        }
    }
}

pub struct GenerativeClient<T = HttpTransport> {
    transport: T,
    settings: ClientSettings,
}

impl GenerativeClient<HttpTransport> {
    pub fn http(settings: ClientSettings, timeout: Duration) -> Result<Self, GenAiError> {
        Ok(Self::new(HttpTransport::new(timeout)?, settings))
    }
}

impl<T: Transport> GenerativeClient<T> {
    pub fn new(transport: T, settings: ClientSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// Sends `prompt` and returns the first candidate's text, retrying
    /// transient failures per the configured [`RetryPolicy`]. Once retries are
    /// exhausted the last failure is returned as is.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenAiError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenAiError::EmptyPrompt);
        }
        let Some(api_key) = self.settings.api_key.as_deref() else {
            return Err(GenAiError::MissingCredential(
                self.settings.api_key_env.clone(),
            ));
        };

        let url = self.url();
        let request =
            GenerateRequest::from_prompt(prompt, self.settings.system_instruction.as_deref());
        let policy = self.settings.retry;

        let mut retry = 0;
        loop {
            let result = self
                .transport
                .post_json(&url, api_key, &request)
                .await
                .and_then(extract_answer);

            match result {
                Ok(answer) => return Ok(answer),
                Err(e) if e.is_retryable() && retry < policy.max_retries => {
                    let delay = policy.delay_for(retry);
                    log::warn!(
                        "Assistant request failed ({}), retry {}/{} in {:?}",
                        e,
                        retry + 1,
                        policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    log::error!("Assistant request failed after {} attempt(s): {}", retry + 1, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Interprets one exchange. Well-formed JSON without candidate text degrades
/// to [`FALLBACK_ANSWER`].
pub fn extract_answer(response: RawResponse) -> Result<String, GenAiError> {
    match response.status {
        429 => return Err(GenAiError::RateLimited),
        200..=299 => {}
        status => {
            return Err(GenAiError::Status {
                status,
                body: response.body,
            })
        }
    }

    let value: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|e| GenAiError::Decode(e.to_string()))?;

    match serde_json::from_value::<GenerateResponse>(value) {
        Ok(parsed) => match parsed.first_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                log::warn!("Assistant response has no candidate text, using fallback");
                Ok(FALLBACK_ANSWER.to_string())
            }
        },
        Err(e) => {
            log::warn!("Unexpected assistant response shape ({}), using fallback", e);
            Ok(FALLBACK_ANSWER.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tokio::time::Instant;

    pub(crate) const ANSWER: &str =
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Over the Pacific."}]}}]}"#;

    /// Replays scripted outcomes and records when each attempt happened.
    pub(crate) struct Scripted {
        outcomes: StdMutex<VecDeque<Result<RawResponse, GenAiError>>>,
        pub(crate) calls: StdMutex<Vec<(Instant, GenerateRequest)>>,
        pub(crate) latency: Duration,
    }

    impl Scripted {
        pub(crate) fn new(outcomes: Vec<Result<RawResponse, GenAiError>>) -> Self {
            Self {
                outcomes: StdMutex::new(outcomes.into()),
                calls: StdMutex::new(Vec::new()),
                latency: Duration::ZERO,
            }
        }

        pub(crate) fn attempts(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }
    }

    impl Transport for Scripted {
        async fn post_json(
            &self,
            _url: &str,
            _api_key: &str,
            request: &GenerateRequest,
        ) -> Result<RawResponse, GenAiError> {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), request.clone()));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenAiError::Transport("script exhausted".into())))
        }
    }

    impl GenerativeClient<Scripted> {
        pub(crate) fn transport_calls(&self) -> usize {
            self.transport.calls.lock().unwrap().len()
        }
    }

    pub(crate) fn settings() -> ClientSettings {
        ClientSettings {
            api_key: Some("test-key".into()),
            ..ClientSettings::default()
        }
    }

    fn gaps(attempts: &[Instant]) -> Vec<Duration> {
        attempts.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn url_targets_model() {
        let client = GenerativeClient::new(Scripted::new(vec![]), settings());
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success() {
        let client = GenerativeClient::new(
            Scripted::new(vec![
                Ok(RawResponse::new(429, "")),
                Ok(RawResponse::new(200, ANSWER)),
            ]),
            settings(),
        );

        let answer = client.generate("Where is the ISS?").await.unwrap();
        assert_eq!(answer, "Over the Pacific.");

        let attempts = client.transport.attempts();
        assert_eq!(gaps(&attempts), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let client = GenerativeClient::new(
            Scripted::new(vec![
                Ok(RawResponse::new(429, "")),
                Err(GenAiError::Transport("connection reset".into())),
                Ok(RawResponse::new(429, "")),
                Ok(RawResponse::new(200, ANSWER)),
            ]),
            settings(),
        );

        assert_eq!(client.generate("hello").await.unwrap(), "Over the Pacific.");
        assert_eq!(
            gaps(&client.transport.attempts()),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_failure_unchanged() {
        let client = GenerativeClient::new(
            Scripted::new(vec![
                Ok(RawResponse::new(429, "")),
                Ok(RawResponse::new(429, "")),
                Ok(RawResponse::new(429, "")),
                Err(GenAiError::Transport("dns lookup failed".into())),
            ]),
            settings(),
        );

        let err = client.generate("hello").await.unwrap_err();
        assert_eq!(err, GenAiError::Transport("dns lookup failed".into()));
        assert_eq!(client.transport.attempts().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn respects_configured_retry_count() {
        let mut settings = settings();
        settings.retry = RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(250),
        };
        let client = GenerativeClient::new(
            Scripted::new(vec![
                Ok(RawResponse::new(503, "unavailable")),
                Ok(RawResponse::new(429, "")),
                Ok(RawResponse::new(200, ANSWER)),
            ]),
            settings,
        );

        assert_eq!(client.generate("hello").await, Err(GenAiError::RateLimited));
        assert_eq!(
            gaps(&client.transport.attempts()),
            vec![Duration::from_millis(250)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let client = GenerativeClient::new(
            Scripted::new(vec![Ok(RawResponse::new(400, "bad request"))]),
            settings(),
        );

        let err = client.generate("hello").await.unwrap_err();
        assert_eq!(
            err,
            GenAiError::Status {
                status: 400,
                body: "bad request".into()
            }
        );
        assert_eq!(client.transport.attempts().len(), 1);
    }

    #[tokio::test]
    async fn malformed_envelope_yields_fallback() {
        for body in [
            r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#,
            r#"{"candidates": "not a list"}"#,
            r#"{"candidates": [{"content": {"parts": []}}]}"#,
        ] {
            let client = GenerativeClient::new(
                Scripted::new(vec![Ok(RawResponse::new(200, body))]),
                settings(),
            );
            assert_eq!(client.generate("hello").await.unwrap(), FALLBACK_ANSWER);
        }
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let client = GenerativeClient::new(
            Scripted::new(vec![Ok(RawResponse::new(200, "<html>oops</html>"))]),
            settings(),
        );
        assert!(matches!(
            client.generate("hello").await,
            Err(GenAiError::Decode(_))
        ));
        assert_eq!(client.transport.attempts().len(), 1);
    }

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let settings = ClientSettings {
            api_key_env: "ISS_TEST_KEY".into(),
            ..ClientSettings::default()
        };
        let client = GenerativeClient::new(Scripted::new(vec![]), settings);

        let err = client.generate("hello").await.unwrap_err();
        assert_eq!(err, GenAiError::MissingCredential("ISS_TEST_KEY".into()));
        assert!(err.to_string().contains("ISS_TEST_KEY"));
        assert!(client.transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let client = GenerativeClient::new(Scripted::new(vec![]), settings());
        assert_eq!(client.generate("   ").await, Err(GenAiError::EmptyPrompt));
        assert!(client.transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn sends_trimmed_prompt_and_system_instruction() {
        let mut settings = settings();
        settings.system_instruction = Some("You are a space guide.".into());
        let client = GenerativeClient::new(
            Scripted::new(vec![Ok(RawResponse::new(200, ANSWER))]),
            settings,
        );

        client.generate("  How fast is it?  ").await.unwrap();
        let calls = client.transport.calls.lock().unwrap();
        let request = &calls[0].1;
        assert_eq!(
            request.contents[0].parts[0].text.as_deref(),
            Some("How fast is it?")
        );
        assert!(request.system_instruction.is_some());
    }
}
