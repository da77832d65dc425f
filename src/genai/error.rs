use thiserror::Error;

/// Failures of the generative-answer client. `Clone` so that coalesced
/// callers waiting on the same prompt can all receive the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenAiError {
    #[error("no API key configured for the assistant; set the {0} environment variable")]
    MissingCredential(String),
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("rate limited by the language model service")]
    RateLimited,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("language model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response body is not JSON: {0}")]
    Decode(String),
}

impl GenAiError {
    /// Rate limiting, transport failures and server-side errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenAiError::RateLimited | GenAiError::Transport(_) => true,
            GenAiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GenAiError {
    fn from(err: reqwest::Error) -> Self {
        GenAiError::Transport(err.to_string())
    }
}
