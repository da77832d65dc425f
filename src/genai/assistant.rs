use uuid::Uuid;

use super::coalesce::CoalescingClient;
use super::error::GenAiError;
use super::transport::{HttpTransport, Transport};
use crate::telemetry::TelemetrySample;

/// Shown to chat users when the service could not produce an answer.
pub const APOLOGY: &str =
    "Sorry, I'm having trouble reaching the assistant right now. Please try again in a moment.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub answer: String,
    /// True when `answer` is an apology or configuration message rather than
    /// model output.
    pub degraded: bool,
}

/// Chat front for the generative client.
pub struct Assistant<T = HttpTransport> {
    client: CoalescingClient<T>,
    live_context: bool,
}

impl<T: Transport> Assistant<T> {
    pub fn new(client: CoalescingClient<T>, live_context: bool) -> Self {
        Self {
            client,
            live_context,
        }
    }

    pub fn client(&self) -> &CoalescingClient<T> {
        &self.client
    }

    /// Answers `prompt`, optionally grounded in the latest telemetry sample.
    /// Only an empty prompt is reported as an error; every other failure
    /// becomes user-facing text.
    pub async fn reply(
        &self,
        prompt: &str,
        sample: Option<&TelemetrySample>,
    ) -> Result<Reply, GenAiError> {
        if prompt.trim().is_empty() {
            return Err(GenAiError::EmptyPrompt);
        }

        let request_id = Uuid::new_v4();
        let full_prompt = match sample {
            Some(sample) if self.live_context => contextualize(prompt, sample),
            _ => prompt.trim().to_string(),
        };
        log::info!("Chat request {} ({} chars)", request_id, full_prompt.len());

        match self.client.generate(&full_prompt).await {
            Ok(answer) => Ok(Reply {
                answer,
                degraded: false,
            }),
            Err(e @ GenAiError::MissingCredential(_)) => {
                log::warn!("Chat request {}: {}", request_id, e);
                Ok(Reply {
                    answer: e.to_string(),
                    degraded: true,
                })
            }
            Err(GenAiError::EmptyPrompt) => Err(GenAiError::EmptyPrompt),
            Err(e) => {
                log::error!("Chat request {} failed: {}", request_id, e);
                Ok(Reply {
                    answer: APOLOGY.to_string(),
                    degraded: true,
                })
            }
        }
    }
}

/// Prefixes the user's question with the station's current state.
pub fn contextualize(prompt: &str, sample: &TelemetrySample) -> String {
    format!(
        "Live ISS telemetry at {}: latitude {:.2}°, longitude {:.2}°, altitude {:.1} km, \
         velocity {:.0} km/h, {}.\n\n{}",
        sample.timestamp.to_rfc3339(),
        sample.latitude,
        sample.longitude,
        sample.altitude,
        sample.velocity,
        sample.visibility,
        prompt.trim()
    )
}
