use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::genai::{self, ClientSettings, RetryPolicy};
use crate::telemetry::{self, Projection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub telemetry: TelemetryConfig,
    pub assistant: AssistantConfig,
    pub conditions: Option<ConditionsConfig>,
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
    /// Directory with the browser client, served under `/static`.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub endpoint: String,
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    pub trail_capacity: usize,
    pub globe_radius: f64,
    pub ground_lift: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let projection = Projection::default();
        Self {
            endpoint: telemetry::DEFAULT_ENDPOINT.to_string(),
            interval: telemetry::DEFAULT_INTERVAL,
            request_timeout: Duration::from_secs(4),
            trail_capacity: telemetry::DEFAULT_TRAIL_CAPACITY,
            globe_radius: projection.globe_radius,
            ground_lift: projection.ground_lift,
        }
    }
}

impl TelemetryConfig {
    pub fn projection(&self) -> Projection {
        Projection {
            globe_radius: self.globe_radius,
            ground_lift: self.ground_lift,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_retries: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub initial_backoff: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    pub system_instruction: Option<String>,
    /// Prefix prompts with the current ISS position.
    pub live_context: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            endpoint: genai::DEFAULT_ENDPOINT.to_string(),
            model: genai::DEFAULT_MODEL.to_string(),
            api_key_env: genai::DEFAULT_API_KEY_ENV.to_string(),
            max_retries: retry.max_retries,
            initial_backoff: retry.initial_backoff,
            request_timeout: Duration::from_secs(30),
            system_instruction: Some(
                "You are a friendly guide to the International Space Station. \
                 Answer concisely."
                    .to_string(),
            ),
            live_context: true,
        }
    }
}

impl AssistantConfig {
    /// Client settings with the API key taken from the environment.
    pub fn client_settings(&self) -> ClientSettings {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        ClientSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            api_key_env: self.api_key_env.clone(),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                initial_backoff: self.initial_backoff,
            },
            system_instruction: self.system_instruction.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConditionsConfig {
    pub endpoint: String,
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
}

impl Default for ConditionsConfig {
    fn default() -> Self {
        Self {
            endpoint: telemetry::conditions::DEFAULT_ENDPOINT.to_string(),
            interval: telemetry::conditions::DEFAULT_INTERVAL,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// YAML milestone list replacing the builtin one.
    pub file: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document is a config with every default.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.telemetry;
        if t.interval.is_zero() {
            return Err(ConfigError::Invalid("telemetry.interval must be > 0".into()));
        }
        if t.trail_capacity == 0 {
            return Err(ConfigError::Invalid("telemetry.trail_capacity must be > 0".into()));
        }
        if !(t.globe_radius > 0.0 && t.ground_lift > 0.0) {
            return Err(ConfigError::Invalid(
                "telemetry.globe_radius and telemetry.ground_lift must be > 0".into(),
            ));
        }
        if self.assistant.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "assistant.api_key_env must name an environment variable".into(),
            ));
        }
        if let Some(c) = &self.conditions {
            if c.interval.is_zero() {
                return Err(ConfigError::Invalid("conditions.interval must be > 0".into()));
            }
        }
        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
