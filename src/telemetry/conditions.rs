//! Weather at the sub-satellite point, refreshed on its own timer.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::error::TelemetryError;
use super::poller::TelemetryHandle;

pub const DEFAULT_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct GroundConditions {
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: u8,
    pub description: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct ConditionsStatus {
    pub latest: Option<GroundConditions>,
    pub last_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    latitude: f64,
    longitude: f64,
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

/// Parses an Open-Meteo forecast body requested with
/// `current=temperature_2m,wind_speed_10m,weather_code`.
pub fn parse_forecast(body: &str) -> Result<GroundConditions, TelemetryError> {
    let response: ForecastResponse =
        serde_json::from_str(body).map_err(|e| TelemetryError::InvalidSample(e.to_string()))?;
    // Open-Meteo reports GMT times without an offset, minute resolution.
    let observed_at = NaiveDateTime::parse_from_str(&response.current.time, "%Y-%m-%dT%H:%M")
        .map_err(|e| TelemetryError::InvalidSample(format!("time: {e}")))?
        .and_utc();

    Ok(GroundConditions {
        latitude: response.latitude,
        longitude: response.longitude,
        temperature_c: response.current.temperature_2m,
        wind_speed_kmh: response.current.wind_speed_10m,
        weather_code: response.current.weather_code,
        description: describe_weather_code(response.current.weather_code).to_string(),
        observed_at,
    })
}

/// WMO weather interpretation codes as used by Open-Meteo.
pub fn describe_weather_code(code: u8) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51 | 53 | 55 => "drizzle",
        56 | 57 => "freezing drizzle",
        61 | 63 | 65 => "rain",
        66 | 67 => "freezing rain",
        71 | 73 | 75 => "snow",
        77 => "snow grains",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95 => "thunderstorm",
        96 | 99 => "thunderstorm with hail",
        _ => "unknown",
    }
}

/// Anything that can report the weather at a point on the ground.
pub trait ConditionsSource: Send + Sync + 'static {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<GroundConditions, TelemetryError>> + Send;
}

pub struct ConditionsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ConditionsClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl ConditionsSource for ConditionsClient {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<GroundConditions, TelemetryError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("latitude", format!("{latitude:.4}")),
                ("longitude", format!("{longitude:.4}")),
                ("current", "temperature_2m,wind_speed_10m,weather_code".to_string()),
                ("wind_speed_unit", "kmh".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        parse_forecast(&response.text().await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConditionsHandle {
    shared: Arc<StdMutex<ConditionsStatus>>,
}

impl ConditionsHandle {
    fn lock(&self) -> MutexGuard<'_, ConditionsStatus> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> ConditionsStatus {
        self.lock().clone()
    }

    pub fn latest(&self) -> Option<GroundConditions> {
        self.lock().latest.clone()
    }

    fn apply(&self, result: Result<GroundConditions, TelemetryError>) {
        let mut locked = self.lock();
        match result {
            Ok(conditions) => {
                locked.latest = Some(conditions);
                locked.last_error = None;
            }
            Err(e) => {
                log::warn!("Ground conditions refresh failed: {}", e);
                locked.last_error = Some(e.to_string());
            }
        }
    }
}

pub struct ConditionsMonitor {
    handle: ConditionsHandle,
    period: Duration,
    worker: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl ConditionsMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            handle: ConditionsHandle::default(),
            period,
            worker: None,
        }
    }

    pub fn handle(&self) -> ConditionsHandle {
        self.handle.clone()
    }

    pub fn start<S: ConditionsSource>(
        &mut self,
        source: S,
        telemetry: TelemetryHandle,
    ) -> Result<(), TelemetryError> {
        if self.worker.is_some() {
            return Err(TelemetryError::AlreadyRunning);
        }
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_conditions_loop(
            self.handle.clone(),
            source,
            telemetry,
            self.period,
            stop_rx,
        ));
        self.worker = Some((stop_tx, join));
        log::info!("Ground conditions monitor started ({:?} interval)", self.period);
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some((stop_tx, join)) = self.worker.take() {
            let _ = stop_tx.send(());
            let _ = join.await;
        }
    }
}

async fn run_conditions_loop<S: ConditionsSource>(
    handle: ConditionsHandle,
    source: S,
    telemetry: TelemetryHandle,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut stop_rx => break,
        }

        let Some(sample) = telemetry.current() else {
            log::debug!("No telemetry yet, skipping ground conditions refresh");
            continue;
        };

        let result = tokio::select! {
            result = source.fetch(sample.latitude, sample.longitude) => result,
            _ = &mut stop_rx => break,
        };
        handle.apply(result);
    }
}
