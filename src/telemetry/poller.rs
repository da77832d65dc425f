use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::error::TelemetryError;
use super::geo::{Point3, Projection};
use super::sample::TelemetrySample;
use super::source::TelemetrySource;
use super::trail::TrailBuffer;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TRAIL_CAPACITY: usize = 720;

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollerMode {
    Idle,
    Running {
        since: DateTime<Utc>,
        interval_ms: u64,
    },
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TelemetryStatus {
    pub mode: PollerMode,
    pub current: Option<TelemetrySample>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Trails {
    #[schema(value_type = Vec<Vec<f64>>)]
    pub orbit_path: Vec<Point3>,
    #[schema(value_type = Vec<Vec<f64>>)]
    pub ground_track: Vec<Point3>,
}

#[derive(Debug)]
struct Shared {
    status: TelemetryStatus,
    orbit_path: TrailBuffer,
    ground_track: TrailBuffer,
    projection: Projection,
}

impl Shared {
    fn new(projection: Projection, trail_capacity: usize) -> Self {
        Self {
            status: TelemetryStatus {
                mode: PollerMode::Idle,
                current: None,
                last_error: None,
                last_error_at: None,
                successes: 0,
                failures: 0,
            },
            orbit_path: TrailBuffer::new(trail_capacity),
            ground_track: TrailBuffer::new(trail_capacity),
            projection,
        }
    }

    fn apply(&mut self, result: Result<TelemetrySample, TelemetryError>) {
        match result {
            Ok(sample) => {
                self.orbit_path.push(self.projection.orbit_point(
                    sample.latitude,
                    sample.longitude,
                    sample.altitude,
                ));
                self.ground_track
                    .push(self.projection.ground_point(sample.latitude, sample.longitude));
                self.status.current = Some(sample);
                self.status.last_error = None;
                self.status.last_error_at = None;
                self.status.successes += 1;
            }
            Err(e) => {
                log::warn!("Telemetry poll failed: {}", e);
                self.status.last_error = Some(e.to_string());
                self.status.last_error_at = Some(Utc::now());
                self.status.failures += 1;
            }
        }
    }
}

/// Read-only view of the poller state, cheap to clone into handlers.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    shared: Arc<StdMutex<Shared>>,
}

impl TelemetryHandle {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> TelemetryStatus {
        self.lock().status.clone()
    }

    pub fn current(&self) -> Option<TelemetrySample> {
        self.lock().status.current.clone()
    }

    pub fn trails(&self) -> Trails {
        let locked = self.lock();
        Trails {
            orbit_path: locked.orbit_path.to_vec(),
            ground_track: locked.ground_track.to_vec(),
        }
    }
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

pub struct TelemetryPoller {
    handle: TelemetryHandle,
    period: Duration,
    worker: Option<WorkerHandle>,
}

impl TelemetryPoller {
    pub fn new(period: Duration, projection: Projection, trail_capacity: usize) -> Self {
        Self {
            handle: TelemetryHandle {
                shared: Arc::new(StdMutex::new(Shared::new(projection, trail_capacity))),
            },
            period,
            worker: None,
        }
    }

    pub fn handle(&self) -> TelemetryHandle {
        self.handle.clone()
    }

    pub fn status(&self) -> TelemetryStatus {
        self.handle.status()
    }

    pub fn start<S: TelemetrySource>(&mut self, source: S) -> Result<(), TelemetryError> {
        if self.worker.is_some() {
            return Err(TelemetryError::AlreadyRunning);
        }

        let handle = self.handle.clone();
        let period = self.period;
        let (stop_tx, stop_rx) = oneshot::channel();

        handle.lock().status.mode = PollerMode::Running {
            since: Utc::now(),
            interval_ms: u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        };

        let join = tokio::spawn(run_poll_loop(handle, source, period, stop_rx));
        self.worker = Some(WorkerHandle { stop_tx, join });

        log::info!("Telemetry poller started ({:?} interval)", period);
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
            log::info!("Telemetry poller stopped");
        }
        self.handle.lock().status.mode = PollerMode::Idle;
    }
}

async fn run_poll_loop<S: TelemetrySource>(
    handle: TelemetryHandle,
    source: S,
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

        let result = tokio::select! {
            result = source.fetch() => result,
            _ = &mut stop_rx => break,
        };

        handle.lock().apply(result);
    }

    handle.lock().status.mode = PollerMode::Idle;
}
