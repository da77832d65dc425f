pub mod conditions;
mod error;
mod geo;
mod poller;
mod sample;
mod source;
mod trail;

pub use conditions::{
    ConditionsClient, ConditionsHandle, ConditionsMonitor, ConditionsStatus, GroundConditions,
};
pub use error::TelemetryError;
pub use geo::Projection;
pub use poller::{
    PollerMode, TelemetryHandle, TelemetryPoller, TelemetryStatus, Trails, DEFAULT_INTERVAL,
    DEFAULT_TRAIL_CAPACITY,
};
pub use sample::{TelemetrySample, Visibility};
pub use source::{HttpTelemetrySource, TelemetrySource, DEFAULT_ENDPOINT};
