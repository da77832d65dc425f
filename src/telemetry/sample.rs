use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::error::TelemetryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Daylight,
    Eclipsed,
}

/// One position report for the station, as published by the telemetry endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TelemetrySample {
    /// Degrees, -90..=90.
    pub latitude: f64,
    /// Degrees, -180..=180.
    pub longitude: f64,
    /// Kilometres above the surface.
    pub altitude: f64,
    /// Kilometres per hour.
    pub velocity: f64,
    pub visibility: Visibility,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64)]
    pub timestamp: DateTime<Utc>,
    /// Diameter of the visibility footprint in kilometres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<f64>,
}

impl TelemetrySample {
    pub fn from_json(body: &str) -> Result<Self, TelemetryError> {
        let sample: TelemetrySample = serde_json::from_str(body)
            .map_err(|e| TelemetryError::InvalidSample(e.to_string()))?;
        sample.validate()
    }

    pub fn validate(self) -> Result<Self, TelemetryError> {
        check_range("latitude", self.latitude, -90.0, 90.0)?;
        check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_range("altitude", self.altitude, 0.0, f64::MAX)?;
        check_range("velocity", self.velocity, 0.0, f64::MAX)?;
        Ok(self)
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), TelemetryError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TelemetryError::InvalidSample(format!(
            "{field} {value} outside {min}..={max}"
        )))
    }
}
