use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::moisture::MoistureStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    Sensor,
    Simulated,
}

/// One converted reading, as produced by the background reader.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub voltage: f64,
    pub moisture_percentage: f64,
    pub status: MoistureStatus,
    pub source: ReadingSource,
    pub taken_at: DateTime<Tz>,
}

/// Latest reading plus status, served by `/api/sensor-data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub voltage: f64,
    pub moisture_percentage: f64,
    pub status: MoistureStatus,
    pub last_updated: Option<String>,
    pub source: Option<ReadingSource>,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            voltage: 0.0,
            moisture_percentage: 0.0,
            status: MoistureStatus::Dry,
            last_updated: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub moisture: f64,
    pub voltage: f64,
}
