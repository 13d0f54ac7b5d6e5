use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{HistoryEntry, Measurement, SensorSnapshot};
use crate::utils::time;

/// Latest snapshot and a bounded history of recent readings, oldest first.
#[derive(Debug)]
pub struct SensorState {
    snapshot: SensorSnapshot,
    history: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SensorState {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshot: SensorSnapshot::default(),
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, measurement: &Measurement) {
        self.snapshot = SensorSnapshot {
            voltage: measurement.voltage,
            moisture_percentage: measurement.moisture_percentage,
            status: measurement.status,
            last_updated: Some(time::format_last_updated(&measurement.taken_at)),
            source: Some(measurement.source),
        };

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            timestamp: time::format_clock(&measurement.taken_at),
            moisture: measurement.moisture_percentage,
            voltage: measurement.voltage,
        });
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Sensor state shared between the background reader and the HTTP handlers.
///
/// A snapshot and its history entry are written under one lock, so readers
/// never observe one without the other.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<SensorState>>,
}

impl SharedState {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SensorState::new(capacity))),
        }
    }

    pub async fn record(&self, measurement: &Measurement) {
        self.inner.write().await.record(measurement);
    }

    pub async fn snapshot(&self) -> SensorSnapshot {
        self.inner.read().await.snapshot().clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.read().await.history().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MoistureStatus, ReadingSource};
    use chrono::{Duration, TimeZone, Utc};
    use chrono_tz::Tz;

    fn measurement(minute: i64, moisture: f64) -> Measurement {
        let tz: Tz = "US/Central".parse().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 7, 1, 17, 0, 0).unwrap();
        Measurement {
            voltage: 3.0 - moisture * 0.015,
            moisture_percentage: moisture,
            status: MoistureStatus::from_percentage(moisture),
            source: ReadingSource::Sensor,
            taken_at: (base + Duration::minutes(minute)).with_timezone(&tz),
        }
    }

    #[test]
    fn test_initial_snapshot() {
        let state = SensorState::new(30);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.voltage, 0.0);
        assert_eq!(snapshot.moisture_percentage, 0.0);
        assert_eq!(snapshot.status, MoistureStatus::Dry);
        assert_eq!(snapshot.last_updated, None);
        assert_eq!(state.history().count(), 0);
    }

    #[test]
    fn test_record_updates_snapshot() {
        let mut state = SensorState::new(30);
        state.record(&measurement(5, 40.0));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.moisture_percentage, 40.0);
        assert_eq!(snapshot.status, MoistureStatus::Moist);
        assert_eq!(snapshot.last_updated.as_deref(), Some("2024-07-01 12:05:00 CDT"));
        assert_eq!(snapshot.source, Some(ReadingSource::Sensor));

        let history: Vec<_> = state.history().collect();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, "12:05:00");
        assert_eq!(history[0].moisture, 40.0);
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut state = SensorState::new(3);
        for minute in 0..5 {
            state.record(&measurement(minute, minute as f64 * 10.0));
            assert!(state.history().count() <= 3);
        }

        let moisture: Vec<f64> = state.history().map(|entry| entry.moisture).collect();
        assert_eq!(moisture, vec![20.0, 30.0, 40.0]);
        assert_eq!(state.snapshot().moisture_percentage, 40.0);
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let mut state = SensorState::new(0);
        assert_eq!(state.capacity(), 1);
        state.record(&measurement(0, 10.0));
        state.record(&measurement(1, 20.0));

        let moisture: Vec<f64> = state.history().map(|entry| entry.moisture).collect();
        assert_eq!(moisture, vec![20.0]);
    }

    #[tokio::test]
    async fn test_shared_state_is_visible_to_clones() {
        let state = SharedState::new(2);
        let handler_view = state.clone();

        state.record(&measurement(0, 70.0)).await;

        let snapshot = handler_view.snapshot().await;
        assert_eq!(snapshot.status, MoistureStatus::Wet);
        assert_eq!(handler_view.history().await.len(), 1);
    }
}
