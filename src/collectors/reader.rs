use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

use crate::collectors::source::{SimulatedSource, VoltageSource};
use crate::models::{Calibration, Measurement, MoistureStatus, ReadingSource};
use crate::state::SharedState;
use crate::utils::time;

/// Periodically reads the probe and records the result in the shared state.
///
/// Whenever the hardware source is missing or a read fails, the tick falls
/// back to a simulated voltage so the dashboard keeps updating.
pub struct Reader {
    sensor: Option<Box<dyn VoltageSource>>,
    fallback: SimulatedSource,
    calibration: Calibration,
    timezone: Tz,
    state: SharedState,
}

impl Reader {
    pub fn new(
        sensor: Option<Box<dyn VoltageSource>>,
        fallback: SimulatedSource,
        calibration: Calibration,
        timezone: Tz,
        state: SharedState,
    ) -> Self {
        Self {
            sensor,
            fallback,
            calibration,
            timezone,
            state,
        }
    }

    pub async fn run(mut self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await; // First tick completes immediately
            self.tick().await;
        }
    }

    /// Take one reading and record it. Never fails.
    pub async fn tick(&mut self) -> Measurement {
        let start = Instant::now();

        let (voltage, source) = match self.read_sensor().await {
            Some(Ok(voltage)) => (voltage, ReadingSource::Sensor),
            Some(Err(e)) => {
                error!("Error reading sensor: {e:#}");
                (self.fallback.next_voltage(), ReadingSource::Simulated)
            }
            None => (self.fallback.next_voltage(), ReadingSource::Simulated),
        };

        let measurement = self.convert(voltage, source);
        self.state.record(&measurement).await;

        info!(
            "Soil moisture {:.1}% ({}) at {:.3} V [{:?}]",
            measurement.moisture_percentage, measurement.status, measurement.voltage, measurement.source
        );
        debug!("Reader tick took: {} ms", start.elapsed().as_millis());
        measurement
    }

    fn convert(&self, voltage: f64, source: ReadingSource) -> Measurement {
        let moisture_percentage = self.calibration.moisture_percentage(voltage);
        Measurement {
            voltage,
            moisture_percentage,
            status: MoistureStatus::from_percentage(moisture_percentage),
            source,
            taken_at: time::now(self.timezone),
        }
    }

    // The I2C transfer blocks, so it runs on the blocking pool and hands the
    // source back afterwards.
    async fn read_sensor(&mut self) -> Option<Result<f64>> {
        let mut sensor = self.sensor.take()?;

        let joined = tokio::task::spawn_blocking(move || {
            let result = sensor.read_voltage();
            (sensor, result)
        })
        .await;

        match joined {
            Ok((sensor, result)) => {
                self.sensor = Some(sensor);
                Some(result)
            }
            Err(e) => {
                warn!("Sensor task aborted, switching to simulated readings");
                Some(Err(anyhow!(e)))
            }
        }
    }
}
