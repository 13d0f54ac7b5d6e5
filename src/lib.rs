pub mod client;
pub mod collectors;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod server;
pub mod state;
pub mod utils;

use crate::collectors::reader::Reader;
use crate::collectors::source::{self, SimulatedSource, VoltageSource};
use crate::config::{AppConfig, SensorConfig};
use crate::state::SharedState;
use anyhow::Context;
use log::{debug, error, info, warn};
use std::time::Duration;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting Soil Moisture Monitor");

    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Application completed successfully"),
                Err(e) => {
                    error!("Application error: {e:#}");
                    // Print chain of error causes
                    let mut source = e.source();
                    while let Some(e) = source {
                        error!("Caused by: {e}");
                        source = e.source();
                    }
                    return Err(e).context("Application failed to run");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    Ok(())
}

async fn main_loop(config: AppConfig) -> anyhow::Result<()> {
    let timezone = config.time.timezone()?;
    let state = SharedState::new(config.reader.history_size);

    let sensor = open_sensor(&config.sensor);
    match &sensor {
        Some(s) => info!("Reading soil moisture from {:?} source", s.kind()),
        None => warn!("Sensor not available, serving simulated readings"),
    }

    let reader = Reader::new(
        sensor,
        SimulatedSource::new(&config.calibration),
        config.calibration,
        timezone,
        state.clone(),
    );
    let interval = Duration::from_secs(config.reader.interval_secs);
    debug!("Reading sensor every {} s", interval.as_secs());
    let reader_task = tokio::spawn(reader.run(interval));

    let page = dashboard::create_page(&config);
    let result = server::serve(&config.server, state, page).await;

    reader_task.abort();
    result
}

fn open_sensor(config: &SensorConfig) -> Option<Box<dyn VoltageSource>> {
    if config.simulate {
        info!("Simulation enabled, not opening {}", config.i2c_bus);
        return None;
    }

    match source::open_sensor(config) {
        Ok(sensor) => Some(sensor),
        Err(e) => {
            error!("Sensor initialization failed: {e:#}");
            None
        }
    }
}
