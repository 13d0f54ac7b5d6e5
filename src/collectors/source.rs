use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::{Delay, I2cdev};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::client::ads1115::Ads1115;
use crate::config::SensorConfig;
use crate::models::{Calibration, ReadingSource};

/// Anything that can produce a probe voltage.
pub trait VoltageSource: Send {
    fn read_voltage(&mut self) -> Result<f64>;

    fn kind(&self) -> ReadingSource;
}

/// A single-ended ADS1115 input with the probe attached.
pub struct AdcChannel<I, D> {
    adc: Ads1115<I, D>,
    channel: u8,
}

impl<I: I2c, D: DelayNs> AdcChannel<I, D> {
    pub fn new(adc: Ads1115<I, D>, channel: u8) -> Self {
        Self { adc, channel }
    }
}

impl<I, D> VoltageSource for AdcChannel<I, D>
where
    I: I2c + Send,
    D: DelayNs + Send,
{
    fn read_voltage(&mut self) -> Result<f64> {
        let voltage = self
            .adc
            .read_voltage(self.channel)
            .context(format!("Failed to read ADS1115 channel {}", self.channel))?;
        Ok(voltage)
    }

    fn kind(&self) -> ReadingSource {
        ReadingSource::Sensor
    }
}

/// Uniformly random voltages within the calibrated probe range.
pub struct SimulatedSource {
    low: f64,
    high: f64,
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new(calibration: &Calibration) -> Self {
        Self::with_rng(calibration, StdRng::from_entropy())
    }

    pub fn with_seed(calibration: &Calibration, seed: u64) -> Self {
        Self::with_rng(calibration, StdRng::seed_from_u64(seed))
    }

    fn with_rng(calibration: &Calibration, rng: StdRng) -> Self {
        Self {
            low: calibration.wet_voltage,
            high: calibration.dry_voltage,
            rng,
        }
    }

    pub fn next_voltage(&mut self) -> f64 {
        self.rng.gen_range(self.low..=self.high)
    }
}

impl VoltageSource for SimulatedSource {
    fn read_voltage(&mut self) -> Result<f64> {
        Ok(self.next_voltage())
    }

    fn kind(&self) -> ReadingSource {
        ReadingSource::Simulated
    }
}

/// Open the I2C bus and check that an ADS1115 answers at the configured address.
pub fn open_sensor(config: &SensorConfig) -> Result<Box<dyn VoltageSource>> {
    let i2c = I2cdev::new(&config.i2c_bus)
        .context(format!("Failed to open I2C bus {}", config.i2c_bus))?;

    let mut adc = Ads1115::new(i2c, Delay, config.address, config.gain);
    let adc_config = adc
        .read_config()
        .context(format!("No ADS1115 found at {:#04x} on {}", config.address, config.i2c_bus))?;

    info!(
        "ADS1115 found at {:#04x} on {} (config {:#06x}, gain {:?})",
        config.address, config.i2c_bus, adc_config, adc.gain()
    );

    Ok(Box::new(AdcChannel::new(adc, config.channel)))
}
