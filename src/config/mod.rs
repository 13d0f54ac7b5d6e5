use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use config::{Config, File};
use log::{debug, LevelFilter};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;

use crate::client::ads1115::{self, Gain};
use crate::models::Calibration;

pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

// One day; the page refresh period is sent to the browser in milliseconds.
const MAX_REFRESH_SECS: u64 = 86_400;

fn deserialize_hex_or_int<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;

    // Try parsing as hexadecimal if it starts with "0x"
    if value.starts_with("0x") || value.starts_with("0X") {
        u8::from_str_radix(&value[2..], 16).map_err(serde::de::Error::custom)
    } else {
        // Otherwise parse as decimal
        u8::from_str(&value).map_err(serde::de::Error::custom)
    }
}

fn deserialize_gain<'de, D>(deserializer: D) -> Result<Gain, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Gain::from_str(&value).map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How often the dashboard page polls the API.
    pub refresh_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            refresh_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorConfig {
    pub i2c_bus: String,
    #[serde(deserialize_with = "deserialize_hex_or_int")]
    pub address: u8,
    pub channel: u8,
    #[serde(deserialize_with = "deserialize_gain")]
    pub gain: Gain,
    /// Skip the hardware entirely and serve simulated readings.
    pub simulate: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            i2c_bus: "/dev/i2c-1".to_string(),
            address: ads1115::DEFAULT_ADDRESS,
            channel: 0,
            gain: Gain::One,
            simulate: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReaderConfig {
    pub interval_secs: u64,
    pub history_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            history_size: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimeConfig {
    pub timezone: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone: "US/Central".to_string(),
        }
    }
}

impl TimeConfig {
    pub fn timezone(&self) -> Result<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(anyhow::Error::msg)
            .context(format!("Unknown timezone {}", self.timezone))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default, alias = "SERVER")]
    pub server: ServerConfig,
    #[serde(default, alias = "SENSOR")]
    pub sensor: SensorConfig,
    #[serde(default, alias = "CALIBRATION")]
    pub calibration: Calibration,
    #[serde(default, alias = "READER")]
    pub reader: ReaderConfig,
    #[serde(default, alias = "TIME")]
    pub time: TimeConfig,
    #[serde(default, alias = "LOGGING")]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::with_name(config_path.to_str().unwrap_or("")).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config.try_deserialize()
            .context("Failed to deserialize config")?;

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.calibration.is_valid() {
            bail!(
                "Invalid calibration: dry voltage ({}) must be above wet voltage ({})",
                self.calibration.dry_voltage,
                self.calibration.wet_voltage
            );
        }
        if self.sensor.channel > 3 {
            bail!("Invalid sensor channel {}, expected 0-3", self.sensor.channel);
        }
        if self.server.refresh_secs == 0 || self.server.refresh_secs > MAX_REFRESH_SECS {
            bail!(
                "Dashboard refresh must be between 1 and {} seconds, got {}",
                MAX_REFRESH_SECS,
                self.server.refresh_secs
            );
        }
        if self.reader.interval_secs == 0 {
            bail!("Reader interval must be at least one second");
        }
        if self.reader.history_size == 0 {
            bail!("History size must be at least one reading");
        }
        self.time.timezone()?;
        Ok(())
    }
}
