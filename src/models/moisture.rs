use serde::{Deserialize, Serialize};
use std::fmt;

/// Voltage readings of a capacitive soil moisture probe at both ends of its range.
///
/// The probe output drops as the soil gets wetter, so `dry_voltage` is the
/// upper bound and `wet_voltage` the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub dry_voltage: f64,
    pub wet_voltage: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            dry_voltage: 3.0,
            wet_voltage: 1.5,
        }
    }
}

impl Calibration {
    pub fn is_valid(&self) -> bool {
        self.dry_voltage.is_finite()
            && self.wet_voltage.is_finite()
            && self.dry_voltage > self.wet_voltage
    }

    /// Convert a probe voltage to a moisture percentage rounded to one decimal.
    pub fn moisture_percentage(&self, voltage: f64) -> f64 {
        if voltage.is_nan() || voltage >= self.dry_voltage {
            return 0.0;
        }
        if voltage <= self.wet_voltage {
            return 100.0;
        }

        // Higher voltage = drier soil
        let span = self.dry_voltage - self.wet_voltage;
        let percentage = (self.dry_voltage - voltage) / span * 100.0;
        round_tenth(percentage.clamp(0.0, 100.0))
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoistureStatus {
    Dry,
    Moist,
    Wet,
}

impl MoistureStatus {
    /// Dry below 25%, moist below 65%, wet otherwise.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 25.0 {
            MoistureStatus::Dry
        } else if percentage < 65.0 {
            MoistureStatus::Moist
        } else {
            MoistureStatus::Wet
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoistureStatus::Dry => "Dry",
            MoistureStatus::Moist => "Moist",
            MoistureStatus::Wet => "Wet",
        }
    }
}

impl fmt::Display for MoistureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
