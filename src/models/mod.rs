pub mod moisture;
pub mod reading;

pub use moisture::{Calibration, MoistureStatus};
pub use reading::{HistoryEntry, Measurement, ReadingSource, SensorSnapshot};
