use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use log::debug;
use std::str::FromStr;
use thiserror::Error;

/// # ADS1115 Register Protocol
///
/// The ADS1115 is a 16-bit, 4 channel delta-sigma ADC on an I2C bus
/// (datasheet: https://www.ti.com/lit/ds/symlink/ads1115.pdf).
///
/// Every transfer starts by writing the address pointer register, which
/// selects the register the following bytes refer to:
///
/// | Pointer | Register   |
/// |---------|------------|
/// | 0x00    | Conversion |
/// | 0x01    | Config     |
///
/// Registers are 16 bits wide and sent MSB first.
///
/// ## Config register
///
/// | Bits  | Field     | Content                                           |
/// |-------|-----------|---------------------------------------------------|
/// | 15    | OS        | write 1: start a single conversion                |
/// |       |           | read 0: conversion in progress, 1: idle           |
/// | 14-12 | MUX       | 0b100 + n: AINn against GND (single-ended)        |
/// | 11-9  | PGA       | full-scale range, see [`Gain`]                    |
/// | 8     | MODE      | 1: single-shot                                    |
/// | 7-5   | DR        | 0b100: 128 samples per second                     |
/// | 4-2   | COMP_*    | 0b000: comparator defaults                        |
/// | 1-0   | COMP_QUE  | 0b11: comparator disabled                         |
///
/// ## Conversion register
///
/// Two's complement result. One LSB is `FSR / 32768` volts, so a
/// single-ended input only ever produces 0..=0x7fff.

pub const DEFAULT_ADDRESS: u8 = 0x48;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const OS_SINGLE: u16 = 0x8000;
const MUX_SINGLE_ENDED: u16 = 0b100;
const MODE_SINGLE_SHOT: u16 = 0x0100;
const DATA_RATE_128SPS: u16 = 0b100 << 5;
const COMP_QUEUE_DISABLE: u16 = 0b11;

// One conversion at 128SPS takes ~7.8ms.
const POLL_INTERVAL_MS: u32 = 1;
const MAX_POLLS: u32 = 50;

#[derive(Debug, Error)]
pub enum Ads1115Error {
    #[error("I2C error: {0}")]
    I2c(ErrorKind),

    #[error("Invalid channel: {0}")]
    InvalidChannel(u8),

    #[error("Invalid gain: {0}")]
    InvalidGain(String),

    #[error("Conversion did not complete after {0} polls")]
    ConversionTimeout(u32),
}

/// Programmable gain amplifier setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    TwoThirds,
    #[default]
    One,
    Two,
    Four,
    Eight,
    Sixteen,
}

impl Gain {
    /// Full-scale range in volts.
    pub fn full_scale_range(&self) -> f64 {
        match self {
            Gain::TwoThirds => 6.144,
            Gain::One => 4.096,
            Gain::Two => 2.048,
            Gain::Four => 1.024,
            Gain::Eight => 0.512,
            Gain::Sixteen => 0.256,
        }
    }

    fn pga_bits(&self) -> u16 {
        let code = match self {
            Gain::TwoThirds => 0b000,
            Gain::One => 0b001,
            Gain::Two => 0b010,
            Gain::Four => 0b011,
            Gain::Eight => 0b100,
            Gain::Sixteen => 0b101,
        };
        code << 9
    }
}

impl FromStr for Gain {
    type Err = Ads1115Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "2/3" => Ok(Gain::TwoThirds),
            "1" => Ok(Gain::One),
            "2" => Ok(Gain::Two),
            "4" => Ok(Gain::Four),
            "8" => Ok(Gain::Eight),
            "16" => Ok(Gain::Sixteen),
            other => Err(Ads1115Error::InvalidGain(other.to_string())),
        }
    }
}

pub struct Ads1115<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    gain: Gain,
}

impl<I: I2c, D: DelayNs> Ads1115<I, D> {
    pub fn new(i2c: I, delay: D, address: u8, gain: Gain) -> Self {
        Self {
            i2c,
            delay,
            address,
            gain,
        }
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Read back the config register. Fails when nothing acknowledges the address.
    pub fn read_config(&mut self) -> Result<u16, Ads1115Error> {
        self.read_register(REG_CONFIG)
    }

    /// Run one single-shot conversion on `channel` and return the raw result.
    pub fn read_raw(&mut self, channel: u8) -> Result<i16, Ads1115Error> {
        let config = Self::single_shot_config(channel, self.gain)?;
        self.write_register(REG_CONFIG, config)?;

        let mut polls = 0;
        loop {
            self.delay.delay_ms(POLL_INTERVAL_MS);
            polls += 1;
            if self.read_register(REG_CONFIG)? & OS_SINGLE != 0 {
                break;
            }
            if polls >= MAX_POLLS {
                return Err(Ads1115Error::ConversionTimeout(polls));
            }
        }

        let raw = self.read_register(REG_CONVERSION)? as i16;
        debug!("ADS1115 channel {} raw: {} after {} polls", channel, raw, polls);
        Ok(raw)
    }

    pub fn read_voltage(&mut self, channel: u8) -> Result<f64, Ads1115Error> {
        let raw = self.read_raw(channel)?;
        Ok(raw_to_voltage(raw, self.gain))
    }

    fn single_shot_config(channel: u8, gain: Gain) -> Result<u16, Ads1115Error> {
        if channel > 3 {
            return Err(Ads1115Error::InvalidChannel(channel));
        }
        let mux = (MUX_SINGLE_ENDED + channel as u16) << 12;
        Ok(OS_SINGLE | mux | gain.pga_bits() | MODE_SINGLE_SHOT | DATA_RATE_128SPS | COMP_QUEUE_DISABLE)
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), Ads1115Error> {
        let [msb, lsb] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[register, msb, lsb])
            .map_err(|e| Ads1115Error::I2c(e.kind()))
    }

    fn read_register(&mut self, register: u8) -> Result<u16, Ads1115Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| Ads1115Error::I2c(e.kind()))?;
        Ok(u16::from_be_bytes(buf))
    }
}

pub fn raw_to_voltage(raw: i16, gain: Gain) -> f64 {
    raw as f64 * gain.full_scale_range() / 32768.0
}
