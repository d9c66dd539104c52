//! SCD41-class CO2 sensor (I2C, Sensirion periodic-measurement mode).
//!
//! The sensor produces one measurement every 5 seconds; reads inside
//! that window report [`SensorError::NotReady`], which callers treat as
//! "previous value still current" rather than a failure.
//!
//! Wire format: big-endian words, each followed by a Sensirion CRC-8
//! (poly 0x31, init 0xFF).

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use log::{info, warn};

use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Minimum spacing between measurement reads.
const MEASURE_INTERVAL_MS: u64 = 5000;

#[cfg(target_os = "espidf")]
const CMD_START_PERIODIC: [u8; 2] = [0x21, 0xB1];
#[cfg(target_os = "espidf")]
const CMD_READ_MEASUREMENT: [u8; 2] = [0xEC, 0x05];

// Host simulation injection points.
#[cfg(not(target_os = "espidf"))]
static SIM_CO2_PPM: AtomicU16 = AtomicU16::new(600);
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_co2(ppm: u16) {
    SIM_CO2_PPM.store(ppm, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_co2_fail(fail: bool) {
    SIM_FAIL.store(fail, Ordering::Relaxed);
}

pub struct Co2Sensor {
    available: bool,
    last_success_ms: u64,
}

impl Co2Sensor {
    pub fn new() -> Self {
        Self {
            available: false,
            last_success_ms: 0,
        }
    }

    /// Start periodic measurement. The first reading becomes available
    /// one measurement interval after this call.
    pub fn init(&mut self) -> Result<(), SensorError> {
        match self.platform_init() {
            Ok(()) => {
                self.available = true;
                info!("co2: SCD41 periodic measurement started");
                Ok(())
            }
            Err(e) => {
                warn!("co2: init failed — {}", e);
                Err(e)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Read the latest CO2 measurement, respecting the sensor's pacing.
    pub fn read(&mut self, now_ms: u64) -> Result<u16, SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable);
        }
        if now_ms.saturating_sub(self.last_success_ms) < MEASURE_INTERVAL_MS {
            return Err(SensorError::NotReady);
        }
        let ppm = self.platform_read()?;
        self.last_success_ms = now_ms;
        Ok(ppm)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<(), SensorError> {
        if hw_init::i2c_write(pins::SCD41_I2C_ADDR, &CMD_START_PERIODIC) {
            Ok(())
        } else {
            Err(SensorError::InitFailed)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_read(&mut self) -> Result<u16, SensorError> {
        let mut buf = [0u8; 9];
        if !hw_init::i2c_write_read(pins::SCD41_I2C_ADDR, &CMD_READ_MEASUREMENT, &mut buf) {
            return Err(SensorError::ReadFailed);
        }
        // co2 word + temperature word + humidity word; only CO2 is used
        // here (the climate sensor is the temperature/humidity source).
        let co2 = word_checked(&buf[0..3]).ok_or(SensorError::BadFrame)?;
        Ok(co2)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read(&mut self) -> Result<u16, SensorError> {
        if SIM_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::ReadFailed);
        }
        Ok(SIM_CO2_PPM.load(Ordering::Relaxed))
    }
}

/// Validate a `[msb, lsb, crc]` triplet and return the word.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn word_checked(chunk: &[u8]) -> Option<u16> {
    if chunk.len() != 3 || sensirion_crc8(&chunk[0..2]) != chunk[2] {
        return None;
    }
    Some((u16::from(chunk[0]) << 8) | u16::from(chunk[1]))
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no final XOR.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn sensirion_crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}
