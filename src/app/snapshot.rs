//! The most recently known-good set of sensor readings.
//!
//! One field per measured quantity, each holding the last
//! *successfully* read value. The snapshot is created once, lives for
//! the process lifetime, and is overwritten in place by the sensor hub;
//! a failing driver leaves its fields untouched, so a field is always
//! either fresh-this-cycle or a legitimately stale prior value.

/// A point-in-time view of every measured quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Ambient temperature (°F).
    pub temperature_f: f32,
    /// Relative humidity (%).
    pub humidity_pct: f32,
    /// Barometric pressure (hPa).
    pub pressure_hpa: f32,
    /// Gas sensor resistance (Ω) — VOC proxy; higher = cleaner air.
    pub gas_resistance_ohm: f32,

    /// CO2 concentration (ppm).
    pub co2_ppm: u16,

    /// PM1.0 (µg/m³).
    pub pm1_0: u16,
    /// PM2.5 (µg/m³) — fine particulate.
    pub pm2_5: u16,
    /// PM10 (µg/m³) — coarse particulate.
    pub pm10: u16,

    /// Composite air-quality index derived from the fields above.
    pub aqi: u16,
}
