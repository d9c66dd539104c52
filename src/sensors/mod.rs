//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and refreshes the long-lived
//! [`SensorSnapshot`] in place. A failing driver leaves its snapshot
//! fields untouched and never blocks its siblings, so every field is
//! always either fresh-this-cycle or the last good value.

pub mod climate;
pub mod co2;
pub mod particulate;

use log::warn;

use crate::app::snapshot::SensorSnapshot;
use crate::aqi;
use crate::error::SensorError;
use climate::ClimateSensor;
use co2::Co2Sensor;
use particulate::ParticulateSensor;

/// Result of one refresh pass across all drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Every available driver produced a fresh value (pacing windows
    /// such as the CO2 measurement interval do not count against this).
    pub all_ok: bool,
    /// At least one driver produced a fresh value — the liveness signal
    /// the watchdog clock advances on.
    pub any_ok: bool,
}

/// Aggregates all sensor drivers and maintains the unified snapshot.
pub struct SensorHub {
    pub climate: ClimateSensor,
    pub co2: Co2Sensor,
    pub particulate: ParticulateSensor,
    // Health flags so repeated failures log once per transition, not
    // once per refresh.
    climate_healthy: bool,
    co2_healthy: bool,
    particulate_healthy: bool,
}

impl SensorHub {
    pub fn new(climate: ClimateSensor, co2: Co2Sensor, particulate: ParticulateSensor) -> Self {
        Self {
            climate,
            co2,
            particulate,
            climate_healthy: true,
            co2_healthy: true,
            particulate_healthy: true,
        }
    }

    /// Initialise every driver. Individual failures are logged by the
    /// drivers and leave them unavailable; the hub keeps running with
    /// whatever came up.
    pub fn init_all(&mut self) {
        let _ = self.climate.init();
        let _ = self.co2.init();
        let _ = self.particulate.init();
    }

    /// Read every driver and fold fresh values into `snapshot`, then
    /// recompute the composite index.
    pub fn refresh(&mut self, now_ms: u64, snapshot: &mut SensorSnapshot) -> RefreshOutcome {
        let mut outcome = RefreshOutcome {
            all_ok: true,
            any_ok: false,
        };

        match self.climate.read() {
            Ok(r) => {
                snapshot.temperature_f = r.temperature_f;
                snapshot.humidity_pct = r.humidity_pct;
                snapshot.pressure_hpa = r.pressure_hpa;
                snapshot.gas_resistance_ohm = r.gas_resistance_ohm;
                outcome.any_ok = true;
                self.climate_healthy = true;
            }
            Err(e) => {
                if self.climate_healthy {
                    warn!("sensors: climate read failed — {}", e);
                }
                self.climate_healthy = false;
                outcome.all_ok = false;
            }
        }

        match self.co2.read(now_ms) {
            Ok(ppm) => {
                snapshot.co2_ppm = ppm;
                outcome.any_ok = true;
                self.co2_healthy = true;
            }
            // Inside the measurement window the prior value is current.
            Err(SensorError::NotReady) => {}
            Err(e) => {
                if self.co2_healthy {
                    warn!("sensors: co2 read failed — {}", e);
                }
                self.co2_healthy = false;
                outcome.all_ok = false;
            }
        }

        match self.particulate.read() {
            Ok(r) => {
                snapshot.pm1_0 = r.pm1_0;
                snapshot.pm2_5 = r.pm2_5;
                snapshot.pm10 = r.pm10;
                outcome.any_ok = true;
                self.particulate_healthy = true;
            }
            // No frame closed this pass; the stream is still healthy.
            Err(SensorError::NotReady) => {}
            Err(e) => {
                if self.particulate_healthy {
                    warn!("sensors: particulate read failed — {}", e);
                }
                self.particulate_healthy = false;
                outcome.all_ok = false;
            }
        }

        snapshot.aqi = aqi::composite(snapshot);
        outcome
    }
}

/// Serialises tests that touch the host simulation atomics, which are
/// process-global.
#[cfg(all(test, not(target_os = "espidf")))]
pub(crate) static SIM_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn hub() -> SensorHub {
        let mut hub = SensorHub::new(
            ClimateSensor::new(),
            Co2Sensor::new(),
            ParticulateSensor::new(),
        );
        hub.init_all();
        hub
    }

    fn sim_all_healthy() {
        climate::sim_set_climate_fail(false);
        co2::sim_set_co2_fail(false);
        particulate::sim_set_particulate_fail(false);
    }

    #[test]
    fn healthy_refresh_populates_every_field() {
        let _guard = SIM_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sim_all_healthy();
        climate::sim_set_climate(68.0, 45.0, 1008.0, 220_000.0);
        co2::sim_set_co2(750);
        particulate::sim_set_particulate(4, 9, 15);

        let mut hub = hub();
        let mut snap = SensorSnapshot::default();
        // Past the CO2 warm-up window so all three drivers report.
        let outcome = hub.refresh(10_000, &mut snap);

        assert!(outcome.all_ok);
        assert!(outcome.any_ok);
        assert!((snap.temperature_f - 68.0).abs() < 1e-3);
        assert_eq!(snap.co2_ppm, 750);
        assert_eq!(snap.pm2_5, 9);
        assert!(snap.aqi > 0);
    }

    #[test]
    fn failing_driver_retains_stale_fields() {
        let _guard = SIM_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sim_all_healthy();
        co2::sim_set_co2(900);
        particulate::sim_set_particulate(2, 5, 8);

        let mut hub = hub();
        let mut snap = SensorSnapshot::default();
        assert!(hub.refresh(10_000, &mut snap).all_ok);
        assert_eq!(snap.co2_ppm, 900);

        // CO2 dies; particulate keeps reporting fresh values.
        co2::sim_set_co2_fail(true);
        particulate::sim_set_particulate(3, 6, 9);
        let outcome = hub.refresh(20_000, &mut snap);

        assert!(!outcome.all_ok, "dead driver must mark the cycle unhealthy");
        assert!(outcome.any_ok, "live drivers still prove liveness");
        assert_eq!(snap.co2_ppm, 900, "stale CO2 value is retained");
        assert_eq!(snap.pm2_5, 6, "fresh particulate value is adopted");
        co2::sim_set_co2_fail(false);
    }

    #[test]
    fn co2_pacing_window_is_not_a_failure() {
        let _guard = SIM_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sim_all_healthy();

        let mut hub = hub();
        let mut snap = SensorSnapshot::default();
        assert!(hub.refresh(10_000, &mut snap).all_ok);
        // 2 s later the CO2 sensor is mid-window; still a healthy cycle.
        let outcome = hub.refresh(12_000, &mut snap);
        assert!(outcome.all_ok);
    }

    #[test]
    fn all_drivers_down_yields_no_liveness() {
        let _guard = SIM_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sim_all_healthy();
        climate::sim_set_climate_fail(true);
        co2::sim_set_co2_fail(true);
        particulate::sim_set_particulate_fail(true);

        let mut hub = hub();
        let mut snap = SensorSnapshot::default();
        let outcome = hub.refresh(10_000, &mut snap);
        assert!(!outcome.all_ok);
        assert!(!outcome.any_ok);
        sim_all_healthy();
    }
}
