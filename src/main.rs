//! AirSense firmware — main entry point.
//!
//! ESP-IDF bootstrap, peripheral bring-up, adapter construction, then
//! the single-threaded cooperative tick loop. All policy lives in
//! [`app::orchestrator`]; this file only wires hardware to ports.

#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use airsense::adapters::mqtt::MqttAdapter;
use airsense::adapters::oled::OledAdapter;
use airsense::adapters::system::SystemAdapter;
use airsense::adapters::time::MonotonicClock;
use airsense::adapters::wifi::WifiAdapter;
use airsense::app::orchestrator::Orchestrator;
use airsense::app::ports::DisplayPort;
use airsense::config::SystemConfig;
use airsense::drivers::hw_init;
use airsense::sensors::climate::ClimateSensor;
use airsense::sensors::co2::Co2Sensor;
use airsense::sensors::particulate::ParticulateSensor;
use airsense::sensors::SensorHub;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

/// Milliseconds between cooperative passes. Short enough that the
/// 500 ms display cadence never slips visibly.
const TICK_DELAY_MS: u32 = 50;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("AirSense v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripheral bring-up ────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Nothing works without the buses — halt and let the hardware
        // watchdog reset us.
        error!("peripheral init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        warn!("ISR service init failed: {} — display toggle unavailable", e);
    }

    let config = SystemConfig::default();
    let clock = MonotonicClock::new();

    // ── 3. Sensors ────────────────────────────────────────────
    let mut hub = SensorHub::new(
        ClimateSensor::new(),
        Co2Sensor::new(),
        ParticulateSensor::new(),
    );
    hub.init_all();

    // ── 4. Display ────────────────────────────────────────────
    let mut display = OledAdapter::new();
    if let Err(e) = display.init() {
        warn!("display init failed: {} — running headless", e);
    }

    // ── 5. Network + publisher adapters ───────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let blocking = BlockingWifi::wrap(esp_wifi, sysloop)?;
    let mut wifi = WifiAdapter::new(blocking);

    let ssid = option_env!("AIRSENSE_WIFI_SSID").unwrap_or("");
    let password = option_env!("AIRSENSE_WIFI_PASS").unwrap_or("");
    if let Err(e) = wifi.set_credentials(ssid, password) {
        warn!("wifi credentials rejected ({}) — running offline", e);
    }

    let broker_url =
        option_env!("AIRSENSE_MQTT_URL").unwrap_or("mqtt://homeassistant.local:1883");
    let mut mqtt = MqttAdapter::new(config.device_id.as_str(), broker_url);

    let mut system = SystemAdapter::new();

    // ── 6. Tick loop ──────────────────────────────────────────
    let mut orchestrator = Orchestrator::new(config, clock.now_ms());
    info!("system ready, entering tick loop");

    loop {
        orchestrator.tick(
            clock.now_ms(),
            &mut hub,
            &mut wifi,
            &mut mqtt,
            &mut display,
            &mut system,
        );
        FreeRtos::delay_ms(TICK_DELAY_MS);
    }
}
