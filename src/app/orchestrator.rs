//! The cooperative tick — fixed-order pass over every subsystem.
//!
//! Called from the main loop with the current monotonic time and the
//! hardware ports. Order per tick:
//!
//! 1. watchdog check (restart sequence if tripped)
//! 2. connectivity maintenance, if due
//! 3. publisher keep-alive pump, while fully connected
//! 4. consume one pending display toggle
//! 5. display idle auto-off
//! 6. display refresh, if due and enabled
//! 7. diagnostic log emit, if due
//! 8. telemetry publish, if due and fully connected
//!
//! Steps 6–8 each want fresh sensor data but a tick refreshes the hub
//! at most once. Every step absorbs its own failures; nothing aborts a
//! tick short of the watchdog restart.

use log::info;

use crate::app::ports::{DisplayPort, NetworkPort, PublisherPort, RestartPort};
use crate::app::snapshot::SensorSnapshot;
use crate::app::telemetry::{self, METRICS};
use crate::config::SystemConfig;
use crate::connectivity::ConnectivityManager;
use crate::drivers::button;
use crate::schedule::ScheduleEntry;
use crate::sensors::{RefreshOutcome, SensorHub};
use crate::watchdog::WatchdogClock;

pub struct Orchestrator {
    config: SystemConfig,
    snapshot: SensorSnapshot,
    connectivity: ConnectivityManager,
    watchdog: WatchdogClock,

    display_schedule: ScheduleEntry,
    log_schedule: ScheduleEntry,
    publish_schedule: ScheduleEntry,
    connectivity_schedule: ScheduleEntry,

    display_enabled: bool,
    /// Start of the current display-on window.
    display_on_since_ms: u64,
}

impl Orchestrator {
    pub fn new(config: SystemConfig, now_ms: u64) -> Self {
        let connectivity = ConnectivityManager::new(&config);
        Self {
            snapshot: SensorSnapshot::default(),
            connectivity,
            watchdog: WatchdogClock::new(now_ms),
            display_schedule: ScheduleEntry::new("display", config.display_refresh_ms, now_ms),
            log_schedule: ScheduleEntry::new("log", config.log_interval_ms, now_ms),
            publish_schedule: ScheduleEntry::new("publish", config.publish_interval_ms, now_ms),
            connectivity_schedule: ScheduleEntry::new(
                "connectivity",
                config.connectivity_interval_ms,
                now_ms,
            ),
            display_enabled: true,
            display_on_since_ms: now_ms,
            config,
        }
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn display_enabled(&self) -> bool {
        self.display_enabled
    }

    pub fn connectivity(&self) -> &ConnectivityManager {
        &self.connectivity
    }

    /// One full cooperative pass.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hub: &mut SensorHub,
        net: &mut impl NetworkPort,
        publisher: &mut impl PublisherPort,
        display: &mut impl DisplayPort,
        system: &mut impl RestartPort,
    ) {
        // 1. Watchdog — both triggers, every tick.
        if let Some(reason) = self.watchdog.check(now_ms, &self.config) {
            info!("tick: restart demanded ({:?})", reason);
            self.restart_sequence(now_ms, publisher, display, system);
            return;
        }

        let mut refreshed: Option<RefreshOutcome> = None;

        // 2. Connectivity maintenance.
        if self.connectivity_schedule.fire_if_due(now_ms) {
            self.connectivity.maintain(now_ms, net, publisher);
        }

        // 3. Publisher keep-alive.
        if self.connectivity.is_fully_connected() {
            if publisher.is_connected() {
                publisher.pump();
            } else {
                self.connectivity.note_broker_lost();
            }
        }

        // 4. Display toggle (N ISR firings collapse to one).
        if button::take_toggle_request() {
            self.display_enabled = !self.display_enabled;
            if self.display_enabled {
                info!("display: toggled on");
                self.display_on_since_ms = now_ms;
            } else {
                info!("display: toggled off");
                display.paint(&self.snapshot, false);
            }
        }

        // 5. Display idle auto-off.
        if self.display_enabled
            && now_ms.saturating_sub(self.display_on_since_ms) >= self.config.display_idle_timeout_ms
        {
            info!("display: idle auto-off");
            self.display_enabled = false;
            display.paint(&self.snapshot, false);
        }

        // 6. Display refresh.
        if self.display_enabled && self.display_schedule.fire_if_due(now_ms) {
            self.ensure_refreshed(now_ms, hub, &mut refreshed);
            display.paint(&self.snapshot, true);
        }

        // 7. Diagnostic log.
        if self.log_schedule.fire_if_due(now_ms) {
            self.ensure_refreshed(now_ms, hub, &mut refreshed);
            let s = &self.snapshot;
            info!(
                "Temp: {:.2} °F | Humidity: {:.2} % | CO2: {} ppm | PM1.0: {} µg/m³ | \
                 PM2.5: {} µg/m³ | PM10: {} µg/m³ | AQI: {} | Gas: {:.0} Ω",
                s.temperature_f, s.humidity_pct, s.co2_ppm, s.pm1_0, s.pm2_5, s.pm10, s.aqi,
                s.gas_resistance_ohm
            );
        }

        // 8. Telemetry publish. The entry only fires while fully
        // connected, so a window spent offline publishes immediately
        // after the next successful reconnect.
        if self.connectivity.is_fully_connected() && self.publish_schedule.due(now_ms) {
            if publisher.is_connected() {
                self.publish_schedule.fire_if_due(now_ms);
                self.ensure_refreshed(now_ms, hub, &mut refreshed);
                self.publish_all(publisher);
            } else {
                self.connectivity.note_broker_lost();
            }
        }
    }

    /// Refresh the sensor hub at most once per tick, advancing the
    /// watchdog clock on any fresh value.
    fn ensure_refreshed(
        &mut self,
        now_ms: u64,
        hub: &mut SensorHub,
        refreshed: &mut Option<RefreshOutcome>,
    ) {
        if refreshed.is_none() {
            let outcome = hub.refresh(now_ms, &mut self.snapshot);
            if outcome.any_ok {
                self.watchdog.note_read_success(now_ms);
            }
            *refreshed = Some(outcome);
        }
    }

    fn publish_all(&mut self, publisher: &mut impl PublisherPort) {
        for metric in METRICS {
            let topic = telemetry::state_topic(self.config.device_id.as_str(), metric.key);
            let payload = telemetry::state_payload(metric.key, &self.snapshot);
            if let Err(e) = publisher.publish(topic.as_str(), &payload) {
                log::warn!("publish: '{}' failed — {}", metric.key, e);
                // A broker fault mid-batch: demote and let the next
                // maintenance pass rebuild the session. The next due
                // cycle sends a complete fresh snapshot.
                self.connectivity.note_broker_lost();
                break;
            }
        }
    }

    /// Best-effort farewell, then restart. On hardware `restart()`
    /// never returns; in simulation the orchestrator re-arms all its
    /// clocks so the run continues as a clean boot.
    fn restart_sequence(
        &mut self,
        now_ms: u64,
        publisher: &mut impl PublisherPort,
        display: &mut impl DisplayPort,
        system: &mut impl RestartPort,
    ) {
        if self.connectivity.is_fully_connected() && publisher.is_connected() {
            let topic = telemetry::state_topic(self.config.device_id.as_str(), "status");
            let _ = publisher.publish(topic.as_str(), "rebooting");
        }
        publisher.disconnect();
        display.paint(&self.snapshot, self.display_enabled);
        system.restart();

        // Reached only in simulation.
        self.watchdog.rearm(now_ms);
        self.connectivity.rearm();
        self.display_schedule.rearm(now_ms);
        self.log_schedule.rearm(now_ms);
        self.publish_schedule.rearm(now_ms);
        self.connectivity_schedule.rearm(now_ms);
        self.display_enabled = true;
        self.display_on_since_ms = now_ms;
    }
}
