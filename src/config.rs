//! System configuration parameters
//!
//! All timing constants and identifiers for the AirSense monitor.
//! These are build-time constants surfaced as one struct so tests can
//! shrink the intervals without touching the orchestrator.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Device prefix used in MQTT topics (`homeassistant/sensor/<id>_<metric>/...`)
    pub device_id: heapless::String<16>,

    // --- Cadences ---
    /// OLED refresh interval (milliseconds)
    pub display_refresh_ms: u64,
    /// Diagnostic log emit interval (milliseconds)
    pub log_interval_ms: u64,
    /// Telemetry publish interval (milliseconds)
    pub publish_interval_ms: u64,
    /// Connectivity maintenance interval (milliseconds)
    pub connectivity_interval_ms: u64,

    // --- Connectivity ---
    /// Network join timeout per attempt (milliseconds)
    pub join_timeout_ms: u64,
    /// Consecutive failures before entering long backoff
    pub max_immediate_retries: u8,
    /// Long backoff after exhausting immediate retries (milliseconds)
    pub long_backoff_ms: u64,

    // --- Display ---
    /// Idle timeout after which the OLED blanks itself (milliseconds)
    pub display_idle_timeout_ms: u64,

    // --- Watchdog ---
    /// Preventive full restart after this uptime (milliseconds)
    pub scheduled_restart_ms: u64,
    /// Emergency restart when no sensor has read successfully for this long (milliseconds)
    pub emergency_timeout_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut device_id = heapless::String::new();
        // 16-byte capacity always fits the default id.
        let _ = device_id.push_str("esp32");

        Self {
            device_id,

            // Cadences
            display_refresh_ms: 500,
            log_interval_ms: 10_000,
            publish_interval_ms: 60_000,
            connectivity_interval_ms: 30_000,

            // Connectivity
            join_timeout_ms: 15_000,
            max_immediate_retries: 3,
            long_backoff_ms: 15 * 60 * 1000,

            // Display
            display_idle_timeout_ms: 5 * 60 * 1000,

            // Watchdog
            scheduled_restart_ms: 6 * 60 * 60 * 1000,
            emergency_timeout_ms: 5 * 60 * 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(!c.device_id.is_empty());
        assert!(c.display_refresh_ms > 0);
        assert!(c.max_immediate_retries > 0);
        assert!(c.join_timeout_ms > 0);
        assert!(c.emergency_timeout_ms > 0);
        assert!(c.scheduled_restart_ms > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.device_id, c2.device_id);
        assert_eq!(c.publish_interval_ms, c2.publish_interval_ms);
        assert_eq!(c.long_backoff_ms, c2.long_backoff_ms);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.display_refresh_ms < c.log_interval_ms,
            "display refresh should be faster than diagnostic logging"
        );
        assert!(
            c.log_interval_ms < c.publish_interval_ms,
            "logging should be faster than telemetry publishing"
        );
        assert!(
            c.long_backoff_ms > c.connectivity_interval_ms,
            "long backoff must outlast the maintenance cadence"
        );
        assert!(
            c.emergency_timeout_ms < c.scheduled_restart_ms,
            "a stalled sensor bus must trip before the preventive restart"
        );
    }
}
