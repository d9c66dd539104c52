//! Liveness watchdog.
//!
//! Two independent restart triggers, checked at the top of every tick:
//!
//! 1. **Scheduled** — preventive full restart after a fixed uptime.
//! 2. **SensorStall** — no sensor read has succeeded for the emergency
//!    timeout, signalling a locked-up sensor bus that software cannot
//!    recover in-process.
//!
//! The clock advances whenever *any* individual sensor read succeeds in
//! a cycle, not only when all do: a single working sensor is proof of
//! liveness even if its siblings are down.

use log::error;

use crate::config::SystemConfig;

/// Why the watchdog demanded a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// Preventive restart after the configured uptime.
    Scheduled,
    /// No successful sensor read within the emergency timeout.
    SensorStall,
}

/// Boot and last-read timestamps the triggers compare against.
#[derive(Debug, Clone, Copy)]
pub struct WatchdogClock {
    boot_ms: u64,
    last_successful_read_ms: u64,
}

impl WatchdogClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            boot_ms: now_ms,
            last_successful_read_ms: now_ms,
        }
    }

    /// Record that at least one sensor read succeeded this cycle.
    pub fn note_read_success(&mut self, now_ms: u64) {
        self.last_successful_read_ms = now_ms;
    }

    /// Evaluate both triggers. Scheduled restart wins when both are due.
    pub fn check(&self, now_ms: u64, config: &SystemConfig) -> Option<RestartReason> {
        if now_ms.saturating_sub(self.boot_ms) >= config.scheduled_restart_ms {
            error!("Watchdog: scheduled restart due (uptime limit reached)");
            return Some(RestartReason::Scheduled);
        }
        if now_ms.saturating_sub(self.last_successful_read_ms) >= config.emergency_timeout_ms {
            error!(
                "Watchdog: no sensor readings for {}s — emergency restart",
                config.emergency_timeout_ms / 1000
            );
            return Some(RestartReason::SensorStall);
        }
        None
    }

    /// Reset both timestamps, as a fresh boot would (simulation only).
    pub fn rearm(&mut self, now_ms: u64) {
        self.boot_ms = now_ms;
        self.last_successful_read_ms = now_ms;
    }

    pub fn last_successful_read_ms(&self) -> u64 {
        self.last_successful_read_ms
    }
}
