//! Periodic task schedule entries.
//!
//! One [`ScheduleEntry`] per periodic task (display refresh, log emit,
//! telemetry publish, connectivity maintenance). An entry fires when a
//! full interval has elapsed since its *last fire*, and firing stamps
//! `last_fire = now` rather than `last_fire += interval`: cadence
//! drifts under load but missed fires never backlog.

/// A single periodic task entry.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    /// Task label, used only in logs.
    pub name: &'static str,
    /// Minimum milliseconds between fires.
    pub interval_ms: u64,
    last_fire_ms: u64,
}

impl ScheduleEntry {
    /// New entry whose interval starts counting from `now_ms`.
    pub fn new(name: &'static str, interval_ms: u64, now_ms: u64) -> Self {
        Self {
            name,
            interval_ms,
            last_fire_ms: now_ms,
        }
    }

    /// Whether a full interval has elapsed since the last fire.
    pub fn due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_fire_ms) >= self.interval_ms
    }

    /// Check-and-fire: returns `true` at most once per interval window.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        if self.due(now_ms) {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the interval from `now_ms` without firing (used when a
    /// restart sequence re-arms every timer).
    pub fn rearm(&mut self, now_ms: u64) {
        self.last_fire_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fires_before_interval() {
        let mut e = ScheduleEntry::new("display", 500, 0);
        for now in (0..500).step_by(50) {
            assert!(!e.fire_if_due(now), "fired early at t={now}");
        }
        assert!(e.fire_if_due(500));
    }

    #[test]
    fn never_fires_twice_in_one_window() {
        let mut e = ScheduleEntry::new("publish", 1000, 0);
        assert!(e.fire_if_due(1000));
        assert!(!e.fire_if_due(1000));
        assert!(!e.fire_if_due(1999));
        assert!(e.fire_if_due(2000));
    }

    #[test]
    fn cadence_drifts_instead_of_backlogging() {
        let mut e = ScheduleEntry::new("log", 100, 0);
        // Tick arrives late: one fire, and the next window starts at the
        // late timestamp, not at the nominal boundary.
        assert!(e.fire_if_due(350));
        assert!(!e.fire_if_due(400));
        assert!(!e.fire_if_due(449));
        assert!(e.fire_if_due(450));
    }

    #[test]
    fn rearm_restarts_the_window() {
        let mut e = ScheduleEntry::new("connectivity", 100, 0);
        assert!(e.fire_if_due(100));
        e.rearm(150);
        assert!(!e.fire_if_due(200));
        assert!(e.fire_if_due(250));
    }
}
