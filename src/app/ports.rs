//! Port traits — the boundary between the orchestration core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Orchestrator (domain)
//! ```
//!
//! Driven adapters (WiFi, MQTT, OLED, restart primitive) implement
//! these traits. The orchestrator consumes them via generics, so the
//! core never touches hardware directly and every test runs against
//! mocks.

use crate::app::snapshot::SensorSnapshot;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Network join (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Network-join primitive. Credentials live inside the adapter; the
/// domain only decides *when* to attempt and with which timeout.
pub trait NetworkPort {
    /// Synchronous join attempt, bounded by `timeout_ms`. Blocks the
    /// single execution context for at most that long.
    fn connect(&mut self, timeout_ms: u64) -> Result<(), CommsError>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Drop the link.
    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Publisher (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Broker-side publish client. `connect` performs the handshake and
/// any one-time discovery registration.
pub trait PublisherPort {
    fn connect(&mut self) -> Result<(), CommsError>;

    fn is_connected(&self) -> bool;

    /// Publish one payload. Failures are reported, never retried here;
    /// the next due publish cycle sends a fresh snapshot instead.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;

    fn disconnect(&mut self);

    /// Keep-alive pump; call once per tick while fully connected.
    fn pump(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display sink (driven adapter: domain → panel)
// ───────────────────────────────────────────────────────────────

/// Local display sink. When `enabled` is false, `paint` must produce a
/// blank frame.
pub trait DisplayPort {
    fn init(&mut self) -> Result<(), CommsError>;

    fn paint(&mut self, snapshot: &SensorSnapshot, enabled: bool);
}

// ───────────────────────────────────────────────────────────────
// Restart primitive (driven adapter: domain → SoC reset)
// ───────────────────────────────────────────────────────────────

/// Full process restart. On hardware this wraps `esp_restart()` and
/// never returns; host adapters record the request so tests can assert
/// on the restart sequence.
pub trait RestartPort {
    fn restart(&mut self);
}
