//! Unified error types for the AirSense firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the orchestrator's failure handling uniform. All variants are `Copy`
//! so they can be passed around and logged without allocation.
//!
//! Propagation policy: every failure here is absorbed at the point of
//! occurrence and logged — none aborts an orchestrator tick. The only
//! fatal path in the system is the watchdog restart, which is not an
//! error value at all (see [`crate::watchdog`]).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be initialised or read.
    Sensor(SensorError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver's init sequence failed; the sensor stays unavailable
    /// until the next full restart.
    InitFailed,
    /// Bus transaction failed or the device returned no data.
    ReadFailed,
    /// A wire frame arrived malformed (bad header or checksum).
    BadFrame,
    /// The sensor is inside its measurement window; the previous value
    /// is still current. Not a cycle failure.
    NotReady,
    /// `read()` called on a driver whose init already failed.
    Unavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "init failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::BadFrame => write!(f, "malformed frame"),
            Self::NotReady => write!(f, "measurement not ready"),
            Self::Unavailable => write!(f, "sensor unavailable"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Network join did not complete within its timeout.
    JoinFailed,
    /// Broker handshake was refused or timed out.
    BrokerConnectFailed,
    /// A publish was attempted and the client reported failure.
    PublishFailed,
    /// Operation requires a connection that is not currently up.
    NotConnected,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinFailed => write!(f, "network join failed"),
            Self::BrokerConnectFailed => write!(f, "broker connect failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::NotConnected => write!(f, "not connected"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
