//! Application core: the orchestrator, its port traits, and the shared
//! snapshot/telemetry types. Everything in here is hardware-free and
//! fully testable on the host.

pub mod orchestrator;
pub mod ports;
pub mod snapshot;
pub mod telemetry;
