//! Driven adapters — implementations of the [`crate::app::ports`]
//! traits over real ESP-IDF peripherals, with host simulations for
//! tests.

pub mod mqtt;
pub mod oled;
pub mod system;
pub mod time;
pub mod wifi;
