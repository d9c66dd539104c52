//! Hardware drivers: one-shot peripheral bring-up and the button latch.

pub mod button;
pub mod hw_init;
