//! Display toggle button — ISR latch.
//!
//! ## Hardware
//!
//! Active-low momentary switch (the boot button) with internal pull-up.
//! GPIO fires on the falling edge; the ISR does nothing but store `true`
//! into a single latch atomic. No I/O, no time reads, no other shared
//! state from interrupt context.
//!
//! ## Consumption
//!
//! The orchestrator calls [`take_toggle_request`] once per tick, which
//! swaps the latch back to `false`. Any number of ISR firings between
//! two consecutive ticks therefore collapse into exactly one toggle —
//! the latch carries "a press happened", not a press count.

use core::sync::atomic::{AtomicBool, Ordering};

/// Press latch. Written by the ISR, consumed by the main loop.
static TOGGLE_REQUESTED: AtomicBool = AtomicBool::new(false);

/// ISR handler — register on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
pub fn button_isr_handler() {
    TOGGLE_REQUESTED.store(true, Ordering::Release);
}

/// Consume the pending toggle request, if any. Returns `true` at most
/// once per press burst. Registration of the GPIO interrupt itself
/// lives in `drivers::hw_init::init_isr_service`.
pub fn take_toggle_request() -> bool {
    TOGGLE_REQUESTED.swap(false, Ordering::AcqRel)
}
