//! SoC restart primitive.

use log::error;

use crate::app::ports::RestartPort;

/// [`RestartPort`] over `esp_restart()`. On the host the request is
/// only recorded, so a simulated run continues past it.
pub struct SystemAdapter {
    #[cfg(not(target_os = "espidf"))]
    restart_requests: u32,
}

impl Default for SystemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            restart_requests: 0,
        }
    }

    /// Number of restart requests observed (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn restart_requests(&self) -> u32 {
        self.restart_requests
    }
}

impl RestartPort for SystemAdapter {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        error!("system: restarting now");
        // SAFETY: esp_restart has no preconditions; it does not return.
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        self.restart_requests += 1;
        error!("system(sim): restart request #{}", self.restart_requests);
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn sim_restart_is_recorded_not_fatal() {
        let mut sys = SystemAdapter::new();
        sys.restart();
        sys.restart();
        assert_eq!(sys.restart_requests(), 2);
    }
}
