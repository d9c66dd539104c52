//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`] — the join/drop primitive the
//! connectivity manager drives. All retry and backoff policy lives in
//! the manager; this adapter only performs one bounded join attempt
//! when asked.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi STA via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation with deterministic failure
//!   injection for host-side tests.

use log::{info, warn};

use crate::app::ports::NetworkPort;
use crate::error::CommsError;

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> bool {
    !ssid.is_empty() && ssid.len() <= 32 && is_printable_ascii(ssid)
}

fn validate_password(password: &str) -> bool {
    // Empty = open network; otherwise WPA2 length rules.
    password.is_empty() || (8..=64).contains(&password.len())
}

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_remaining: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_up: false,
            sim_connect_counter: 0,
            sim_fail_remaining: 0,
        }
    }

    /// Store credentials for subsequent join attempts.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), CommsError> {
        if !validate_ssid(ssid) || !validate_password(password) {
            warn!("wifi: rejected invalid credentials (ssid '{}')", ssid);
            return Err(CommsError::JoinFailed);
        }
        self.ssid.clear();
        self.password.clear();
        // Lengths were validated against the buffer capacities above.
        let _ = self.ssid.push_str(ssid);
        let _ = self.password.push_str(password);
        info!("wifi: credentials set (ssid '{}')", self.ssid);
        Ok(())
    }

    /// Script the next `n` join attempts to fail (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next_joins(&mut self, n: u32) {
        self.sim_fail_remaining = n;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_ms: u64) -> Result<(), CommsError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|()| CommsError::JoinFailed)?,
            password: self.password.as_str().try_into().map_err(|()| CommsError::JoinFailed)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&config)
            .map_err(|_| CommsError::JoinFailed)?;

        // BlockingWifi applies its own association timeout, which matches
        // the configured join window; timeout_ms is logged for context.
        info!("wifi: joining '{}' ({}s budget)", self.ssid, timeout_ms / 1000);
        self.wifi.start().map_err(|_| CommsError::JoinFailed)?;
        self.wifi.connect().map_err(|_| CommsError::JoinFailed)?;
        self.wifi.wait_netif_up().map_err(|_| CommsError::JoinFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _timeout_ms: u64) -> Result<(), CommsError> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        if self.sim_fail_remaining > 0 {
            self.sim_fail_remaining -= 1;
            warn!("wifi(sim): scripted join failure (attempt {})", self.sim_connect_counter);
            return Err(CommsError::JoinFailed);
        }
        self.sim_up = true;
        info!("wifi(sim): joined '{}' (attempt {})", self.ssid, self.sim_connect_counter);
        Ok(())
    }
}

impl NetworkPort for WifiAdapter {
    fn connect(&mut self, timeout_ms: u64) -> Result<(), CommsError> {
        if self.ssid.is_empty() {
            warn!("wifi: no credentials configured");
            return Err(CommsError::JoinFailed);
        }
        self.platform_connect(timeout_ms)
    }

    #[cfg(target_os = "espidf")]
    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_connected(&self) -> bool {
        self.sim_up
    }

    #[cfg(target_os = "espidf")]
    fn disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("wifi: disconnect failed — {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn disconnect(&mut self) {
        self.sim_up = false;
        info!("wifi(sim): disconnected");
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_overlong_ssid() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials("", "password123").is_err());
        let long = "x".repeat(33);
        assert!(a.set_credentials(&long, "password123").is_err());
    }

    #[test]
    fn rejects_short_password_accepts_open_network() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials("HomeNet", "short").is_err());
        assert!(a.set_credentials("OpenCafe", "").is_ok());
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(15_000), Err(CommsError::JoinFailed));
        assert!(!a.is_connected());
    }

    #[test]
    fn scripted_failures_then_success() {
        let mut a = WifiAdapter::new();
        a.set_credentials("HomeNet", "password1").unwrap();
        a.sim_fail_next_joins(2);
        assert!(a.connect(15_000).is_err());
        assert!(a.connect(15_000).is_err());
        assert!(a.connect(15_000).is_ok());
        assert!(a.is_connected());
        a.disconnect();
        assert!(!a.is_connected());
    }
}
