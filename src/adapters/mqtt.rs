//! MQTT publisher adapter.
//!
//! Implements [`PublisherPort`] over `EspMqttClient`. The broker
//! handshake doubles as Home Assistant discovery registration: every
//! metric's `.../config` payload is (re)published on each successful
//! connect, so a restarted Home Assistant instance re-learns the
//! entities without any retained-message dependency.
//!
//! On the host the adapter records every publish for test inspection.

use log::{info, warn};

use crate::app::ports::PublisherPort;
use crate::app::telemetry::{self, METRICS};
use crate::error::CommsError;

pub struct MqttAdapter {
    device_id: heapless::String<16>,
    connected: bool,
    #[cfg(target_os = "espidf")]
    broker_url: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_published: Vec<(String, String)>,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_connects: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_publishes: bool,
}

impl MqttAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(device_id: &str, broker_url: &str) -> Self {
        let mut id = heapless::String::new();
        let _ = id.push_str(device_id);
        let mut url = heapless::String::new();
        let _ = url.push_str(broker_url);
        Self {
            device_id: id,
            connected: false,
            broker_url: url,
            client: None,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(device_id: &str) -> Self {
        let mut id = heapless::String::new();
        let _ = id.push_str(device_id);
        Self {
            device_id: id,
            connected: false,
            sim_published: Vec::new(),
            sim_fail_connects: 0,
            sim_fail_publishes: false,
        }
    }

    /// Everything published so far, in order (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn published(&self) -> &[(String, String)] {
        &self.sim_published
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next_connects(&mut self, n: u32) {
        self.sim_fail_connects = n;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_publishes(&mut self, fail: bool) {
        self.sim_fail_publishes = fail;
    }

    /// Register every metric's discovery metadata with Home Assistant.
    fn publish_discovery(&mut self) {
        for metric in METRICS {
            let topic = telemetry::config_topic(self.device_id.as_str(), metric.key);
            let payload = telemetry::discovery_payload(self.device_id.as_str(), metric);
            if let Err(e) = self.raw_publish(topic.as_str(), &payload) {
                // Telemetry still flows without discovery; HA just won't
                // auto-create the entity until the next reconnect.
                warn!("mqtt: discovery publish failed for '{}' — {}", metric.key, e);
            }
        }
        info!("mqtt: discovery registered for {} metrics", METRICS.len());
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration};

        let conf = MqttClientConfiguration {
            client_id: Some(self.device_id.as_str()),
            ..Default::default()
        };
        // The callback drops incoming events; this device only publishes.
        let client = EspMqttClient::new_cb(self.broker_url.as_str(), &conf, |_| {})
            .map_err(|_| CommsError::BrokerConnectFailed)?;
        self.client = Some(client);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        if self.sim_fail_connects > 0 {
            self.sim_fail_connects -= 1;
            return Err(CommsError::BrokerConnectFailed);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn raw_publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| CommsError::PublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if self.sim_fail_publishes {
            return Err(CommsError::PublishFailed);
        }
        self.sim_published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }
}

impl PublisherPort for MqttAdapter {
    fn connect(&mut self) -> Result<(), CommsError> {
        if self.connected {
            return Ok(());
        }
        self.platform_connect()?;
        self.connected = true;
        info!("mqtt: broker connected (client '{}')", self.device_id);
        self.publish_discovery();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        self.raw_publish(topic, payload)
    }

    fn disconnect(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            // Dropping the client tears the session down.
            self.client = None;
        }
        self.connected = false;
        info!("mqtt: disconnected");
    }

    fn pump(&mut self) {
        // EspMqttClient services its session from an internal task; the
        // keep-alive hook exists for ports whose clients need polling.
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn connect_registers_discovery_for_every_metric() {
        let mut mqtt = MqttAdapter::new("esp32");
        mqtt.connect().unwrap();
        let configs: Vec<_> = mqtt
            .published()
            .iter()
            .filter(|(t, _)| t.ends_with("/config"))
            .collect();
        assert_eq!(configs.len(), METRICS.len());
        assert!(configs.iter().any(|(t, _)| t == "homeassistant/sensor/esp32_aqi/config"));
    }

    #[test]
    fn discovery_payloads_are_valid_json() {
        let mut mqtt = MqttAdapter::new("esp32");
        mqtt.connect().unwrap();
        for (_, payload) in mqtt.published() {
            let v: serde_json::Value = serde_json::from_str(payload).unwrap();
            assert!(v["state_topic"].as_str().unwrap().ends_with("/state"));
        }
    }

    #[test]
    fn publish_requires_connection() {
        let mut mqtt = MqttAdapter::new("esp32");
        assert_eq!(
            mqtt.publish("homeassistant/sensor/esp32_co2/state", "600"),
            Err(CommsError::NotConnected)
        );
    }

    #[test]
    fn scripted_connect_failure() {
        let mut mqtt = MqttAdapter::new("esp32");
        mqtt.sim_fail_next_connects(1);
        assert_eq!(mqtt.connect(), Err(CommsError::BrokerConnectFailed));
        assert!(!mqtt.is_connected());
        assert!(mqtt.connect().is_ok());
        assert!(mqtt.is_connected());
    }

    #[test]
    fn reconnect_is_idempotent_while_up() {
        let mut mqtt = MqttAdapter::new("esp32");
        mqtt.connect().unwrap();
        let n = mqtt.published().len();
        mqtt.connect().unwrap();
        assert_eq!(mqtt.published().len(), n, "no duplicate discovery while connected");
    }
}
