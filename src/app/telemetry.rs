//! Telemetry metric catalogue and topic/payload formatting.
//!
//! One [`Metric`] per published quantity. The MQTT adapter walks this
//! table to register Home Assistant discovery metadata at broker
//! connect; the orchestrator walks it to emit state payloads each
//! publish cycle. Topic convention:
//!
//! ```text
//! homeassistant/sensor/<device>_<metric>/state
//! homeassistant/sensor/<device>_<metric>/config
//! ```

use core::fmt::Write as _;

use crate::app::snapshot::SensorSnapshot;

/// Maximum topic length the publish path ever produces.
pub const TOPIC_CAP: usize = 96;

pub type Topic = heapless::String<TOPIC_CAP>;

/// A published quantity and its Home Assistant metadata.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    /// Topic segment (`<device>_<key>`).
    pub key: &'static str,
    /// Human-readable entity name suffix.
    pub name: &'static str,
    pub unit: &'static str,
    /// Home Assistant device class, where one exists for the quantity.
    pub device_class: Option<&'static str>,
}

/// Every metric the device publishes, in publish order.
pub const METRICS: &[Metric] = &[
    Metric { key: "temperature", name: "Temperature", unit: "°F", device_class: Some("temperature") },
    Metric { key: "humidity", name: "Humidity", unit: "%", device_class: Some("humidity") },
    Metric { key: "pressure", name: "Pressure", unit: "hPa", device_class: Some("pressure") },
    Metric { key: "co2", name: "CO2", unit: "ppm", device_class: Some("carbon_dioxide") },
    Metric { key: "pm1_0", name: "PM1.0", unit: "µg/m³", device_class: None },
    Metric { key: "pm2_5", name: "PM2.5", unit: "µg/m³", device_class: None },
    Metric { key: "pm10", name: "PM10", unit: "µg/m³", device_class: None },
    Metric { key: "aqi", name: "AQI", unit: "AQI", device_class: None },
    Metric { key: "gas_resistance", name: "Gas Resistance", unit: "Ω", device_class: None },
];

pub fn state_topic(device_id: &str, key: &str) -> Topic {
    let mut t = Topic::new();
    // Capacity is sized for the longest key; an overlong device id is
    // truncated rather than panicking.
    let _ = write!(t, "homeassistant/sensor/{}_{}/state", device_id, key);
    t
}

pub fn config_topic(device_id: &str, key: &str) -> Topic {
    let mut t = Topic::new();
    let _ = write!(t, "homeassistant/sensor/{}_{}/config", device_id, key);
    t
}

/// Discovery payload for one metric (JSON, Home Assistant schema).
pub fn discovery_payload(device_id: &str, metric: &Metric) -> String {
    let state = state_topic(device_id, metric.key);
    let mut payload = serde_json::json!({
        "name": format!("{} {}", device_id, metric.name),
        "state_topic": state.as_str(),
        "unit_of_measurement": metric.unit,
    });
    if let Some(class) = metric.device_class {
        payload["device_class"] = serde_json::Value::from(class);
    }
    payload.to_string()
}

/// State payload for one metric. Temperature and humidity ship small
/// JSON objects; everything else is a bare number.
pub fn state_payload(metric_key: &str, snapshot: &SensorSnapshot) -> String {
    match metric_key {
        "temperature" => format!("{{ \"temperature\": {:.2} }}", snapshot.temperature_f),
        "humidity" => format!("{{ \"humidity\": {:.2} }}", snapshot.humidity_pct),
        "pressure" => format!("{:.1}", snapshot.pressure_hpa),
        "co2" => snapshot.co2_ppm.to_string(),
        "pm1_0" => snapshot.pm1_0.to_string(),
        "pm2_5" => snapshot.pm2_5.to_string(),
        "pm10" => snapshot.pm10.to_string(),
        "aqi" => snapshot.aqi.to_string(),
        "gas_resistance" => format!("{:.0}", snapshot.gas_resistance_ohm),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_follow_home_assistant_convention() {
        assert_eq!(
            state_topic("esp32", "co2").as_str(),
            "homeassistant/sensor/esp32_co2/state"
        );
        assert_eq!(
            config_topic("esp32", "pm2_5").as_str(),
            "homeassistant/sensor/esp32_pm2_5/config"
        );
    }

    #[test]
    fn discovery_payload_carries_device_class_when_present() {
        let m = &METRICS[0]; // temperature
        let json: serde_json::Value =
            serde_json::from_str(&discovery_payload("esp32", m)).unwrap();
        assert_eq!(json["device_class"], "temperature");
        assert_eq!(json["state_topic"], "homeassistant/sensor/esp32_temperature/state");
        assert_eq!(json["unit_of_measurement"], "°F");
    }

    #[test]
    fn discovery_payload_omits_missing_device_class() {
        let aqi = METRICS.iter().find(|m| m.key == "aqi").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&discovery_payload("esp32", aqi)).unwrap();
        assert!(json.get("device_class").is_none());
    }

    #[test]
    fn state_payload_shapes() {
        let snap = SensorSnapshot {
            temperature_f: 72.5,
            humidity_pct: 40.25,
            co2_ppm: 800,
            aqi: 42,
            ..Default::default()
        };
        let t: serde_json::Value =
            serde_json::from_str(&state_payload("temperature", &snap)).unwrap();
        assert!((t["temperature"].as_f64().unwrap() - 72.5).abs() < 1e-6);
        assert_eq!(state_payload("co2", &snap), "800");
        assert_eq!(state_payload("aqi", &snap), "42");
    }
}
