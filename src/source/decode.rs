//! Topic routing and payload decoding.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::data::{Channel, RainReport};
use crate::error::DecodeError;

/// Payload family a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Environment,
    PiCpu,
    AdsCpu,
    Co2,
    Thi,
    Rain,
}

/// Result of decoding one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Plain channel readings. Empty when the payload was filtered out.
    Readings(Vec<(Channel, f64)>),
    Rain(RainReport),
}

#[derive(Debug, Deserialize)]
struct DevicePayload {
    device_id: Option<String>,
    co2: Option<Value>,
    thi: Option<Value>,
}

/// Maps configured topics to routes and decodes their payloads.
#[derive(Debug, Clone, Default)]
pub struct TopicRouter {
    routes: HashMap<String, Route>,
    device_id: Option<String>,
}

impl TopicRouter {
    pub fn new(settings: &Settings) -> Self {
        let topics = &settings.topics;
        let configured = [
            (&topics.environment, Route::Environment),
            (&topics.pi_cpu, Route::PiCpu),
            (&topics.ads_cpu, Route::AdsCpu),
            (&topics.co2, Route::Co2),
            (&topics.thi, Route::Thi),
            (&topics.rain, Route::Rain),
        ];

        let routes = configured
            .into_iter()
            .filter_map(|(topic, route)| topic.clone().map(|t| (t, route)))
            .collect();

        Self {
            routes,
            device_id: settings.device_id.clone(),
        }
    }

    pub fn route(&self, topic: &str) -> Option<Route> {
        self.routes.get(topic).copied()
    }

    pub fn decode(&self, route: Route, payload: &[u8]) -> Result<Decoded, DecodeError> {
        match route {
            Route::Environment => {
                let value: Value = serde_json::from_slice(payload)?;
                let readings: Vec<_> = [
                    (Channel::Temperature, number(&value, "temperature")),
                    (Channel::Humidity, number(&value, "humidity")),
                ]
                .into_iter()
                .filter_map(|(channel, v)| v.map(|v| (channel, v)))
                .collect();

                if readings.is_empty() {
                    return Err(DecodeError::MissingField("temperature"));
                }
                Ok(Decoded::Readings(readings))
            }
            Route::AdsCpu => {
                let value: Value = serde_json::from_slice(payload)?;
                let temp =
                    number(&value, "temperature").ok_or(DecodeError::MissingField("temperature"))?;
                Ok(Decoded::Readings(vec![(Channel::CpuTempAds, temp)]))
            }
            Route::PiCpu => {
                let text = String::from_utf8_lossy(payload);
                let temp = parse_cpu_text(&text)?;
                Ok(Decoded::Readings(vec![(Channel::CpuTempPi, temp)]))
            }
            Route::Co2 => self.decode_device(payload, Channel::Co2),
            Route::Thi => self.decode_device(payload, Channel::Thi),
            Route::Rain => Ok(Decoded::Rain(serde_json::from_slice(payload)?)),
        }
    }

    fn decode_device(&self, payload: &[u8], channel: Channel) -> Result<Decoded, DecodeError> {
        let parsed: DevicePayload = serde_json::from_slice(payload)?;

        if let Some(wanted) = &self.device_id {
            if parsed.device_id.as_deref() != Some(wanted.as_str()) {
                debug!(
                    "Skipping {} reading from device {:?}",
                    channel, parsed.device_id
                );
                return Ok(Decoded::Readings(Vec::new()));
            }
        }

        let (field, raw) = match channel {
            Channel::Co2 => ("co2", parsed.co2),
            _ => ("thi", parsed.thi),
        };
        let value = raw
            .as_ref()
            .and_then(as_number)
            .ok_or(DecodeError::MissingField(field))?;
        Ok(Decoded::Readings(vec![(channel, value)]))
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(as_number)
}

/// Parse `temp=48.3'C` as printed by `vcgencmd measure_temp`.
fn parse_cpu_text(text: &str) -> Result<f64, DecodeError> {
    let text = text.trim();
    let rest = text.strip_prefix("temp=").unwrap_or(text);
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(rest.len());

    rest[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::Pattern(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> TopicRouter {
        let mut settings = Settings::default();
        settings.topics.environment = Some("home/env4".to_string());
        settings.topics.pi_cpu = Some("pi/cpu".to_string());
        settings.topics.ads_cpu = Some("ads/cpu".to_string());
        settings.topics.co2 = Some("home/co2".to_string());
        settings.topics.thi = Some("home/thi".to_string());
        TopicRouter::new(&settings)
    }

    #[test]
    fn test_routes_configured_topics_only() {
        let router = router();
        assert_eq!(router.route("home/env4"), Some(Route::Environment));
        assert_eq!(router.route("home/weather/rain_sensor"), Some(Route::Rain));
        assert_eq!(router.route("home/unknown"), None);
    }

    #[test]
    fn test_environment_payload() {
        let decoded = router()
            .decode(Route::Environment, br#"{"temperature": 21.4, "humidity": 55.0}"#)
            .unwrap();
        assert_eq!(
            decoded,
            Decoded::Readings(vec![(Channel::Temperature, 21.4), (Channel::Humidity, 55.0)])
        );

        let partial = router().decode(Route::Environment, br#"{"humidity": "61.5"}"#).unwrap();
        assert_eq!(partial, Decoded::Readings(vec![(Channel::Humidity, 61.5)]));

        assert!(matches!(
            router().decode(Route::Environment, br#"{"pressure": 1013}"#),
            Err(DecodeError::MissingField("temperature"))
        ));
    }

    #[test]
    fn test_pi_cpu_text() {
        let decoded = router().decode(Route::PiCpu, b"temp=48.3'C\n").unwrap();
        assert_eq!(decoded, Decoded::Readings(vec![(Channel::CpuTempPi, 48.3)]));

        assert!(matches!(
            router().decode(Route::PiCpu, b"temperature unknown"),
            Err(DecodeError::Pattern(_))
        ));
    }

    #[test]
    fn test_ads_cpu() {
        let decoded = router().decode(Route::AdsCpu, br#"{"temperature": 51.2}"#).unwrap();
        assert_eq!(decoded, Decoded::Readings(vec![(Channel::CpuTempAds, 51.2)]));
    }

    #[test]
    fn test_device_filter() {
        let mut settings = Settings::default();
        settings.topics.co2 = Some("home/co2".to_string());
        settings.device_id = Some("pico_w_production".to_string());
        let router = TopicRouter::new(&settings);

        let ours = br#"{"device_id": "pico_w_production", "co2": 612, "timestamp": 1}"#;
        assert_eq!(
            router.decode(Route::Co2, ours).unwrap(),
            Decoded::Readings(vec![(Channel::Co2, 612.0)])
        );

        let theirs = br#"{"device_id": "pico_w_dev", "co2": 9999}"#;
        assert_eq!(router.decode(Route::Co2, theirs).unwrap(), Decoded::Readings(vec![]));
    }

    #[test]
    fn test_thi_without_filter_accepts_any_device() {
        let decoded = router()
            .decode(Route::Thi, br#"{"device_id": "anything", "thi": 72.5}"#)
            .unwrap();
        assert_eq!(decoded, Decoded::Readings(vec![(Channel::Thi, 72.5)]));
    }

    #[test]
    fn test_rain_payload() {
        let payload = br#"{"id": "rain01", "current": 530.0, "baseline": 500.0, "uptime": 120, "cable_ok": true}"#;
        match router().decode(Route::Rain, payload).unwrap() {
            Decoded::Rain(report) => {
                assert_eq!(report.current, Some(530.0));
                assert_eq!(report.cable_ok, Some(true));
            }
            other => panic!("expected rain report, got {:?}", other),
        }

        assert!(router().decode(Route::Rain, b"garbage").is_err());
    }
}
