//! Newline-delimited JSON framing shared by the stream and replay sources.
//!
//! Each line is one message:
//!
//! ```json
//! {"topic": "home/weather/rain_sensor", "payload": {"current": 512.0}, "arrival": 1700000000.5}
//! ```
//!
//! `payload` may be a JSON string (passed through as raw bytes) or any other
//! JSON value (re-encoded). `arrival` is optional epoch seconds; when absent
//! the time of reading is used.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Delivery;
use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<f64>,
}

impl Envelope {
    pub fn into_delivery(self, now: SystemTime) -> Delivery {
        let arrival = self
            .arrival
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .map(|d| UNIX_EPOCH + d)
            .unwrap_or(now);

        let payload = match self.payload {
            Value::String(text) => text.into_bytes(),
            other => other.to_string().into_bytes(),
        };

        Delivery {
            topic: self.topic,
            payload,
            arrival,
        }
    }
}

/// Parse one envelope line.
pub fn parse_envelope(line: &str, now: SystemTime) -> Result<Delivery, DecodeError> {
    let envelope: Envelope = serde_json::from_str(line.trim())?;
    Ok(envelope.into_delivery(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_payload_is_reencoded() {
        let now = UNIX_EPOCH + Duration::from_secs(5);
        let delivery =
            parse_envelope(r#"{"topic":"home/env","payload":{"temperature":21.4}}"#, now).unwrap();

        assert_eq!(delivery.topic, "home/env");
        assert_eq!(delivery.arrival, now);
        let value: Value = serde_json::from_slice(&delivery.payload).unwrap();
        assert_eq!(value["temperature"], 21.4);
    }

    #[test]
    fn test_string_payload_passes_through() {
        let delivery = parse_envelope(
            r#"{"topic":"pi/cpu","payload":"temp=48.3'C","arrival":1000.5}"#,
            SystemTime::now(),
        )
        .unwrap();

        assert_eq!(delivery.payload, b"temp=48.3'C");
        assert_eq!(delivery.arrival, UNIX_EPOCH + Duration::from_millis(1_000_500));
    }

    #[test]
    fn test_negative_arrival_falls_back_to_now() {
        let now = UNIX_EPOCH + Duration::from_secs(42);
        let delivery =
            parse_envelope(r#"{"topic":"t","payload":1,"arrival":-3.0}"#, now).unwrap();
        assert_eq!(delivery.arrival, now);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_envelope("not json", SystemTime::now()).is_err());
        assert!(parse_envelope(r#"{"payload":1}"#, SystemTime::now()).is_err());
    }
}
