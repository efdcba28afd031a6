//! Payload builder module.
//!
//! Turns form values and synthetic readings into the JSON envelopes accepted by
//! the activation and stream ingestion endpoints.
//!
//! The stream envelope carries the reading as a JSON *string* in its `Data`
//! field, so the reading is encoded twice: once on its own, then again as a
//! string value inside the outer envelope. The listener expects that shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Timestamp layout of `MeasuredOn`: ISO-8601, second precision, no offset.
const MEASURED_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors that can occur while building a payload.
#[derive(Debug)]
pub enum PayloadError {
    /// A reading could not be serialized
    Serialize(serde_json::Error),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Serialize(e) => write!(f, "Failed to serialize reading: {}", e),
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayloadError::Serialize(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        PayloadError::Serialize(err)
    }
}

/// A single synthetic sensor reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Name of the simulated sensor
    #[serde(rename = "Sensor")]
    pub sensor: String,

    /// Temperature sample
    #[serde(rename = "Temperature")]
    pub temperature: i32,

    /// Pressure sample
    #[serde(rename = "Pressure")]
    pub pressure: i32,

    /// UTC measurement time, see [`format_measured_on`]
    #[serde(rename = "MeasuredOn")]
    pub measured_on: String,
}

impl SensorReading {
    /// Create a reading stamped with the current UTC time.
    pub fn new(sensor: impl Into<String>, temperature: i32, pressure: i32) -> Self {
        Self::at(sensor, temperature, pressure, Utc::now())
    }

    /// Create a reading stamped with the given time.
    pub fn at(
        sensor: impl Into<String>,
        temperature: i32,
        pressure: i32,
        measured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sensor: sensor.into(),
            temperature,
            pressure,
            measured_on: format_measured_on(measured_at),
        }
    }

    /// Serialize the reading to a compact JSON string.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS`, truncating sub-second digits.
pub fn format_measured_on(at: DateTime<Utc>) -> String {
    at.format(MEASURED_ON_FORMAT).to_string()
}

/// Body of a request to the activation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEnvelope {
    /// Edge bot activation key
    #[serde(rename = "AKEY")]
    pub activation_key: String,

    /// Raw JSON body from the form, sent as a string
    #[serde(rename = "Payload")]
    pub payload: String,
}

/// Body of a request to the stream ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEnvelope {
    /// Input stream key
    #[serde(rename = "IKEY")]
    pub stream_key: String,

    /// Data point, already JSON-encoded
    #[serde(rename = "Data")]
    pub data: String,
}

/// Either request body shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Activation(ActivationEnvelope),
    Stream(StreamEnvelope),
}

impl Envelope {
    /// Short name of the envelope kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Activation(_) => "activation",
            Envelope::Stream(_) => "stream",
        }
    }
}

impl From<ActivationEnvelope> for Envelope {
    fn from(envelope: ActivationEnvelope) -> Self {
        Envelope::Activation(envelope)
    }
}

impl From<StreamEnvelope> for Envelope {
    fn from(envelope: StreamEnvelope) -> Self {
        Envelope::Stream(envelope)
    }
}

/// Build the activation body. The JSON body is passed through unvalidated.
pub fn build_activation_envelope(config: &Config) -> ActivationEnvelope {
    ActivationEnvelope {
        activation_key: config.activation_key.clone(),
        payload: config.json_body.clone(),
    }
}

/// Build a stream body carrying `reading` as a JSON string.
pub fn build_stream_envelope(
    config: &Config,
    reading: &SensorReading,
) -> Result<StreamEnvelope, PayloadError> {
    Ok(StreamEnvelope {
        stream_key: config.stream_key.clone(),
        data: reading.to_json()?,
    })
}

/// Build a stream body carrying the form's raw JSON body as its data point.
pub fn build_pattern_envelope(config: &Config) -> StreamEnvelope {
    StreamEnvelope {
        stream_key: config.stream_key.clone(),
        data: config.json_body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn test_config() -> Config {
        Config::new("k", "a", "s", r#"{"x":1}"#)
    }

    #[test]
    fn test_activation_envelope_serialization() {
        let envelope = build_activation_envelope(&test_config());
        let json = serde_json::to_string(&envelope).unwrap();

        assert_eq!(json, r#"{"AKEY":"a","Payload":"{\"x\":1}"}"#);
    }

    #[test]
    fn test_activation_envelope_passes_invalid_json_through() {
        let config = Config::new("k", "a", "s", "{a:");
        let envelope = build_activation_envelope(&config);
        assert_eq!(envelope.payload, "{a:");
    }

    #[test]
    fn test_stream_envelope_is_double_encoded() {
        let reading = SensorReading::new("Sensor 1", 32, 85);
        let envelope = build_stream_envelope(&test_config(), &reading).unwrap();
        let json = serde_json::to_string(&envelope).unwrap();

        let outer: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(outer["IKEY"], "s");

        // Data is a string, not a nested object
        let data = outer["Data"].as_str().expect("Data should be a string");
        let inner: serde_json::Value = serde_json::from_str(data).unwrap();
        let keys: Vec<&str> = inner
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["Sensor", "Temperature", "Pressure", "MeasuredOn"]);
        assert_eq!(inner["Sensor"], "Sensor 1");
        assert_eq!(inner["Temperature"], 32);
        assert_eq!(inner["Pressure"], 85);
    }

    #[test]
    fn test_measured_on_has_second_precision() {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 4)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        assert_eq!(format_measured_on(at), "2024-03-09T07:05:04");

        let reading = SensorReading::at("Sensor 1", 30, 80, at);
        assert_eq!(reading.measured_on, "2024-03-09T07:05:04");
    }

    #[test]
    fn test_pattern_envelope_uses_raw_body() {
        let envelope = build_pattern_envelope(&test_config());
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"IKEY":"s","Data":"{\"x\":1}"}"#);
    }

    #[test]
    fn test_envelope_serializes_untagged() {
        let envelope: Envelope = build_activation_envelope(&test_config()).into();
        assert_eq!(envelope.kind(), "activation");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.starts_with(r#"{"AKEY":"a""#));

        let envelope: Envelope = build_pattern_envelope(&test_config()).into();
        assert_eq!(envelope.kind(), "stream");
    }

    #[test]
    fn test_empty_config_values_are_submitted() {
        let envelope = build_activation_envelope(&Config::default());
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"AKEY":"","Payload":""}"#);
    }
}
