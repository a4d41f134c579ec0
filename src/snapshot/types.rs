//! Canonical snapshot types.
//!
//! Categorical tags arrive as free-form strings. They are parsed into closed
//! enums with an explicit fallback variant so an unexpected tag can never
//! break a lookup further down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Behavior or emotion classified from the vision and audio pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Sleeping,
    Crying,
    Distress,
    /// A tag outside the known vocabulary, kept verbatim
    Other(String),
}

impl Behavior {
    /// Parse a raw tag. Blank tags are treated as absent.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        Some(match tag.to_ascii_lowercase().as_str() {
            "sleeping" => Behavior::Sleeping,
            "crying" => Behavior::Crying,
            "distress" => Behavior::Distress,
            _ => Behavior::Other(tag.to_string()),
        })
    }

    pub fn is_crying(&self) -> bool {
        matches!(self, Behavior::Crying)
    }
}

/// Sleeping-posture risk reported by the vision pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureRisk {
    Low,
    High,
}

impl PostureRisk {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "low" => Some(PostureRisk::Low),
            "high" => Some(PostureRisk::High),
            _ => None,
        }
    }
}

/// Numeric fields of a snapshot that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    Temperature,
    HeartRate,
    Humidity,
}

/// One timestamped sensor, vision and audio reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Body temperature in °C
    pub temperature: Option<f64>,
    /// Heart rate in bpm
    pub heart_rate: Option<f64>,
    /// Relative humidity in %
    pub humidity: Option<f64>,
    pub behavior: Option<Behavior>,
    pub posture: Option<String>,
    pub posture_risk: Option<PostureRisk>,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
    pub image_url: Option<String>,
}

impl Snapshot {
    /// Create a snapshot with no readings.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature: None,
            heart_rate: None,
            humidity: None,
            behavior: None,
            posture: None,
            posture_risk: None,
            confidence: 1.0,
            image_url: None,
        }
    }

    /// Read one of the numeric fields.
    pub fn vital(&self, field: VitalField) -> Option<f64> {
        match field {
            VitalField::Temperature => self.temperature,
            VitalField::HeartRate => self.heart_rate,
            VitalField::Humidity => self.humidity,
        }
    }

    pub fn is_crying(&self) -> bool {
        self.behavior.as_ref().is_some_and(Behavior::is_crying)
    }

    pub fn has_unsafe_posture(&self) -> bool {
        self.posture_risk == Some(PostureRisk::High)
    }

    pub fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn with_heart_rate(mut self, value: f64) -> Self {
        self.heart_rate = Some(value);
        self
    }

    pub fn with_humidity(mut self, value: f64) -> Self {
        self.humidity = Some(value);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_posture_risk(mut self, risk: PostureRisk) -> Self {
        self.posture_risk = Some(risk);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A record as delivered by the document store.
///
/// Every field is kept as an untyped JSON value: the normalizer decides what
/// is usable, so deserializing a record never fails on a malformed field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub temperature: Option<serde_json::Value>,
    #[serde(default, alias = "heartRate")]
    pub heart_rate: Option<serde_json::Value>,
    #[serde(default)]
    pub humidity: Option<serde_json::Value>,
    #[serde(default)]
    pub behavior: Option<serde_json::Value>,
    #[serde(default)]
    pub emotion: Option<serde_json::Value>,
    #[serde(default)]
    pub posture: Option<serde_json::Value>,
    #[serde(default, alias = "postureRisk")]
    pub posture_risk: Option<serde_json::Value>,
    #[serde(default)]
    pub confidence: Option<serde_json::Value>,
    #[serde(default)]
    pub image_url: Option<serde_json::Value>,
}

impl RawRecord {
    /// Build a record from any JSON value.
    ///
    /// Returns `None` for non-objects. When both spellings of an aliased key
    /// are present the snake_case one wins.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let map = value.as_object()?;
        let field = |keys: &[&str]| keys.iter().find_map(|key| map.get(*key)).cloned();

        Some(Self {
            timestamp: field(&["timestamp"]),
            temperature: field(&["temperature"]),
            heart_rate: field(&["heart_rate", "heartRate"]),
            humidity: field(&["humidity"]),
            behavior: field(&["behavior"]),
            emotion: field(&["emotion"]),
            posture: field(&["posture"]),
            posture_risk: field(&["posture_risk", "postureRisk"]),
            confidence: field(&["confidence"]),
            image_url: field(&["image_url"]),
        })
    }
}
