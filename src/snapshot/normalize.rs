//! Normalization of raw document-store records into canonical snapshots.
//!
//! Normalization is total: a malformed field becomes `None`, a malformed
//! timestamp becomes the batch receive instant. Nothing here returns an error.

use crate::snapshot::types::{Behavior, PostureRisk, RawRecord, Snapshot};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Epoch values at or above this magnitude are read as milliseconds.
const EPOCH_MILLIS_CUTOFF: f64 = 1e12;

/// Options applied while normalizing a batch.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Confidence used when a record carries none
    pub default_confidence: f64,
    /// Instant the batch was received, used for unusable timestamps
    pub received_at: DateTime<Utc>,
}

impl NormalizeOptions {
    pub fn new(default_confidence: f64, received_at: DateTime<Utc>) -> Self {
        Self {
            default_confidence,
            received_at,
        }
    }
}

/// A finite JSON number, or `None`.
pub fn safe_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Convert any supported timestamp encoding into an instant.
///
/// Accepts a backend-native `{seconds, nanoseconds}` object (with or without
/// leading underscores), epoch seconds or milliseconds, and date strings.
pub fn normalize_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?)
                .single()
        }
        Value::Number(n) => {
            let raw = n.as_f64().filter(|v| v.is_finite())?;
            let millis = if raw.abs() >= EPOCH_MILLIS_CUTOFF {
                raw
            } else {
                raw * 1000.0
            };
            Utc.timestamp_millis_opt(millis.round() as i64).single()
        }
        Value::String(s) => parse_date_string(s.trim()),
        _ => None,
    }
}

/// Zone-less layouts tried after RFC 3339, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Normalize one raw record.
pub fn normalize_record(raw: &RawRecord, options: &NormalizeOptions) -> Snapshot {
    let timestamp = raw
        .timestamp
        .as_ref()
        .and_then(normalize_timestamp)
        .unwrap_or(options.received_at);

    let behavior = non_empty_str(raw.behavior.as_ref())
        .or_else(|| non_empty_str(raw.emotion.as_ref()))
        .and_then(Behavior::parse);

    let confidence = safe_number(raw.confidence.as_ref())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(options.default_confidence);

    Snapshot {
        timestamp,
        temperature: safe_number(raw.temperature.as_ref()),
        heart_rate: safe_number(raw.heart_rate.as_ref()),
        humidity: safe_number(raw.humidity.as_ref()),
        behavior,
        posture: non_empty_str(raw.posture.as_ref()).map(str::to_string),
        posture_risk: non_empty_str(raw.posture_risk.as_ref()).and_then(PostureRisk::parse),
        confidence,
        image_url: non_empty_str(raw.image_url.as_ref()).map(str::to_string),
    }
}

/// Normalize a batch and order it by timestamp, ascending.
///
/// The sort is stable, so records sharing a timestamp keep their arrival order.
pub fn normalize_batch(records: &[RawRecord], options: &NormalizeOptions) -> Vec<Snapshot> {
    let mut snapshots: Vec<Snapshot> = records
        .iter()
        .map(|raw| normalize_record(raw, options))
        .collect();
    snapshots.sort_by_key(|s| s.timestamp);

    let fallback_count = records
        .iter()
        .filter(|r| r.timestamp.as_ref().and_then(normalize_timestamp).is_none())
        .count();
    if fallback_count > 0 {
        tracing::warn!(
            fallback_count,
            "records without a usable timestamp were stamped with the receive time"
        );
    }
    tracing::debug!(count = snapshots.len(), "normalized snapshot batch");

    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> NormalizeOptions {
        NormalizeOptions::new(1.0, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_timestamp_encodings_agree() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap();

        assert_eq!(normalize_timestamp(&json!(1705917600)), Some(expected));
        assert_eq!(normalize_timestamp(&json!(1705917600000i64)), Some(expected));
        assert_eq!(
            normalize_timestamp(&json!({"seconds": 1705917600, "nanoseconds": 0})),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&json!({"_seconds": 1705917600, "_nanoseconds": 0})),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&json!("2024-01-22T10:00:00Z")),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&json!("2024-01-22 10:00:00")),
            Some(expected)
        );
    }

    #[test]
    fn test_zoneless_date_strings_parse_as_utc() {
        let at = |h, m, s| Utc.with_ymd_and_hms(2024, 1, 22, h, m, s).unwrap();
        let half_past = at(10, 0, 0) + chrono::Duration::milliseconds(500);

        assert_eq!(
            normalize_timestamp(&json!("2024-01-22T10:00:00.500")),
            Some(half_past)
        );
        assert_eq!(
            normalize_timestamp(&json!("2024-01-22 10:00:00.500")),
            Some(half_past)
        );
        assert_eq!(
            normalize_timestamp(&json!("2024-01-22T10:00:00")),
            Some(at(10, 0, 0))
        );
        assert_eq!(
            normalize_timestamp(&json!("2024-01-22T10:05")),
            Some(at(10, 5, 0))
        );
        assert_eq!(
            normalize_timestamp(&json!("2024-01-22 10:05")),
            Some(at(10, 5, 0))
        );
    }

    #[test]
    fn test_fractional_string_keeps_batch_order() {
        let records: Vec<RawRecord> = serde_json::from_value(json!([
            {"timestamp": "2024-01-22T10:00:00Z", "behavior": "sleeping"},
            {"timestamp": "2024-01-22T10:00:10.500", "behavior": "crying", "confidence": 0.9},
            {"timestamp": "2024-01-22T10:00:20Z", "behavior": "sleeping"},
        ]))
        .unwrap();
        let opts = NormalizeOptions::new(1.0, Utc.with_ymd_and_hms(2024, 1, 22, 12, 0, 0).unwrap());

        let snapshots = normalize_batch(&records, &opts);
        let events = crate::core::derive_events(&snapshots, &crate::Config::default().thresholds);

        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Crying Detected", "Recovered to Calm State"]);
        assert_eq!(
            events[1].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 20).unwrap()
        );
    }

    #[test]
    fn test_unparseable_timestamp_is_none() {
        assert_eq!(normalize_timestamp(&json!("yesterday-ish")), None);
        assert_eq!(normalize_timestamp(&json!(true)), None);
        assert_eq!(normalize_timestamp(&json!({"seconds": "soon"})), None);
    }

    #[test]
    fn test_safe_number_rejects_non_numbers() {
        assert_eq!(safe_number(Some(&json!(36.6))), Some(36.6));
        assert_eq!(safe_number(Some(&json!("36.6"))), None);
        assert_eq!(safe_number(Some(&json!(null))), None);
        assert_eq!(safe_number(None), None);
    }

    #[test]
    fn test_malformed_record_normalizes_to_absent_fields() {
        let raw: RawRecord = serde_json::from_value(json!({
            "timestamp": "not a date",
            "temperature": "warm",
            "heart_rate": [140],
            "emotion": "crying",
            "posture_risk": "unknown",
        }))
        .unwrap();

        let snapshot = normalize_record(&raw, &options());
        assert_eq!(snapshot.timestamp, options().received_at);
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.heart_rate, None);
        assert_eq!(snapshot.behavior, Some(Behavior::Crying));
        assert_eq!(snapshot.posture_risk, None);
        assert_eq!(snapshot.confidence, 1.0);
    }

    #[test]
    fn test_behavior_takes_precedence_over_emotion() {
        let raw: RawRecord =
            serde_json::from_value(json!({"behavior": "sleeping", "emotion": "crying"})).unwrap();
        let snapshot = normalize_record(&raw, &options());
        assert_eq!(snapshot.behavior, Some(Behavior::Sleeping));
    }

    #[test]
    fn test_confidence_default_and_clamp() {
        let opts = NormalizeOptions::new(0.9, options().received_at);
        let missing = normalize_record(&RawRecord::default(), &opts);
        assert_eq!(missing.confidence, 0.9);

        let raw: RawRecord = serde_json::from_value(json!({"confidence": 1.7})).unwrap();
        assert_eq!(normalize_record(&raw, &opts).confidence, 1.0);
    }

    #[test]
    fn test_batch_is_sorted_by_timestamp() {
        let records: Vec<RawRecord> = [30, 10, 20]
            .iter()
            .map(|secs| {
                serde_json::from_value(json!({"timestamp": 1705917600 + secs, "heart_rate": secs}))
                    .unwrap()
            })
            .collect();

        let snapshots = normalize_batch(&records, &options());
        let rates: Vec<f64> = snapshots.iter().filter_map(|s| s.heart_rate).collect();
        assert_eq!(rates, vec![10.0, 20.0, 30.0]);
    }
}
