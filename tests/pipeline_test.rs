//! Integration tests for the record-to-analysis pipeline

use chrono::{TimeZone, Utc};
use cradlewatch::core::{LiveStatus, Trend};
use cradlewatch::{
    analyze, derive_events, normalize_batch, read_records, Config, NormalizeOptions, RawRecord,
    Severity, Status,
};
use std::io::Write;

fn options() -> NormalizeOptions {
    NormalizeOptions::new(1.0, Utc.with_ymd_and_hms(2024, 1, 22, 12, 0, 0).unwrap())
}

fn write_fixture(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("readings.jsonl");
    let mut file = std::fs::File::create(&path).expect("Failed to create fixture");
    file.write_all(content.as_bytes()).expect("Failed to write fixture");
    (dir, path)
}

#[test]
fn test_crying_lifecycle_from_mixed_encodings() {
    // Out of order, with three timestamp encodings and a missing confidence.
    let content = r#"
{"timestamp": {"seconds": 1705917620, "nanoseconds": 0}, "behavior": "crying", "confidence": 0.9, "heart_rate": 150}
{"timestamp": 1705917600, "behavior": "sleeping", "heart_rate": 140, "temperature": 33.1}
{"timestamp": "2024-01-22T10:00:10Z", "behavior": "crying", "confidence": 0.5, "heart_rate": 148}
{"timestamp": 1705917630000, "behavior": "sleeping", "heart_rate": 141}
"#;
    let (_dir, path) = write_fixture(content);

    let records = read_records(&path).expect("Failed to read records");
    assert_eq!(records.len(), 4);

    let snapshots = normalize_batch(&records, &options());
    let events = derive_events(&snapshots, &Config::default().thresholds);

    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Crying Detected", "Prolonged Distress", "Recovered to Calm State"]
    );
    assert_eq!(
        events[0].description,
        "Facial analysis detected crying with 50% confidence."
    );
    assert_eq!(events[1].severity, Severity::High);
    assert_eq!(
        events[2].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 30).unwrap()
    );
}

#[test]
fn test_malformed_fields_do_not_fire_rules() {
    let content = r#"[
        {"timestamp": 1705917600, "heart_rate": "fast", "temperature": null},
        {"timestamp": 1705917610, "heart_rate": 175, "temperature": "hot"},
        {"timestamp": 1705917620, "heart_rate": 176, "emotion": "grumpy"}
    ]"#;
    let (_dir, path) = write_fixture(content);

    let snapshots = normalize_batch(&read_records(&path).unwrap(), &options());
    let analysis = analyze(&snapshots, &Config::default(), options().received_at);

    // Only the last transition has two valid readings above the ceiling.
    assert_eq!(analysis.events.len(), 1);
    assert_eq!(analysis.events[0].title, "Heart Rate Spike");
    assert_eq!(analysis.moods.unknown, 3);
    assert_eq!(analysis.insight.status, Status::Critical);
}

#[test]
fn test_full_analysis_of_calm_batch() {
    let records: Vec<RawRecord> = (0..10)
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "timestamp": 1705917600 + i * 10,
                "temperature": 33.0 + i as f64 * 0.1,
                "heart_rate": 140,
                "humidity": 50,
                "behavior": "sleeping",
                "posture_risk": "low",
            }))
            .unwrap()
        })
        .collect();
    let snapshots = normalize_batch(&records, &options());

    let analysis = analyze(&snapshots, &Config::default(), options().received_at);
    assert!(analysis.events.is_empty());
    assert_eq!(analysis.insight.status, Status::Stable);
    assert_eq!(analysis.live_status, Some(LiveStatus::Safe));

    let vitals = analysis.vitals.expect("vitals insight should be available");
    assert_eq!(vitals.temperature_trend, Trend::Rising);
    assert_eq!(vitals.heart_rate_trend, Trend::Stable);
    assert_eq!(vitals.comfort, 100);

    let temperature = analysis.trends.temperature.unwrap();
    assert_eq!(temperature.normal_pct, 100);
    assert_eq!(analysis.moods.sleeping, 10);
    assert!(analysis
        .insight
        .narrative
        .starts_with("Analysis of the most recent 10 sensor snapshots"));
}

#[test]
fn test_each_batch_is_analyzed_independently() {
    let config = Config::default();
    let at = options().received_at;

    let first: Vec<RawRecord> = [170, 171]
        .iter()
        .enumerate()
        .map(|(i, hr)| {
            serde_json::from_value(
                serde_json::json!({"timestamp": 1705917600 + i as i64, "heart_rate": hr}),
            )
            .unwrap()
        })
        .collect();
    let second: Vec<RawRecord> = [120, 125]
        .iter()
        .enumerate()
        .map(|(i, hr)| {
            serde_json::from_value(
                serde_json::json!({"timestamp": 1705917700 + i as i64, "heart_rate": hr}),
            )
            .unwrap()
        })
        .collect();

    let a = analyze(&normalize_batch(&first, &options()), &config, at);
    let b = analyze(&normalize_batch(&second, &options()), &config, at);
    let a_again = analyze(&normalize_batch(&first, &options()), &config, at);

    assert_eq!(a.events.len(), 1);
    assert!(b.events.is_empty());
    assert_eq!(a, a_again);
}
