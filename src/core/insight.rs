//! Status classification and the natural-language insight summary.
//!
//! The summary covers the most recent `windows.summary` snapshots of a batch.
//! Placeholder averages are displayed but never escalate the status.

use crate::config::{Config, Thresholds};
use crate::core::events::Tone;
use crate::core::windowing::{field_average, trailing, Aggregate};
use crate::snapshot::{Snapshot, VitalField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse system-wide classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Stable,
    Attention,
    Critical,
}

impl Status {
    /// Chip label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Stable => "Stable Condition",
            Status::Attention => "Attention Recommended",
            Status::Critical => "Critical Alert",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Status::Stable => Tone::Success,
            Status::Attention => Tone::Warning,
            Status::Critical => Tone::Error,
        }
    }

    /// Closing phrase of the narrative.
    fn assessment(&self) -> &'static str {
        match self {
            Status::Stable => "stable physiological condition.",
            Status::Attention => "state requiring caregiver attention.",
            Status::Critical => "critical state requiring immediate review.",
        }
    }
}

/// Aggregates and narrative over a window of snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSummary {
    pub status: Status,
    /// Snapshots in the summarized window
    pub sample_count: usize,
    pub avg_temperature: Aggregate,
    pub avg_heart_rate: Aggregate,
    pub avg_humidity: Aggregate,
    /// Snapshots classified as crying
    pub crying_count: usize,
    /// Snapshots with a high posture risk
    pub unsafe_posture_count: usize,
    pub narrative: String,
}

/// Classify the status tier.
///
/// Critical (average temperature or heart rate too high) overrides attention
/// (too many crying or unsafe-posture snapshots).
pub fn classify_status(
    avg_temperature: Option<f64>,
    avg_heart_rate: Option<f64>,
    crying_count: usize,
    unsafe_posture_count: usize,
    thresholds: &Thresholds,
) -> Status {
    let too_hot = avg_temperature.is_some_and(|t| t > thresholds.critical_temperature);
    let racing = avg_heart_rate.is_some_and(|hr| hr > thresholds.critical_heart_rate);
    if too_hot || racing {
        return Status::Critical;
    }

    if crying_count > thresholds.crying_attention_count
        || unsafe_posture_count > thresholds.unsafe_posture_attention_count
    {
        return Status::Attention;
    }

    Status::Stable
}

fn reading(aggregate: &Aggregate, unit: &str) -> String {
    match aggregate.value() {
        Some(value) => format!("{value}{unit}"),
        None => "n/a".to_string(),
    }
}

/// Compose the narrative paragraph for a summary.
///
/// An empty summary is reported as covering `window` snapshots, the size it
/// was asked to cover.
pub fn compose_narrative(summary: &InsightSummary, window: usize) -> String {
    let analysed = if summary.sample_count == 0 {
        window
    } else {
        summary.sample_count
    };

    let crying = match summary.crying_count {
        0 => "No crying events were detected.".to_string(),
        n => format!("{n} crying events were detected and resolved without prolonged distress."),
    };

    let posture = match summary.unsafe_posture_count {
        0 => "No unsafe sleeping postures were observed.".to_string(),
        n => format!("{n} potentially unsafe sleeping postures were detected and flagged."),
    };

    format!(
        "Analysis of the most recent {analysed} sensor snapshots indicates an average body \
         temperature of {}, average heart rate of {}, and average humidity of {}. \
         {crying} {posture} Overall system assessment indicates a {}",
        reading(&summary.avg_temperature, "°C"),
        reading(&summary.avg_heart_rate, " bpm"),
        reading(&summary.avg_humidity, "%"),
        summary.status.assessment(),
    )
}

/// Summarize the most recent snapshots of an ordered batch.
pub fn summarize(snapshots: &[Snapshot], config: &Config, now: DateTime<Utc>) -> InsightSummary {
    let window = trailing(snapshots, config.windows.summary);
    let thresholds = &config.thresholds;
    let placeholder = config.placeholder_fallback;

    let avg_temperature = field_average(window, VitalField::Temperature, placeholder, now);
    let avg_heart_rate = field_average(window, VitalField::HeartRate, placeholder, now);
    let avg_humidity = field_average(window, VitalField::Humidity, placeholder, now);

    let crying_count = window.iter().filter(|s| s.is_crying()).count();
    let unsafe_posture_count = window.iter().filter(|s| s.has_unsafe_posture()).count();

    let status = classify_status(
        avg_temperature.measured(),
        avg_heart_rate.measured(),
        crying_count,
        unsafe_posture_count,
        thresholds,
    );

    let mut summary = InsightSummary {
        status,
        sample_count: window.len(),
        avg_temperature,
        avg_heart_rate,
        avg_humidity,
        crying_count,
        unsafe_posture_count,
        narrative: String::new(),
    };
    summary.narrative = compose_narrative(&summary, config.windows.summary);

    tracing::debug!(
        samples = summary.sample_count,
        crying_count,
        unsafe_posture_count,
        status = ?status,
        "composed insight summary"
    );

    summary
}
