//! Activity events derived from consecutive snapshots.
//!
//! [`derive_events`] walks every `(prev, curr)` pair of an ordered batch and
//! applies each rule independently. Several rules can fire on the same
//! transition; their events are emitted in rule order, and transitions are
//! processed in input order.

use crate::config::Thresholds;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sensing modality an event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Vital,
    Emotion,
    Audio,
    System,
}

impl EventSource {
    /// Subsystem name shown next to an event.
    pub fn label(&self) -> &'static str {
        match self {
            EventSource::Vital => "Vitals",
            EventSource::Emotion => "Vision",
            EventSource::Audio => "Audio",
            EventSource::System => "System",
        }
    }
}

/// Urgency of an event, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Display tone for the severity chip.
    pub fn tone(&self) -> Tone {
        match self {
            Severity::Low => Tone::Success,
            Severity::Medium => Tone::Warning,
            Severity::High => Tone::Error,
        }
    }
}

/// Color family used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Error,
    Neutral,
}

/// A classified occurrence derived from one snapshot transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub source: EventSource,
    pub severity: Severity,
    /// Timestamp of the snapshot that triggered the event
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub description: String,
}

impl ActivityEvent {
    fn new(
        source: EventSource,
        severity: Severity,
        curr: &Snapshot,
        title: &str,
        description: String,
    ) -> Self {
        Self {
            source,
            severity,
            timestamp: curr.timestamp,
            title: title.to_string(),
            description,
        }
    }
}

pub const HEART_RATE_SPIKE: &str = "Heart Rate Spike";
pub const TEMPERATURE_OUT_OF_RANGE: &str = "Temperature Out of Range";
pub const CRYING_DETECTED: &str = "Crying Detected";
pub const PROLONGED_DISTRESS: &str = "Prolonged Distress";
pub const RECOVERED_TO_CALM: &str = "Recovered to Calm State";

/// Heart rate above the ceiling on both readings.
fn heart_rate_spike(prev: &Snapshot, curr: &Snapshot, t: &Thresholds) -> Option<ActivityEvent> {
    let ceiling = t.heart_rate.max;
    let latest = curr.heart_rate.filter(|&hr| hr > ceiling)?;
    prev.heart_rate.filter(|&hr| hr > ceiling)?;

    Some(ActivityEvent::new(
        EventSource::Vital,
        Severity::High,
        curr,
        HEART_RATE_SPIKE,
        format!(
            "Heart rate exceeded {ceiling} bpm for multiple readings (latest: {latest} bpm)."
        ),
    ))
}

/// Current temperature outside the normal band. Only `curr` is inspected.
fn temperature_out_of_range(
    _prev: &Snapshot,
    curr: &Snapshot,
    t: &Thresholds,
) -> Option<ActivityEvent> {
    let temperature = curr.temperature.filter(|&v| !t.temperature.contains(v))?;

    Some(ActivityEvent::new(
        EventSource::Vital,
        Severity::Medium,
        curr,
        TEMPERATURE_OUT_OF_RANGE,
        format!("Temperature measured at {temperature}°C, outside recommended range."),
    ))
}

/// Crying onset.
fn crying_detected(prev: &Snapshot, curr: &Snapshot, _t: &Thresholds) -> Option<ActivityEvent> {
    if !curr.is_crying() || prev.is_crying() {
        return None;
    }

    Some(ActivityEvent::new(
        EventSource::Emotion,
        Severity::Medium,
        curr,
        CRYING_DETECTED,
        format!(
            "Facial analysis detected crying with {}% confidence.",
            (curr.confidence * 100.0).round()
        ),
    ))
}

/// Crying continued with high confidence.
fn prolonged_distress(prev: &Snapshot, curr: &Snapshot, t: &Thresholds) -> Option<ActivityEvent> {
    if !(curr.is_crying() && prev.is_crying() && curr.confidence > t.distress_confidence) {
        return None;
    }

    Some(ActivityEvent::new(
        EventSource::Audio,
        Severity::High,
        curr,
        PROLONGED_DISTRESS,
        "Continuous crying detected across multiple intervals.".to_string(),
    ))
}

/// Crying ended.
fn recovered_to_calm(prev: &Snapshot, curr: &Snapshot, _t: &Thresholds) -> Option<ActivityEvent> {
    if !prev.is_crying() || curr.is_crying() {
        return None;
    }

    Some(ActivityEvent::new(
        EventSource::System,
        Severity::Low,
        curr,
        RECOVERED_TO_CALM,
        "Baby returned to a calm state after crying episode.".to_string(),
    ))
}

type Rule = fn(&Snapshot, &Snapshot, &Thresholds) -> Option<ActivityEvent>;

/// Rules in evaluation order. Output order within a transition follows it.
static RULES: [Rule; 5] = [
    heart_rate_spike,
    temperature_out_of_range,
    crying_detected,
    prolonged_distress,
    recovered_to_calm,
];

/// Derive activity events from a timestamp-ordered batch.
///
/// Ordering is the caller's responsibility; the batch is not sorted here.
/// Fewer than two snapshots yield no events.
pub fn derive_events(snapshots: &[Snapshot], thresholds: &Thresholds) -> Vec<ActivityEvent> {
    if snapshots.len() < 2 {
        return Vec::new();
    }

    let events: Vec<ActivityEvent> = snapshots
        .windows(2)
        .flat_map(|pair| {
            RULES
                .iter()
                .filter_map(move |rule| rule(&pair[0], &pair[1], thresholds))
        })
        .inspect(|event| {
            tracing::trace!(title = %event.title, severity = event.severity.label(), "derived event")
        })
        .collect();

    tracing::debug!(
        snapshots = snapshots.len(),
        events = events.len(),
        "derived activity events"
    );
    events
}

/// Overall state shown above the event timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineState {
    Stable,
    AttentionNeeded,
}

impl TimelineState {
    pub fn label(&self) -> &'static str {
        match self {
            TimelineState::Stable => "Stable",
            TimelineState::AttentionNeeded => "Attention Needed",
        }
    }
}

/// Counts over a derived event list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub total_events: usize,
    pub high_severity: usize,
    pub state: TimelineState,
}

impl TimelineSummary {
    pub fn from_events(events: &[ActivityEvent]) -> Self {
        let high_severity = events
            .iter()
            .filter(|e| e.severity == Severity::High)
            .count();

        Self {
            total_events: events.len(),
            high_severity,
            state: if high_severity > 0 {
                TimelineState::AttentionNeeded
            } else {
                TimelineState::Stable
            },
        }
    }
}
