//! Per-page derivations for the vitals, trends, overview and emotion views.

use crate::config::{Config, Thresholds};
use crate::core::events::Tone;
use crate::core::windowing::{
    comfort_score, field_trend, range_stats, rolling_average, trailing, RangeStats, Trend,
};
use crate::snapshot::{Behavior, Snapshot, VitalField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trends and comfort over the most recent vitals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsInsight {
    pub temperature_trend: Trend,
    pub heart_rate_trend: Trend,
    pub humidity_trend: Trend,
    /// Comfort score of the latest snapshot
    pub comfort: u8,
}

/// Vitals insight over the last `windows.vitals` snapshots.
///
/// Returns `None` until `windows.min_vitals_readings` snapshots exist.
pub fn vitals_insight(snapshots: &[Snapshot], config: &Config) -> Option<VitalsInsight> {
    let window = trailing(snapshots, config.windows.vitals);
    if window.len() < config.windows.min_vitals_readings {
        return None;
    }
    let latest = window.last()?;
    let t = &config.thresholds;

    Some(VitalsInsight {
        temperature_trend: field_trend(window, VitalField::Temperature, t.trend_threshold),
        heart_rate_trend: field_trend(window, VitalField::HeartRate, t.trend_threshold),
        humidity_trend: field_trend(window, VitalField::Humidity, t.trend_threshold),
        comfort: comfort_score(latest.temperature, latest.heart_rate, latest.humidity, t),
    })
}

/// One point of the smoothed health-trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature_avg: Option<f64>,
    pub heart_rate_avg: Option<f64>,
}

/// Smoothed series and normal-range shares over a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTrends {
    pub points: Vec<TrendPoint>,
    pub temperature: Option<RangeStats>,
    pub heart_rate: Option<RangeStats>,
}

pub fn health_trends(snapshots: &[Snapshot], config: &Config) -> HealthTrends {
    let window = config.windows.rolling;
    let temperatures = rolling_average(snapshots, VitalField::Temperature, window);
    let heart_rates = rolling_average(snapshots, VitalField::HeartRate, window);

    let points = snapshots
        .iter()
        .zip(temperatures)
        .zip(heart_rates)
        .map(|((s, temperature_avg), heart_rate_avg)| TrendPoint {
            timestamp: s.timestamp,
            temperature_avg,
            heart_rate_avg,
        })
        .collect();

    let t = &config.thresholds;
    HealthTrends {
        points,
        temperature: range_stats(snapshots.iter().map(|s| s.temperature), t.temperature),
        heart_rate: range_stats(snapshots.iter().map(|s| s.heart_rate), t.heart_rate),
    }
}

/// At-a-glance status of the latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStatus {
    Safe,
    Attention,
    Alert,
}

impl LiveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LiveStatus::Safe => "Baby is Safe",
            LiveStatus::Attention => "Attention",
            LiveStatus::Alert => "Alert",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            LiveStatus::Safe => Tone::Success,
            LiveStatus::Attention => Tone::Warning,
            LiveStatus::Alert => Tone::Error,
        }
    }
}

/// Classify a single snapshot.
pub fn live_status(snapshot: &Snapshot, thresholds: &Thresholds) -> LiveStatus {
    let above = |value: Option<f64>, limit: f64| value.is_some_and(|v| v > limit);

    if snapshot.has_unsafe_posture()
        || snapshot.is_crying()
        || above(snapshot.temperature, thresholds.critical_temperature)
        || above(snapshot.heart_rate, thresholds.critical_heart_rate)
    {
        LiveStatus::Alert
    } else if above(snapshot.temperature, thresholds.temperature.max)
        || above(snapshot.heart_rate, thresholds.heart_rate_watch)
    {
        LiveStatus::Attention
    } else {
        LiveStatus::Safe
    }
}

/// Mood bucket shown by the emotion view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Sleeping,
    Crying,
    Distress,
    Unknown,
}

impl Mood {
    /// Displayed mood of a snapshot. A high posture risk always reads as distress.
    pub fn of(snapshot: &Snapshot) -> Self {
        if snapshot.has_unsafe_posture() {
            return Mood::Distress;
        }
        match snapshot.behavior {
            Some(Behavior::Sleeping) => Mood::Sleeping,
            Some(Behavior::Crying) => Mood::Crying,
            Some(Behavior::Distress) => Mood::Distress,
            Some(Behavior::Other(_)) | None => Mood::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Sleeping => "Sleeping",
            Mood::Crying => "Crying",
            Mood::Distress => "Unsafe Posture",
            Mood::Unknown => "Unknown",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Mood::Sleeping => Tone::Success,
            Mood::Crying => Tone::Warning,
            Mood::Distress => Tone::Error,
            Mood::Unknown => Tone::Neutral,
        }
    }
}

/// Snapshot counts per mood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodBreakdown {
    pub sleeping: usize,
    pub crying: usize,
    pub distress: usize,
    pub unknown: usize,
}

impl MoodBreakdown {
    pub fn from_snapshots(snapshots: &[Snapshot]) -> Self {
        snapshots.iter().fold(Self::default(), |mut acc, s| {
            match Mood::of(s) {
                Mood::Sleeping => acc.sleeping += 1,
                Mood::Crying => acc.crying += 1,
                Mood::Distress => acc.distress += 1,
                Mood::Unknown => acc.unknown += 1,
            }
            acc
        })
    }

    pub fn get(&self, mood: Mood) -> usize {
        match mood {
            Mood::Sleeping => self.sleeping,
            Mood::Crying => self.crying,
            Mood::Distress => self.distress,
            Mood::Unknown => self.unknown,
        }
    }
}
