//! Windowed aggregation over ordered snapshots.
//!
//! Rolling averages, normal-range membership, directional trends and the
//! comfort score. Absent readings are excluded from every statistic; they
//! never count as zero.

use crate::config::{Band, Thresholds};
use crate::snapshot::{Snapshot, VitalField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Period divisor of the placeholder wave, in milliseconds.
const WAVE_PERIOD_MS: f64 = 5000.0;

/// A smooth oscillation used as a stand-in before any reading exists.
///
/// This is demo behavior. Values produced from it are always reported as
/// [`Aggregate::Placeholder`] and can be switched off in the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticWave {
    pub base: f64,
    pub range: f64,
}

impl SyntheticWave {
    pub const fn new(base: f64, range: f64) -> Self {
        Self { base, range }
    }

    /// Sample the wave at `at`, rounded to one decimal place.
    pub fn sample(&self, at: DateTime<Utc>) -> f64 {
        let phase = at.timestamp_millis() as f64 / WAVE_PERIOD_MS;
        round_tenth(self.base + phase.sin() * self.range)
    }

    /// The wave shown for a field with no readings.
    pub fn for_field(field: VitalField) -> Self {
        match field {
            VitalField::Temperature => Self::new(33.0, 0.6),
            VitalField::HeartRate => Self::new(140.0, 4.0),
            VitalField::Humidity => Self::new(48.0, 2.0),
        }
    }
}

/// An aggregate value and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Aggregate {
    /// Computed from real readings
    Measured(f64),
    /// Synthetic stand-in, no readings were available
    Placeholder(f64),
    /// No readings and placeholders are disabled
    Unavailable,
}

impl Aggregate {
    /// The displayed value, placeholder or not.
    pub fn value(&self) -> Option<f64> {
        match self {
            Aggregate::Measured(v) | Aggregate::Placeholder(v) => Some(*v),
            Aggregate::Unavailable => None,
        }
    }

    /// The value only when it was computed from readings.
    pub fn measured(&self) -> Option<f64> {
        match self {
            Aggregate::Measured(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Aggregate::Placeholder(_))
    }
}

/// Direction of a series from its first to its last value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

/// How many readings of a series fall inside a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeStats {
    /// Readings inside the band
    pub within: usize,
    /// Valid readings considered
    pub total: usize,
    /// Rounded share of readings inside the band
    pub normal_pct: u8,
    /// `100 - normal_pct`
    pub anomaly_pct: u8,
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The last `count` snapshots of an ordered batch.
pub fn trailing(snapshots: &[Snapshot], count: usize) -> &[Snapshot] {
    &snapshots[snapshots.len().saturating_sub(count)..]
}

/// Mean of the present values, or `None` when there are none.
pub fn mean_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().mean())
}

/// Trailing rolling mean over raw values.
///
/// The window ending at index `i` covers at most `window` values and shrinks
/// near the start. It never looks ahead. A window with no present value
/// yields `None`. Results are rounded to one decimal place.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean_of(values[start..=i].iter().copied()).map(round_tenth)
        })
        .collect()
}

/// Trailing rolling average of one snapshot field.
pub fn rolling_average(snapshots: &[Snapshot], field: VitalField, window: usize) -> Vec<Option<f64>> {
    let values: Vec<Option<f64>> = snapshots.iter().map(|s| s.vital(field)).collect();
    rolling_mean(&values, window)
}

/// Whether `value` lies in `[lower, upper]`.
pub fn range_membership(value: f64, lower: f64, upper: f64) -> bool {
    Band::new(lower, upper).contains(value)
}

/// Count band membership over the present values of a series.
///
/// Returns `None` when the series has no present value.
pub fn range_stats<I>(values: I, band: Band) -> Option<RangeStats>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }

    let total = present.len();
    let within = present
        .iter()
        .filter(|&&v| range_membership(v, band.min, band.max))
        .count();
    let normal_pct = ((within as f64 / total as f64) * 100.0).round() as u8;

    Some(RangeStats {
        within,
        total,
        normal_pct,
        anomaly_pct: 100 - normal_pct,
    })
}

/// Compare the last value against the first.
///
/// Series shorter than two values are always stable.
pub fn trend(values: &[f64], threshold: f64) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }

    let diff = values[values.len() - 1] - values[0];
    if diff > threshold {
        Trend::Rising
    } else if diff < -threshold {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

/// Trend of the present readings of one snapshot field.
pub fn field_trend(snapshots: &[Snapshot], field: VitalField, threshold: f64) -> Trend {
    let values: Vec<f64> = snapshots.iter().filter_map(|s| s.vital(field)).collect();
    trend(&values, threshold)
}

/// Composite comfort score in `[0, 100]`.
///
/// Starts at 100 and deducts a fixed penalty for each reading outside its
/// normal band. An absent reading carries no penalty.
pub fn comfort_score(
    temperature: Option<f64>,
    heart_rate: Option<f64>,
    humidity: Option<f64>,
    thresholds: &Thresholds,
) -> u8 {
    let penalties = &thresholds.comfort_penalties;
    let outside = |value: Option<f64>, band: &Band| value.is_some_and(|v| !band.contains(v));

    let mut score: i32 = 100;
    if outside(temperature, &thresholds.temperature) {
        score -= i32::from(penalties.temperature);
    }
    if outside(heart_rate, &thresholds.heart_rate) {
        score -= i32::from(penalties.heart_rate);
    }
    if outside(humidity, &thresholds.humidity) {
        score -= i32::from(penalties.humidity);
    }
    score.clamp(0, 100) as u8
}

/// Rounded average of one field, with the placeholder policy applied.
pub fn field_average(
    snapshots: &[Snapshot],
    field: VitalField,
    placeholder_fallback: bool,
    now: DateTime<Utc>,
) -> Aggregate {
    match mean_of(snapshots.iter().map(|s| s.vital(field))) {
        Some(mean) => Aggregate::Measured(mean.round()),
        None if placeholder_fallback => {
            tracing::warn!(?field, "no valid readings, substituting placeholder wave");
            Aggregate::Placeholder(SyntheticWave::for_field(field).sample(now))
        }
        None => Aggregate::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_rolling_mean_shrinks_at_start() {
        let values = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        assert_eq!(
            rolling_mean(&values, 2),
            vec![Some(10.0), Some(15.0), Some(25.0), Some(35.0)]
        );
    }

    #[test]
    fn test_rolling_mean_skips_absent_and_rounds() {
        let values = vec![Some(33.0), None, Some(33.25), None];
        assert_eq!(
            rolling_mean(&values, 2),
            vec![Some(33.0), Some(33.0), Some(33.3), Some(33.3)]
        );
        assert_eq!(rolling_mean(&[None, None], 5), vec![None, None]);
    }

    #[test]
    fn test_rolling_average_over_snapshots() {
        let snapshots: Vec<Snapshot> = [140.0, 150.0, 160.0]
            .iter()
            .map(|&hr| Snapshot::new(t0()).with_heart_rate(hr))
            .collect();
        assert_eq!(
            rolling_average(&snapshots, VitalField::HeartRate, 5),
            vec![Some(140.0), Some(145.0), Some(150.0)]
        );
    }

    #[test]
    fn test_range_stats_counts_membership() {
        let rates = [90.0, 150.0, 170.0, 120.0].map(Some);
        let stats = range_stats(rates, Band::new(100.0, 160.0)).unwrap();
        assert_eq!(stats.within, 2);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.normal_pct, 50);
        assert_eq!(stats.anomaly_pct, 50);
    }

    #[test]
    fn test_range_stats_empty_is_none() {
        assert!(range_stats([None, None], Band::new(25.0, 35.0)).is_none());
    }

    #[test]
    fn test_trend_thresholds() {
        assert_eq!(trend(&[30.0, 30.6], 0.5), Trend::Rising);
        assert_eq!(trend(&[30.0, 29.4], 0.5), Trend::Falling);
        assert_eq!(trend(&[30.0, 30.3], 0.5), Trend::Stable);
        assert_eq!(trend(&[30.0], 0.5), Trend::Stable);
        assert_eq!(trend(&[], 0.5), Trend::Stable);
    }

    #[test]
    fn test_comfort_score_penalties() {
        let thresholds = Thresholds::default();
        assert_eq!(comfort_score(Some(33.0), Some(140.0), Some(50.0), &thresholds), 100);
        assert_eq!(comfort_score(Some(36.0), Some(140.0), Some(50.0), &thresholds), 80);
        assert_eq!(comfort_score(Some(36.0), Some(170.0), Some(70.0), &thresholds), 40);
        assert_eq!(comfort_score(None, None, None, &thresholds), 100);
    }

    #[test]
    fn test_comfort_score_floors_at_zero() {
        let mut thresholds = Thresholds::default();
        thresholds.comfort_penalties.temperature = 90;
        thresholds.comfort_penalties.heart_rate = 90;
        assert_eq!(comfort_score(Some(40.0), Some(200.0), None, &thresholds), 0);
    }

    #[test]
    fn test_field_average_placeholder_policy() {
        let empty: Vec<Snapshot> = vec![Snapshot::new(t0())];

        let placeholder = field_average(&empty, VitalField::HeartRate, true, t0());
        assert!(placeholder.is_placeholder());
        let value = placeholder.value().unwrap();
        assert!((136.0..=144.0).contains(&value));
        assert_eq!(placeholder.measured(), None);

        assert_eq!(
            field_average(&empty, VitalField::HeartRate, false, t0()),
            Aggregate::Unavailable
        );
    }

    #[test]
    fn test_field_average_rounds_measured() {
        let snapshots = vec![
            Snapshot::new(t0()).with_temperature(33.2),
            Snapshot::new(t0()),
            Snapshot::new(t0()).with_temperature(34.0),
        ];
        assert_eq!(
            field_average(&snapshots, VitalField::Temperature, true, t0()),
            Aggregate::Measured(34.0)
        );
    }

    #[test]
    fn test_trailing_window() {
        let snapshots: Vec<Snapshot> = (0..5)
            .map(|i| Snapshot::new(t0()).with_heart_rate(f64::from(i)))
            .collect();
        let tail = trailing(&snapshots, 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].heart_rate, Some(3.0));
        assert_eq!(trailing(&snapshots, 10).len(), 5);
    }

    #[test]
    fn test_synthetic_wave_is_deterministic() {
        let wave = SyntheticWave::for_field(VitalField::Temperature);
        assert_eq!(wave.sample(t0()), wave.sample(t0()));
    }
}
