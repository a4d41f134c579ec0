//! Core derivations for cradlewatch.
//!
//! This module contains:
//! - Windowed aggregation (rolling averages, range shares, trends, comfort)
//! - Activity event derivation from consecutive snapshots
//! - Status classification and the insight narrative
//! - Per-view derivations and the batch reducer

pub mod events;
pub mod insight;
pub mod report;
pub mod vitals;
pub mod windowing;

// Re-export commonly used types
pub use events::{derive_events, ActivityEvent, EventSource, Severity, TimelineSummary, Tone};
pub use insight::{classify_status, summarize, InsightSummary, Status};
pub use report::{analyze, Analysis, Report, ReportBuilder, PRODUCER_NAME, REPORT_VERSION};
pub use vitals::{
    health_trends, live_status, vitals_insight, HealthTrends, LiveStatus, Mood, MoodBreakdown,
    VitalsInsight,
};
pub use windowing::{
    comfort_score, range_membership, range_stats, rolling_average, rolling_mean, trend,
    Aggregate, RangeStats, SyntheticWave, Trend,
};
