//! Batch analysis and the report envelope.
//!
//! [`analyze`] is a pure reducer from one snapshot batch to everything the
//! dashboard renders. It carries no state between batches: each new batch is
//! analyzed from scratch.

use crate::config::Config;
use crate::core::events::{derive_events, ActivityEvent, TimelineSummary};
use crate::core::insight::{summarize, InsightSummary};
use crate::core::vitals::{
    health_trends, live_status, vitals_insight, HealthTrends, LiveStatus, MoodBreakdown,
    VitalsInsight,
};
use crate::core::windowing::trailing;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "cradlewatch";

/// Everything derived from one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Snapshots in the batch
    pub snapshot_count: usize,
    /// Timestamp of the most recent snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_at: Option<DateTime<Utc>>,
    pub events: Vec<ActivityEvent>,
    pub timeline: TimelineSummary,
    pub insight: InsightSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitals: Option<VitalsInsight>,
    pub trends: HealthTrends,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_status: Option<LiveStatus>,
    pub moods: MoodBreakdown,
}

/// Analyze a timestamp-ordered batch.
///
/// `now` only feeds the placeholder wave; identical inputs give identical
/// output.
pub fn analyze(snapshots: &[Snapshot], config: &Config, now: DateTime<Utc>) -> Analysis {
    let events = derive_events(trailing(snapshots, config.windows.timeline), &config.thresholds);
    let timeline = TimelineSummary::from_events(&events);
    let latest = snapshots.last();

    Analysis {
        snapshot_count: snapshots.len(),
        latest_at: latest.map(|s| s.timestamp),
        events,
        timeline,
        insight: summarize(snapshots, config, now),
        vitals: vitals_insight(snapshots, config),
        trends: health_trends(snapshots, config),
        live_status: latest.map(|s| live_status(s, &config.thresholds)),
        moods: MoodBreakdown::from_snapshots(snapshots),
    }
}

/// Producer metadata attached to a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// An analysis wrapped with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_version: String,
    /// When this report was computed (RFC3339)
    pub computed_at_utc: String,
    pub producer: Producer,
    pub analysis: Analysis,
    pub disclaimer: String,
}

/// Builder for reports sharing one producer instance.
pub struct ReportBuilder {
    instance_id: Uuid,
}

impl ReportBuilder {
    /// Create a new builder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
        }
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Wrap an analysis computed at `computed_at`.
    pub fn build(&self, analysis: Analysis, computed_at: DateTime<Utc>) -> Report {
        Report {
            report_version: REPORT_VERSION.to_string(),
            computed_at_utc: computed_at.to_rfc3339(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id.to_string(),
            },
            analysis,
            disclaimer: crate::ASSESSMENT_DISCLAIMER.to_string(),
        }
    }

    /// Build a report and serialize it to JSON.
    pub fn build_json(&self, analysis: Analysis, computed_at: DateTime<Utc>) -> String {
        serde_json::to_string_pretty(&self.build(analysis, computed_at))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::insight::Status;
    use crate::snapshot::Behavior;
    use chrono::{Duration, TimeZone};

    fn at(i: i64) -> Snapshot {
        let start = Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap();
        Snapshot::new(start + Duration::seconds(i * 10))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 22, 11, 0, 0).unwrap()
    }

    #[test]
    fn test_analyze_empty_batch() {
        let analysis = analyze(&[], &Config::default(), now());
        assert_eq!(analysis.snapshot_count, 0);
        assert!(analysis.events.is_empty());
        assert!(analysis.latest_at.is_none());
        assert!(analysis.live_status.is_none());
        assert!(analysis.vitals.is_none());
        assert_eq!(analysis.insight.status, Status::Stable);
    }

    #[test]
    fn test_analyze_combines_views() {
        let snapshots = vec![
            at(0).with_heart_rate(170.0).with_temperature(33.0),
            at(1)
                .with_heart_rate(172.0)
                .with_temperature(33.0)
                .with_behavior(Behavior::Crying),
            at(2).with_heart_rate(168.0).with_temperature(33.0),
        ];

        let analysis = analyze(&snapshots, &Config::default(), now());
        assert_eq!(analysis.snapshot_count, 3);
        assert_eq!(analysis.latest_at, Some(snapshots[2].timestamp));
        assert_eq!(analysis.timeline.total_events, analysis.events.len());
        assert_eq!(analysis.timeline.high_severity, 2);
        assert_eq!(analysis.insight.status, Status::Critical);
        assert_eq!(analysis.live_status, Some(LiveStatus::Alert));
        assert_eq!(analysis.moods.crying, 1);
        assert!(analysis.vitals.is_some());
    }

    #[test]
    fn test_timeline_window_limits_events() {
        let mut config = Config::default();
        config.windows.timeline = 2;

        let snapshots = vec![
            at(0).with_heart_rate(170.0),
            at(1).with_heart_rate(170.0),
            at(2).with_heart_rate(120.0),
        ];
        let analysis = analyze(&snapshots, &config, now());
        assert!(analysis.events.is_empty());
    }

    #[test]
    fn test_report_envelope() {
        let builder = ReportBuilder::new();
        let analysis = analyze(&[at(0), at(1)], &Config::default(), now());
        let report = builder.build(analysis, now());

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, builder.instance_id().to_string());
        assert!(report.disclaimer.contains("not a medical diagnosis"));
    }

    #[test]
    fn test_report_json_serialization() {
        let builder = ReportBuilder::new();
        let analysis = analyze(&[at(0)], &Config::default(), now());
        let json = builder.build_json(analysis, now());

        assert!(json.contains("report_version"));
        assert!(json.contains("computed_at_utc"));
        assert!(json.contains("\"insight\""));
        assert!(json.contains("\"narrative\""));
    }
}
