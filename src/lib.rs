//! cradlewatch - event derivation and health insights for baby monitors.
//!
//! This library turns timestamped sensor snapshots (temperature, heart rate,
//! humidity, behavior, posture) into classified activity events, a coarse
//! status tier and a human-readable summary.
//!
//! # Guarantees
//!
//! - **Pure**: every derivation is a synchronous function of its input batch
//! - **Total**: malformed fields become absent values, never errors or NaN
//! - **Ordered**: events follow transition order, then rule order
//! - **Stateless**: batches are analyzed independently, nothing is persisted
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         cradlewatch                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ Raw records │──▶│ Normalizer  │──▶│  Windowing  │        │
//! │  │ (doc store) │   │  (sorted)   │   │ (aggregates)│        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                           │                 │               │
//! │                           ▼                 ▼               │
//! │                    ┌─────────────┐   ┌─────────────┐        │
//! │                    │   Events    │──▶│   Insight   │        │
//! │                    │  (5 rules)  │   │  Summary    │        │
//! │                    └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use cradlewatch::{analyze, Config, Snapshot};
//! use chrono::{Duration, Utc};
//!
//! let start = Utc::now();
//! let batch = vec![
//!     Snapshot::new(start).with_heart_rate(170.0),
//!     Snapshot::new(start + Duration::seconds(10)).with_heart_rate(168.0),
//! ];
//!
//! let analysis = analyze(&batch, &Config::default(), Utc::now());
//! assert_eq!(analysis.events[0].title, "Heart Rate Spike");
//! ```

pub mod config;
pub mod core;
pub mod snapshot;

// Re-export key types at crate root for convenience
pub use config::{Band, Config, ConfigError, Thresholds, WindowConfig};
pub use crate::core::{
    analyze, derive_events, summarize, ActivityEvent, Analysis, EventSource, InsightSummary,
    Report, ReportBuilder, Severity, Status,
};
pub use snapshot::{
    normalize_batch, read_records, Behavior, NormalizeOptions, PostureRisk, RawRecord, Snapshot,
    SourceError,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shown alongside every rendered assessment.
pub const ASSESSMENT_DISCLAIMER: &str =
    "This assessment is AI-assisted and not a medical diagnosis.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclaimer_contents() {
        assert!(ASSESSMENT_DISCLAIMER.contains("AI-assisted"));
        assert!(ASSESSMENT_DISCLAIMER.contains("not a medical diagnosis"));
    }
}
