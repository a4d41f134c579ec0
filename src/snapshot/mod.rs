//! Snapshot ingestion for cradlewatch.
//!
//! This module turns records from the document store into canonical,
//! timestamp-ordered snapshots.

pub mod normalize;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use normalize::{normalize_batch, normalize_record, normalize_timestamp, NormalizeOptions};
pub use source::{parse_records, read_records, SourceError};
pub use types::{Behavior, PostureRisk, RawRecord, Snapshot, VitalField};
