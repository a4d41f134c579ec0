//! Configuration for cradlewatch.
//!
//! Every numeric threshold used by the event engine, the aggregator and the
//! summarizer lives in [`Thresholds`], so the same heart-rate ceiling or
//! temperature band is never spelled twice.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clinical and environmental thresholds
    pub thresholds: Thresholds,

    /// Window sizes for the aggregates
    pub windows: WindowConfig,

    /// Substitute a synthetic wave when an aggregate has no valid readings
    pub placeholder_fallback: bool,

    /// Confidence assigned to snapshots that carry none
    pub default_confidence: f64,

    /// IANA timezone used when rendering timestamps as text
    pub display_timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            windows: WindowConfig::default(),
            placeholder_fallback: true,
            default_confidence: 1.0,
            display_timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Write the default configuration to `path`, refusing to replace a file.
    pub fn init_at(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.display().to_string()));
        }
        let config = Self::default();
        config.save_to(path)?;
        tracing::info!(path = %path.display(), "wrote default configuration");
        Ok(config)
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cradlewatch")
            .join("config.json")
    }

    /// Parse the display timezone.
    pub fn timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.display_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.display_timezone.clone()))
    }

    /// Reject configurations the engine cannot interpret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timezone()?;
        let t = &self.thresholds;
        for (name, band) in [
            ("heart_rate", t.heart_rate),
            ("temperature", t.temperature),
            ("humidity", t.humidity),
        ] {
            if band.min > band.max {
                return Err(ConfigError::Parse(format!(
                    "{name} band has min {} above max {}",
                    band.min, band.max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::Parse(format!(
                "default_confidence must be within [0, 1], got {}",
                self.default_confidence
            )));
        }
        Ok(())
    }
}

/// An inclusive numeric band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the band, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Points deducted from the comfort score for each reading outside its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfortPenalties {
    pub temperature: u8,
    pub heart_rate: u8,
    pub humidity: u8,
}

impl Default for ComfortPenalties {
    fn default() -> Self {
        Self {
            temperature: 20,
            heart_rate: 25,
            humidity: 15,
        }
    }
}

/// Named thresholds shared by every component.
///
/// Deserializing merges over the defaults, down to a single band bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ThresholdsFile")]
pub struct Thresholds {
    /// Normal heart rate (bpm); `max` is the spike ceiling
    pub heart_rate: Band,
    /// Heart rate (bpm) above which the live status asks for attention
    pub heart_rate_watch: f64,
    /// Normal temperature (°C)
    pub temperature: Band,
    /// Normal relative humidity (%)
    pub humidity: Band,
    /// Average temperature (°C) above which the status is critical
    pub critical_temperature: f64,
    /// Average heart rate (bpm) above which the status is critical
    pub critical_heart_rate: f64,
    /// Confidence above which continued crying counts as prolonged distress
    pub distress_confidence: f64,
    /// Crying snapshots tolerated before the status needs attention
    pub crying_attention_count: usize,
    /// High-risk posture snapshots tolerated before the status needs attention
    pub unsafe_posture_attention_count: usize,
    /// Minimum first-to-last change for a rising or falling trend
    pub trend_threshold: f64,
    pub comfort_penalties: ComfortPenalties,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heart_rate: Band::new(100.0, 160.0),
            heart_rate_watch: 150.0,
            temperature: Band::new(25.0, 35.0),
            humidity: Band::new(40.0, 60.0),
            critical_temperature: 37.0,
            critical_heart_rate: 160.0,
            distress_confidence: 0.8,
            crying_attention_count: 5,
            unsafe_posture_attention_count: 2,
            trend_threshold: 0.5,
            comfort_penalties: ComfortPenalties::default(),
        }
    }
}

/// A band as written in a config file, either bound optional.
#[derive(Debug, Default, Deserialize)]
struct BandOverride {
    min: Option<f64>,
    max: Option<f64>,
}

impl BandOverride {
    fn apply(self, band: Band) -> Band {
        Band::new(self.min.unwrap_or(band.min), self.max.unwrap_or(band.max))
    }
}

/// [`Thresholds`] as written in a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThresholdsFile {
    heart_rate: BandOverride,
    heart_rate_watch: Option<f64>,
    temperature: BandOverride,
    humidity: BandOverride,
    critical_temperature: Option<f64>,
    critical_heart_rate: Option<f64>,
    distress_confidence: Option<f64>,
    crying_attention_count: Option<usize>,
    unsafe_posture_attention_count: Option<usize>,
    trend_threshold: Option<f64>,
    comfort_penalties: ComfortPenalties,
}

impl From<ThresholdsFile> for Thresholds {
    fn from(file: ThresholdsFile) -> Self {
        let d = Thresholds::default();
        Self {
            heart_rate: file.heart_rate.apply(d.heart_rate),
            heart_rate_watch: file.heart_rate_watch.unwrap_or(d.heart_rate_watch),
            temperature: file.temperature.apply(d.temperature),
            humidity: file.humidity.apply(d.humidity),
            critical_temperature: file.critical_temperature.unwrap_or(d.critical_temperature),
            critical_heart_rate: file.critical_heart_rate.unwrap_or(d.critical_heart_rate),
            distress_confidence: file.distress_confidence.unwrap_or(d.distress_confidence),
            crying_attention_count: file
                .crying_attention_count
                .unwrap_or(d.crying_attention_count),
            unsafe_posture_attention_count: file
                .unsafe_posture_attention_count
                .unwrap_or(d.unsafe_posture_attention_count),
            trend_threshold: file.trend_threshold.unwrap_or(d.trend_threshold),
            comfort_penalties: file.comfort_penalties,
        }
    }
}

/// Window sizes, counted in snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Trailing window of the health-trend rolling averages
    pub rolling: usize,
    /// Most recent snapshots fed to the insight summary
    pub summary: usize,
    /// Most recent snapshots fed to the vitals insight
    pub vitals: usize,
    /// Readings required before vitals trends are reported
    pub min_vitals_readings: usize,
    /// Most recent snapshots fed to the event timeline
    pub timeline: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            rolling: 5,
            summary: 100,
            vitals: 40,
            min_vitals_readings: 3,
            timeline: 100,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("Configuration already exists: {0}")]
    AlreadyExists(String),
}
