//! Data logger configuration parameters
//!
//! All tunable parameters for the pipeline: tracker windows and thresholds,
//! orientation, storage retention and the outer collaborators' settings.
//! Values are read from a JSON file; anything missing falls back to the
//! defaults below, and a file that cannot be used at all yields the full
//! default configuration.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::imu::orientation::AxisMap;
use crate::imu::trackers::Signal;

/// Longest accepted retention (100 years).  Use 0 to keep rows forever.
pub const MAX_DB_LOG_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Motion classifier configuration.
///
/// Key names match the historical `imu-logger.json` layout so existing
/// device configs keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    // --- Continuous-count windows (samples) ---
    /// Window shared by the left- and right-turn trackers
    #[serde(rename = "continuous_count_window")]
    pub turn_continuous_count_window: u32,
    pub acceleration_continuous_count_window: u32,
    pub deceleration_continuous_count_window: u32,
    pub stop_continuous_count_window: u32,
    /// Consecutive non-stopped samples required before Stop re-arms
    pub stop_end_continuous_count_window: u32,

    // --- Thresholds (g) ---
    pub left_turn_threshold: f64,
    pub right_turn_threshold: f64,
    pub g_force_accelerator_threshold: f64,
    pub g_force_decelerator_threshold: f64,
    pub stop_magnitude_threshold: f64,

    // --- Predicate signals ---
    /// Signal compared against the turn thresholds
    pub turn_signal: Signal,
    /// Signal compared against the accelerator / decelerator thresholds
    pub longitudinal_signal: Signal,
    /// Signal compared against the stop threshold
    pub stop_signal: Signal,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            // Windows (40 Hz cadence)
            turn_continuous_count_window: 50,
            acceleration_continuous_count_window: 20,
            deceleration_continuous_count_window: 50,
            stop_continuous_count_window: 40,
            stop_end_continuous_count_window: 10,

            // Thresholds
            left_turn_threshold: 0.2,
            right_turn_threshold: -0.2,
            g_force_accelerator_threshold: 0.15,
            g_force_decelerator_threshold: -0.20,
            stop_magnitude_threshold: 0.02,

            // Signals
            turn_signal: Signal::Lateral,
            longitudinal_signal: Signal::Longitudinal,
            stop_signal: Signal::PlanarMagnitude,
        }
    }
}

/// Top-level logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub imu: ImuConfig,
    /// Device-to-vehicle axis remapping
    pub axis_map: AxisMap,
    /// Inertial acquisition cadence (milliseconds)
    pub sample_interval_ms: u64,

    // --- Storage ---
    pub db_path: String,
    /// Retention for persisted rows (seconds); 0 disables purging
    pub db_log_ttl_secs: u64,
    pub persist_raw_samples: bool,
    pub persist_merged_samples: bool,

    // --- JSON snapshots (consumed by the snapshot writer) ---
    pub gnss_json_destination_folder: String,
    pub gnss_json_save_interval_secs: u64,
    pub imu_json_destination_folder: String,
    pub imu_json_save_interval_secs: u64,

    // --- External interface ---
    pub listen_addr: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            imu: ImuConfig::default(),
            axis_map: AxisMap::default(),
            sample_interval_ms: 25, // 40 Hz

            db_path: "/mnt/data/gnss.v1.0.3.db".to_string(),
            db_log_ttl_secs: 12 * 60 * 60,
            persist_raw_samples: true,
            persist_merged_samples: true,

            gnss_json_destination_folder: "/mnt/data/gps".to_string(),
            gnss_json_save_interval_secs: 15,
            imu_json_destination_folder: "/mnt/data/imu".to_string(),
            imu_json_save_interval_secs: 15,

            listen_addr: ":9000".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn db_log_ttl(&self) -> Duration {
        Duration::from_secs(self.db_log_ttl_secs)
    }

    /// Load configuration from `path`.
    ///
    /// Never fails: an absent, unreadable, malformed or invalid file is
    /// reported and the defaults are returned instead.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Config {} unusable ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        if text.trim().is_empty() {
            return Err(ConfigError::NotFound);
        }
        Self::from_json(&text)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field the pipeline depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let imu = &self.imu;
        let windows = [
            imu.turn_continuous_count_window,
            imu.acceleration_continuous_count_window,
            imu.deceleration_continuous_count_window,
            imu.stop_continuous_count_window,
            imu.stop_end_continuous_count_window,
        ];
        if windows.contains(&0) {
            return Err(ConfigError::ValidationFailed(
                "continuous count windows must be at least 1",
            ));
        }
        if !(imu.left_turn_threshold > 0.0 && imu.right_turn_threshold < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "left_turn_threshold must be > 0 and right_turn_threshold < 0",
            ));
        }
        if !(imu.g_force_accelerator_threshold > 0.0 && imu.g_force_decelerator_threshold < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "g_force_accelerator_threshold must be > 0 and g_force_decelerator_threshold < 0",
            ));
        }
        if !(imu.stop_magnitude_threshold >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "stop_magnitude_threshold must be >= 0",
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be at least 1",
            ));
        }
        if self.db_log_ttl_secs > MAX_DB_LOG_TTL_SECS {
            return Err(ConfigError::ValidationFailed(
                "db_log_ttl_secs must be at most 100 years (0 keeps rows forever)",
            ));
        }
        Ok(())
    }
}

/// Reasons a configuration file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file (or an empty one).
    NotFound,
    /// The file exists but could not be read.
    IoError,
    /// The file is not valid JSON for this schema.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
