use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::broadcast::TransportSettings;
use crate::detection::{DetectorOptions, LoopTiming};
use crate::error::ConfigError;
use crate::matcher::{Tolerance, DEFAULT_OFFSET_X, DEFAULT_OFFSET_Y, DEFAULT_OFFSET_Z};

pub const DEFAULT_RECORD_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_TRUE_PREDICT: usize = 3;
pub const DEFAULT_LEARN_TRUE_PREDICT: usize = 10;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 100;
pub const DEFAULT_WARMUP_MS: u64 = 5000;
pub const DEFAULT_BROADCAST_DEBOUNCE_MS: u64 = 100;

/// Accept a JSON number or a numeric string; anything else reads as unset.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Accept a non-blank string; anything else reads as unset.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Hand detector overrides, passed through to the external detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_hands: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub model_complexity: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_detection_confidence: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_tracking_confidence: Option<f64>,
}

/// Status transport overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub service_uuid: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub characteristic_uuid: Option<String>,
}

/// User settings as stored on disk.
///
/// Every field is an optional override. Invalid values are kept as `None`
/// and replaced by their default when resolved, one field at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How long a recording session lasts (ms)
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub record_timeout_ms: Option<f64>,

    /// Auto-learning switches itself off after this long (ms); unset means never
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub learn_timeout_ms: Option<f64>,

    /// Matching snapshots needed to report a signal as recognized
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub true_predict: Option<f64>,

    /// Matching snapshots needed to auto-learn a new snapshot
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub learn_true_predict: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_offset_x: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_offset_y: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_offset_z: Option<f64>,

    /// Pause between detector calls (ms)
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub frame_interval_ms: Option<f64>,

    /// Delay before the first detector call (ms)
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub warmup_ms: Option<f64>,

    /// Quiet period before a status change is written (ms)
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub broadcast_debounce_ms: Option<f64>,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub transport: TransportConfig,
}

/// Concrete values the engine runs with
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tolerance: Tolerance,
    pub recognition_threshold: usize,
    pub learning_threshold: usize,
    pub record_duration: Duration,
    pub learn_timeout: Option<Duration>,
    pub timing: LoopTiming,
    pub broadcast_debounce: Duration,
    pub detector: DetectorOptions,
    pub transport: TransportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().resolve()
    }
}

fn non_negative(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| *v >= 0.0).unwrap_or(default)
}

fn at_least_one(value: Option<f64>, default: usize) -> usize {
    value
        .filter(|v| *v >= 1.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

fn unit_interval(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| (0.0..=1.0).contains(v)).unwrap_or(default)
}

fn non_negative_millis(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|v| *v >= 0.0 && *v <= u64::MAX as f64)
        .map(|v| Duration::from_millis(v.round() as u64))
}

fn positive_millis(value: Option<f64>) -> Option<Duration> {
    non_negative_millis(value.filter(|v| *v > 0.0))
}

impl Config {
    /// Resolve every override into a concrete setting
    pub fn resolve(&self) -> Settings {
        let millis = |value: Option<f64>, default: u64| {
            positive_millis(value).unwrap_or(Duration::from_millis(default))
        };

        Settings {
            tolerance: Tolerance::new(
                non_negative(self.max_offset_x, DEFAULT_OFFSET_X),
                non_negative(self.max_offset_y, DEFAULT_OFFSET_Y),
                non_negative(self.max_offset_z, DEFAULT_OFFSET_Z),
            ),
            recognition_threshold: at_least_one(self.true_predict, DEFAULT_TRUE_PREDICT),
            learning_threshold: at_least_one(self.learn_true_predict, DEFAULT_LEARN_TRUE_PREDICT),
            record_duration: millis(self.record_timeout_ms, DEFAULT_RECORD_TIMEOUT_MS),
            learn_timeout: positive_millis(self.learn_timeout_ms),
            timing: LoopTiming {
                warmup: non_negative_millis(self.warmup_ms)
                    .unwrap_or(Duration::from_millis(DEFAULT_WARMUP_MS)),
                frame_interval: millis(self.frame_interval_ms, DEFAULT_FRAME_INTERVAL_MS),
            },
            broadcast_debounce: millis(self.broadcast_debounce_ms, DEFAULT_BROADCAST_DEBOUNCE_MS),
            detector: {
                let defaults = DetectorOptions::default();
                DetectorOptions {
                    max_hands: at_least_one(self.detector.max_hands, defaults.max_hands),
                    model_complexity: self
                        .detector
                        .model_complexity
                        .filter(|v| (0.0..=2.0).contains(v) && v.fract() == 0.0)
                        .map(|v| v as u8)
                        .unwrap_or(defaults.model_complexity),
                    min_detection_confidence: unit_interval(
                        self.detector.min_detection_confidence,
                        defaults.min_detection_confidence,
                    ),
                    min_tracking_confidence: unit_interval(
                        self.detector.min_tracking_confidence,
                        defaults.min_tracking_confidence,
                    ),
                }
            },
            transport: {
                let defaults = TransportSettings::default();
                TransportSettings {
                    service_uuid: self
                        .transport
                        .service_uuid
                        .clone()
                        .unwrap_or(defaults.service_uuid),
                    characteristic_uuid: self
                        .transport
                        .characteristic_uuid
                        .clone()
                        .unwrap_or(defaults.characteristic_uuid),
                }
            },
        }
    }

    /// Load configuration from the user config directory.
    /// Creates a default config file if none exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path, creating it when missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Write the configuration, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    /// Drop every override and persist the defaults
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.reset_at(&path)
    }

    pub fn reset_at(&mut self, path: &Path) -> Result<(), ConfigError> {
        *self = Config::default();
        self.save_to(path)?;
        tracing::info!("Settings reset to defaults at: {}", path.display());
        Ok(())
    }

    /// Application folder inside the platform config directory
    pub fn app_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("HandSignal"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir()?.join("config.json"))
    }
}
