use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "PRISM";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file name inside the application data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Get the application data directory
/// ~/PRISM/ on all platforms. Falls back to the working directory when
/// no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "prism_lib=debug,info"
    } else {
        "prism_lib=info,warn"
    }
}

/// Tunables read from `config.json`. Every field has a default so a
/// partial (or missing) file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    /// Window in which a second SOS press upgrades to a double alert.
    pub sos_window_ms: u64,
    /// Minimum gap between two spoken object announcements.
    pub announcement_delay_ms: u64,
    /// Detections at or below this score are never announced.
    pub detection_min_score: f32,
    /// Pixel size treated as roughly one metre away.
    pub distance_reference_px: f32,
    /// SQLite file name inside the data directory.
    pub database_file: String,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            sos_window_ms: 1000,
            announcement_delay_ms: 2000,
            detection_min_score: 0.66,
            distance_reference_px: 300.0,
            database_file: "prism.db".into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl PrismConfig {
    /// Load `config.json` from `dir`, or defaults when the file is absent.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sos_window_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "sos_window_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if !(0.0..1.0).contains(&self.detection_min_score) {
            return Err(ConfigError::Invalid {
                field: "detection_min_score",
                reason: format!("{} is outside [0, 1)", self.detection_min_score),
            });
        }
        if self.distance_reference_px <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "distance_reference_px",
                reason: "must be positive".into(),
            });
        }
        if self.database_file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database_file",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
