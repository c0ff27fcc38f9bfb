//! Runtime settings
//!
//! Loaded from an optional TOML file, then overridden by `VIBFEAT__*`
//! environment variables (`VIBFEAT__PIPELINE__WORKERS=8`).

use crate::runner::{RunnerConfig, DEFAULT_BATCH_SIZE};
use datasets::{CwruSource, DatasetError, RecordingSource, XjtuSource};
use fault_diagnosis::DiagnosisConfig;
use serde::{Deserialize, Serialize};
use signal_model::{FaultFrequencyModel, SignalError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "VIBFEAT";

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `info,pipeline=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Explicit bearing ratios applied to every recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultModelSettings {
    pub bpfo_ratio: f64,
    pub bpfi_ratio: f64,
    pub ftf_ratio: f64,
    pub bsf_ratio: f64,
}

impl FaultModelSettings {
    pub fn to_model(self) -> Result<FaultFrequencyModel, SignalError> {
        FaultFrequencyModel::new(self.bpfo_ratio, self.bpfi_ratio, self.ftf_ratio, self.bsf_ratio)
    }
}

/// Batch processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Concurrent files; 0 uses the available parallelism
    pub workers: usize,
    /// Records per sink flush
    pub batch_size: usize,
    pub diagnosis: DiagnosisConfig,
    /// Overrides the dataset's own bearing ratios
    pub fault_model: Option<FaultModelSettings>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            diagnosis: DiagnosisConfig::default(),
            fault_model: None,
        }
    }
}

/// Dataset locations; unset roots are skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    pub xjtu_root: Option<PathBuf>,
    pub cwru_root: Option<PathBuf>,
}

impl DatasetSettings {
    /// Sources for every configured root
    pub fn sources(&self) -> Result<Vec<Arc<dyn RecordingSource>>, SettingsError> {
        let mut sources: Vec<Arc<dyn RecordingSource>> = Vec::new();
        if let Some(root) = &self.xjtu_root {
            sources.push(Arc::new(XjtuSource::new(root)?));
        }
        if let Some(root) = &self.cwru_root {
            sources.push(Arc::new(CwruSource::new(root)?));
        }
        Ok(sources)
    }
}

/// Feature store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

/// Feature store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    /// Delete previously stored features before the run
    pub reset: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite://bearing_features.db".to_string(),
            max_connections: 4,
            reset: false,
        }
    }
}

/// Outcome report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// JSON-lines file receiving one outcome per recording
    pub path: Option<PathBuf>,
}

/// All runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub pipeline: PipelineSettings,
    pub datasets: DatasetSettings,
    pub storage: StorageSettings,
    pub report: ReportSettings,
}

impl Settings {
    /// Load settings from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.pipeline.batch_size == 0 {
            return Err(SettingsError::Invalid {
                field: "pipeline.batch_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.database_url.is_empty() {
            return Err(SettingsError::Invalid {
                field: "storage.database_url",
                reason: "required for the sqlite backend".into(),
            });
        }
        if let Some(model) = self.pipeline.fault_model {
            model.to_model().map_err(|e| SettingsError::Invalid {
                field: "pipeline.fault_model",
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Runner tuning derived from the pipeline settings
    pub fn runner_config(&self) -> RunnerConfig {
        let defaults = RunnerConfig::default();
        RunnerConfig {
            workers: if self.pipeline.workers == 0 {
                defaults.workers
            } else {
                self.pipeline.workers
            },
            batch_size: self.pipeline.batch_size,
        }
    }
}
