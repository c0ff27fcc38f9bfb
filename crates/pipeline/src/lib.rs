//! Vibration Feature Pipeline
//!
//! Batch extraction of time-domain features and envelope-spectrum bearing
//! diagnosis over XJTU-SY and CWRU recordings:
//! - [`FeaturePipeline`]: per-recording features and diagnosis with failure isolation
//! - [`PipelineRunner`]: concurrent loading and batched storage
//! - [`Settings`]: file and environment configuration

pub mod logging;
pub mod pipeline;
pub mod runner;
pub mod settings;

pub use logging::init_logging;
pub use pipeline::{run_pipeline, FaultModelFactory, FeaturePipeline, PipelineOutcome};
pub use runner::{PipelineRunner, RunError, RunReport, RunnerConfig, DEFAULT_BATCH_SIZE};
pub use settings::{
    DatasetSettings, FaultModelSettings, LoggingSettings, PipelineSettings, ReportSettings,
    Settings, SettingsError, StorageBackend, StorageSettings,
};
