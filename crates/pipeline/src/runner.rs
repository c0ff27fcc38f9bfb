//! Async batch runner
//!
//! Loads recordings from a [`RecordingSource`] on blocking worker threads,
//! runs the [`FeaturePipeline`] on them and streams the resulting feature
//! records to a [`FeatureSink`] in batches.

use crate::pipeline::{FaultModelFactory, FeaturePipeline, PipelineOutcome};
use chrono::{DateTime, Utc};
use datasets::{DatasetError, RecordingHandle, RecordingSource};
use serde::Serialize;
use signal_model::SignalError;
use std::io::{self, Write};
use std::sync::Arc;
use storage::{FeatureRecord, FeatureSink};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default number of records per sink flush
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Channel name used for failures that affect every channel of a file
const ALL_CHANNELS: &str = "*";

/// Runner tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Files loaded and processed concurrently
    pub workers: usize,
    /// Records buffered before each sink flush
    pub batch_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Errors that stop a run before any recording is processed
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to list recordings from {source_name}: {error}")]
    List {
        source_name: String,
        #[source]
        error: DatasetError,
    },
    #[error("Listing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Files listed by the source
    pub files: usize,
    /// Files that could not be loaded
    pub load_failures: usize,
    /// Channel recordings processed
    pub recordings: usize,
    /// Outcomes carrying an error, load failures included
    pub item_failures: usize,
    /// Records accepted by the sink
    pub stored: usize,
    /// Records rejected by the sink
    pub store_failures: usize,
    /// One entry per processed channel or failed file, in listing order
    pub outcomes: Vec<PipelineOutcome>,
}

impl RunReport {
    /// Write the outcomes as JSON lines
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for outcome in &self.outcomes {
            serde_json::to_writer(&mut writer, outcome)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

/// Per-file result of a worker task
struct FileResult {
    handle: RecordingHandle,
    loaded: bool,
    items: Vec<(PipelineOutcome, Option<FeatureRecord>)>,
}

/// Drives a [`FeaturePipeline`] over a recording source into a feature sink
pub struct PipelineRunner {
    pipeline: Arc<FeaturePipeline>,
    sink: Arc<dyn FeatureSink>,
    factory: Option<Arc<FaultModelFactory>>,
    config: RunnerConfig,
}

impl PipelineRunner {
    pub fn new(pipeline: Arc<FeaturePipeline>, sink: Arc<dyn FeatureSink>, config: RunnerConfig) -> Self {
        let config = RunnerConfig {
            workers: config.workers.max(1),
            batch_size: config.batch_size.max(1),
        };
        info!(
            "Pipeline runner initialized: workers={}, batch_size={}",
            config.workers, config.batch_size
        );
        Self {
            pipeline,
            sink,
            factory: None,
            config,
        }
    }

    /// Override fault models for every recording
    pub fn with_fault_model_factory(mut self, factory: Arc<FaultModelFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    /// Process every recording of `source`.
    ///
    /// Load, compute and sink failures are counted per item and never abort
    /// the run; only a failure to list the source does.
    pub async fn run(&self, source: Arc<dyn RecordingSource>) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let source_name = source.name().to_string();

        let listing = Arc::clone(&source);
        let handles = tokio::task::spawn_blocking(move || listing.list())
            .await?
            .map_err(|error| RunError::List {
                source_name: source_name.clone(),
                error,
            })?;

        info!("Run {} started: {} files from {}", run_id, handles.len(), source_name);

        let mut report = RunReport {
            run_id,
            source: source_name,
            started_at,
            finished_at: started_at,
            files: handles.len(),
            load_failures: 0,
            recordings: 0,
            item_failures: 0,
            stored: 0,
            store_failures: 0,
            outcomes: Vec::new(),
        };
        let mut buffer: Vec<FeatureRecord> = Vec::with_capacity(self.config.batch_size);

        for window in handles.chunks(self.config.workers) {
            let tasks: Vec<(RecordingHandle, JoinHandle<FileResult>)> = window
                .iter()
                .map(|handle| (handle.clone(), self.spawn_file(&source, handle.clone())))
                .collect();

            for (handle, task) in tasks {
                let result = match task.await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Worker for {} failed: {}", handle.relative_path, e);
                        FileResult {
                            items: vec![(
                                PipelineOutcome::failed(
                                    handle.relative_path.clone(),
                                    ALL_CHANNELS,
                                    SignalError::Source(format!("worker failed: {e}")),
                                ),
                                None,
                            )],
                            handle,
                            loaded: false,
                        }
                    }
                };

                self.absorb(result, &mut report, &mut buffer);
                if buffer.len() >= self.config.batch_size {
                    self.flush(&mut buffer, &mut report).await;
                }
            }
        }
        self.flush(&mut buffer, &mut report).await;

        report.finished_at = Utc::now();
        info!(
            "Run {} finished: {} files, {} recordings, {} failures, {} stored",
            run_id, report.files, report.recordings, report.item_failures, report.stored
        );
        Ok(report)
    }

    fn spawn_file(&self, source: &Arc<dyn RecordingSource>, handle: RecordingHandle) -> JoinHandle<FileResult> {
        let source = Arc::clone(source);
        let pipeline = Arc::clone(&self.pipeline);
        let factory = self.factory.clone();

        tokio::task::spawn_blocking(move || {
            let recordings = match source.load(&handle) {
                Ok(recordings) => recordings,
                Err(e) => {
                    warn!("Failed to load {}: {}", handle.relative_path, e);
                    let outcome = PipelineOutcome::failed(
                        handle.relative_path.clone(),
                        ALL_CHANNELS,
                        SignalError::from(e),
                    );
                    return FileResult {
                        handle,
                        loaded: false,
                        items: vec![(outcome, None)],
                    };
                }
            };

            let items = recordings
                .iter()
                .map(|recording| {
                    let outcome = match &factory {
                        Some(factory) => pipeline.process_with(recording, factory.as_ref()),
                        None => pipeline.process(recording),
                    };
                    let record = outcome
                        .features
                        .clone()
                        .map(|features| FeatureRecord::from_recording(recording, features));
                    (outcome, record)
                })
                .collect();

            FileResult {
                handle,
                loaded: true,
                items,
            }
        })
    }

    fn absorb(&self, result: FileResult, report: &mut RunReport, buffer: &mut Vec<FeatureRecord>) {
        if !result.loaded {
            report.load_failures += 1;
        }
        debug!("{}: {} channel outcomes", result.handle.relative_path, result.items.len());

        for (outcome, record) in result.items {
            if result.loaded {
                report.recordings += 1;
                metrics::counter!("vibfeat_recordings_total").increment(1);
            }
            if !outcome.is_ok() {
                report.item_failures += 1;
                metrics::counter!("vibfeat_item_failures_total").increment(1);
            }
            for kind in outcome.detected_faults().iter() {
                metrics::counter!("vibfeat_faults_detected_total", "kind" => kind.name()).increment(1);
            }
            if let Some(record) = record {
                buffer.push(record);
            }
            report.outcomes.push(outcome);
        }
    }

    async fn flush(&self, buffer: &mut Vec<FeatureRecord>, report: &mut RunReport) {
        if buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(buffer);
        let len = batch.len();

        let results = self.sink.store(batch).await;
        let stored = results.iter().filter(|r| r.is_ok()).count();
        // A sink returning fewer results than records counts the rest as failed
        let failed = len - stored.min(len);
        for error in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!("Feature store rejected a record: {}", error);
        }

        report.stored += stored;
        report.store_failures += failed;
        metrics::counter!("vibfeat_features_stored_total").increment(stored as u64);
        debug!("Flushed {} records ({} failed)", len, failed);
    }
}
