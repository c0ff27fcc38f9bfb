//! Vibration feature pipeline - batch entry point
//!
//! Usage: `vibfeat [settings.toml]`

use anyhow::{bail, Context, Result};
use pipeline::{
    init_logging, FaultModelFactory, FeaturePipeline, PipelineRunner, Settings, StorageBackend,
};
use signal_model::Recording;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{FeatureSink, Repository, SqliteFeatureStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).context("loading settings")?;
    init_logging(&settings.logging);

    info!("=== Vibration feature pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let sources = settings.datasets.sources()?;
    if sources.is_empty() {
        bail!("no dataset configured; set datasets.xjtu_root or datasets.cwru_root");
    }

    let sink: Arc<dyn FeatureSink> = match settings.storage.backend {
        StorageBackend::Memory => Arc::new(Repository::new()),
        StorageBackend::Sqlite => {
            let store = SqliteFeatureStore::connect(
                &settings.storage.database_url,
                settings.storage.max_connections,
            )
            .await
            .context("opening feature store")?;
            if settings.storage.reset {
                store.delete_all_features().await?;
            }
            Arc::new(store)
        }
    };

    let pipeline = Arc::new(FeaturePipeline::new(settings.pipeline.diagnosis.clone())?);
    let mut runner = PipelineRunner::new(pipeline, sink, settings.runner_config());
    if let Some(ratios) = settings.pipeline.fault_model {
        let model = ratios.to_model()?;
        let factory: Arc<FaultModelFactory> = Arc::new(move |_: &Recording| Some(model.clone()));
        runner = runner.with_fault_model_factory(factory);
    }

    let mut report_writer = match &settings.report.path {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating report {}", path.display()))?,
        )),
        None => None,
    };

    let mut failures = 0;
    for source in sources {
        let report = runner.run(source).await?;
        info!(
            run_id = %report.run_id,
            source = %report.source,
            files = report.files,
            recordings = report.recordings,
            item_failures = report.item_failures,
            stored = report.stored,
            "Run complete"
        );
        failures += report.item_failures + report.store_failures;
        if let Some(writer) = report_writer.as_mut() {
            report.write_json_lines(writer)?;
        }
    }

    if failures > 0 {
        warn!("{} items failed; see the report for details", failures);
    }
    Ok(())
}
