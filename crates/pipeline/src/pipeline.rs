//! Per-recording feature extraction and diagnosis

use fault_diagnosis::{DiagnosisConfig, DiagnosisResult, FaultDiagnosis};
use feature_engine::{extract_time_features, validate_sample_rate, FeatureVector};
use serde::{Serialize, Serializer};
use signal_model::{FaultFrequencyModel, FaultSet, Recording, SignalError};
use tracing::{debug, warn};

/// Supplies the fault-frequency model for a recording
pub type FaultModelFactory = dyn Fn(&Recording) -> Option<FaultFrequencyModel> + Send + Sync;

/// Result of processing one recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub recording_id: String,
    pub channel: String,
    pub features: Option<FeatureVector>,
    pub diagnosis: Option<DiagnosisResult>,
    /// Always an `ItemFailure` carrying the recording identity
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<SignalError>,
}

impl PipelineOutcome {
    /// Outcome for an item that failed before any computation
    pub fn failed(recording_id: impl Into<String>, channel: impl Into<String>, error: SignalError) -> Self {
        let recording_id = recording_id.into();
        let channel = channel.into();
        Self {
            error: Some(error.for_item(recording_id.clone(), channel.clone())),
            recording_id,
            channel,
            features: None,
            diagnosis: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Faults detected by the diagnosis, empty when none ran
    pub fn detected_faults(&self) -> FaultSet {
        self.diagnosis
            .as_ref()
            .map(DiagnosisResult::detected_faults)
            .unwrap_or_default()
    }
}

fn serialize_error<S: Serializer>(error: &Option<SignalError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

/// Computes time features for every recording and, when a fault model and
/// shaft speed are available, the envelope diagnosis
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    diagnosis: FaultDiagnosis,
}

impl FeaturePipeline {
    pub fn new(config: DiagnosisConfig) -> Result<Self, SignalError> {
        Ok(Self {
            diagnosis: FaultDiagnosis::new(config)?,
        })
    }

    pub fn diagnosis_config(&self) -> &DiagnosisConfig {
        self.diagnosis.config()
    }

    /// Process one recording with its own fault model
    pub fn process(&self, recording: &Recording) -> PipelineOutcome {
        self.process_with_model(recording, recording.fault_model.as_ref())
    }

    /// Process one recording; the factory's model takes precedence over the
    /// recording's own
    pub fn process_with(&self, recording: &Recording, factory: &FaultModelFactory) -> PipelineOutcome {
        let model = factory(recording);
        self.process_with_model(recording, model.as_ref().or(recording.fault_model.as_ref()))
    }

    fn process_with_model(
        &self,
        recording: &Recording,
        model: Option<&FaultFrequencyModel>,
    ) -> PipelineOutcome {
        let id = &recording.recording_id;
        let channel = &recording.channel;

        let extracted = validate_sample_rate(recording.sample_rate)
            .and_then(|()| extract_time_features(&recording.samples));
        let features = match extracted {
            Ok(features) => features.with_provenance(id.clone(), channel.clone()),
            Err(e) => {
                warn!("{} [{}]: time features failed: {}", id, channel, e);
                return PipelineOutcome::failed(id.clone(), channel.clone(), e);
            }
        };

        let mut outcome = PipelineOutcome {
            recording_id: id.clone(),
            channel: channel.clone(),
            features: Some(features),
            diagnosis: None,
            error: None,
        };

        let Some(model) = model else {
            return outcome;
        };
        // Negative or non-finite speeds go on to fail in the diagnosis
        if recording.rotation_rate == 0.0 {
            debug!("{} [{}]: no shaft speed, diagnosis skipped", id, channel);
            return outcome;
        }

        match self.diagnosis.diagnose(recording, model) {
            Ok(result) => {
                debug!("{} [{}]: detected {}", id, channel, result.detected_faults());
                outcome.diagnosis = Some(result);
            }
            Err(e) => {
                warn!("{} [{}]: diagnosis failed: {}", id, channel, e);
                outcome.error = Some(e.for_item(id.clone(), channel.clone()));
            }
        }
        outcome
    }

    /// Process recordings in order, isolating failures per item
    pub fn run(&self, recordings: &[Recording]) -> Vec<PipelineOutcome> {
        recordings.iter().map(|r| self.process(r)).collect()
    }

    /// Like [`FeaturePipeline::run`] with models supplied by `factory`
    pub fn run_with(&self, recordings: &[Recording], factory: &FaultModelFactory) -> Vec<PipelineOutcome> {
        recordings.iter().map(|r| self.process_with(r, factory)).collect()
    }
}

/// Run the default pipeline over `recordings` with models from `factory`
pub fn run_pipeline(recordings: &[Recording], factory: &FaultModelFactory) -> Vec<PipelineOutcome> {
    FeaturePipeline::default().run_with(recordings, factory)
}
