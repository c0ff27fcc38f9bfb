//! Envelope-based bearing diagnosis

use crate::config::DiagnosisConfig;
use crate::locator::{DiagnosisResult, FaultFrequencyLocator};
use feature_engine::EnvelopeAnalyzer;
use signal_model::{FaultFrequencyModel, Recording, SignalError};
use tracing::{debug, info};

/// Runs the envelope spectrum and fault-frequency search for one bearing
#[derive(Debug, Clone)]
pub struct FaultDiagnosis {
    config: DiagnosisConfig,
    locator: FaultFrequencyLocator,
}

impl FaultDiagnosis {
    pub fn new(config: DiagnosisConfig) -> Result<Self, SignalError> {
        let locator = FaultFrequencyLocator::new(config.search_bandwidth_hz, config.power_ratio)?;
        if let Some(filter) = &config.filter {
            filter.validate_order()?;
        }

        info!(
            "Fault diagnosis initialized: filter={:?}, bandwidth={} Hz, power_ratio={}",
            config.filter, config.search_bandwidth_hz, config.power_ratio
        );

        Ok(Self { config, locator })
    }

    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    /// Diagnose a waveform against a model with its rotation rate already set
    pub fn process(
        &self,
        samples: &[f64],
        sample_rate: f64,
        model: &FaultFrequencyModel,
    ) -> Result<DiagnosisResult, SignalError> {
        if model.rotation_rate() <= 0.0 {
            return Err(SignalError::InvalidParameter(
                "fault model has no rotation rate assigned".into(),
            ));
        }

        let spectrum = EnvelopeAnalyzer::new(self.config.scaling).analyze(
            samples,
            sample_rate,
            self.config.filter.as_ref(),
        )?;
        let result = self.locator.locate(&spectrum, model)?;

        debug!(
            "Diagnosis at {:.2} rps: detected={}, background={:.4}",
            model.rotation_rate(),
            result.detected_faults(),
            result.background
        );

        Ok(result)
    }

    /// Diagnose a recording using `model`'s ratios and the recording's speed
    pub fn diagnose(
        &self,
        recording: &Recording,
        model: &FaultFrequencyModel,
    ) -> Result<DiagnosisResult, SignalError> {
        let model = model.clone().with_rotation_rate(recording.rotation_rate)?;
        self.process(&recording.samples, recording.sample_rate, &model)
    }
}

impl Default for FaultDiagnosis {
    fn default() -> Self {
        Self {
            config: DiagnosisConfig::default(),
            locator: FaultFrequencyLocator::default(),
        }
    }
}
