//! Envelope (Demodulation) Spectrum

use crate::filter::{ButterworthFilter, FilterSpec};
use crate::validate::{validate_sample_rate, validate_samples};
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::{Deserialize, Serialize};
use signal_model::SignalError;
use tracing::debug;

/// Magnitude scaling of the one-sided spectrum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumScaling {
    /// Plain `|FFT|`
    #[default]
    Raw,
    /// `|FFT| * 2 / N`, sinusoid amplitude units
    SingleSidedAmplitude,
}

/// One-sided magnitude spectrum with its frequency axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSpectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
}

impl EnvelopeSpectrum {
    /// Build a spectrum from precomputed bins.
    ///
    /// Frequencies must be finite, non-negative and non-decreasing, and both
    /// sequences must have the same length.
    pub fn from_parts(frequencies: Vec<f64>, magnitudes: Vec<f64>) -> Result<Self, SignalError> {
        if frequencies.len() != magnitudes.len() {
            return Err(SignalError::InvalidInput(format!(
                "{} frequencies for {} magnitudes",
                frequencies.len(),
                magnitudes.len()
            )));
        }
        if frequencies.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(SignalError::InvalidInput(
                "frequencies must be finite and non-negative".into(),
            ));
        }
        if frequencies.windows(2).any(|w| w[1] < w[0]) {
            return Err(SignalError::InvalidInput(
                "frequencies must be non-decreasing".into(),
            ));
        }
        if magnitudes.iter().any(|m| !m.is_finite()) {
            return Err(SignalError::InvalidInput("non-finite magnitude".into()));
        }

        Ok(Self {
            frequencies,
            magnitudes,
        })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// `(frequency, magnitude)` pairs in ascending frequency
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }

    /// Spacing between the first two bins, zero for fewer than two bins
    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [f0, f1, ..] => f1 - f0,
            _ => 0.0,
        }
    }

    /// Bin with the largest magnitude as `(index, frequency, magnitude)`
    pub fn dominant(&self) -> Option<(usize, f64, f64)> {
        self.iter()
            .enumerate()
            .max_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
            .map(|(i, (f, m))| (i, f, m))
    }
}

/// Computes analytic signals, envelopes and one-sided spectra.
///
/// Holds an FFT planner so repeated lengths reuse their plans.
pub struct EnvelopeAnalyzer {
    planner: FftPlanner<f64>,
    scaling: SpectrumScaling,
}

impl EnvelopeAnalyzer {
    pub fn new(scaling: SpectrumScaling) -> Self {
        Self {
            planner: FftPlanner::new(),
            scaling,
        }
    }

    pub fn scaling(&self) -> SpectrumScaling {
        self.scaling
    }

    /// Filter, demodulate and transform a waveform into its envelope spectrum
    pub fn analyze(
        &mut self,
        samples: &[f64],
        sample_rate: f64,
        filter: Option<&FilterSpec>,
    ) -> Result<EnvelopeSpectrum, SignalError> {
        validate_samples(samples)?;
        validate_sample_rate(sample_rate)?;

        let centred = remove_mean(samples);
        let conditioned = match filter {
            Some(spec) => ButterworthFilter::design(*spec, sample_rate)?.apply(&centred),
            None => centred,
        };

        let envelope = self.envelope(&conditioned);
        let spectrum = self.magnitude_spectrum_unchecked(&remove_mean(&envelope), sample_rate);

        debug!(
            "Envelope spectrum: n={}, bins={}, fs={} Hz, filtered={}",
            samples.len(),
            spectrum.len(),
            sample_rate,
            filter.is_some()
        );

        Ok(spectrum)
    }

    /// One-sided magnitude spectrum of a DC-removed waveform
    pub fn magnitude_spectrum(
        &mut self,
        samples: &[f64],
        sample_rate: f64,
    ) -> Result<EnvelopeSpectrum, SignalError> {
        validate_samples(samples)?;
        validate_sample_rate(sample_rate)?;
        Ok(self.magnitude_spectrum_unchecked(&remove_mean(samples), sample_rate))
    }

    /// Analytic signal via the frequency-domain Hilbert transform
    pub fn analytic_signal(&mut self, samples: &[f64]) -> Vec<Complex64> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let mut buffer: Vec<Complex64> = samples.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.planner.plan_fft_forward(n).process(&mut buffer);

        // Keep DC (and Nyquist for even n), double positive, drop negative frequencies
        let positive_end = (n + 1) / 2;
        for bin in buffer.iter_mut().take(positive_end).skip(1) {
            *bin *= 2.0;
        }
        let negative_start = if n % 2 == 0 { n / 2 + 1 } else { positive_end };
        for bin in buffer.iter_mut().skip(negative_start) {
            *bin = Complex64::new(0.0, 0.0);
        }

        self.planner.plan_fft_inverse(n).process(&mut buffer);
        let scale = 1.0 / n as f64;
        buffer.iter_mut().for_each(|c| *c *= scale);
        buffer
    }

    /// Instantaneous amplitude (magnitude of the analytic signal)
    pub fn envelope(&mut self, samples: &[f64]) -> Vec<f64> {
        self.analytic_signal(samples)
            .iter()
            .map(|c| c.norm())
            .collect()
    }

    fn magnitude_spectrum_unchecked(&mut self, samples: &[f64], sample_rate: f64) -> EnvelopeSpectrum {
        let n = samples.len();
        let mut buffer: Vec<Complex64> = samples.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.planner.plan_fft_forward(n).process(&mut buffer);

        let half = (n + 1) / 2;
        let bin_width = sample_rate / n as f64;
        let gain = match self.scaling {
            SpectrumScaling::Raw => 1.0,
            SpectrumScaling::SingleSidedAmplitude => 2.0 / n as f64,
        };

        EnvelopeSpectrum {
            frequencies: (0..half).map(|k| k as f64 * bin_width).collect(),
            magnitudes: buffer[..half].iter().map(|c| c.norm() * gain).collect(),
        }
    }
}

impl Default for EnvelopeAnalyzer {
    fn default() -> Self {
        Self::new(SpectrumScaling::default())
    }
}

/// Envelope spectrum of a waveform with raw `|FFT|` magnitudes
pub fn extract_envelope_spectrum(
    samples: &[f64],
    sample_rate: f64,
    filter: Option<&FilterSpec>,
) -> Result<EnvelopeSpectrum, SignalError> {
    EnvelopeAnalyzer::default().analyze(samples, sample_rate, filter)
}

fn remove_mean(samples: &[f64]) -> Vec<f64> {
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    samples.iter().map(|v| v - mean).collect()
}
