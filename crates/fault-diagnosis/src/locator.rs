//! Fault-Frequency Search on Envelope Spectra

use feature_engine::EnvelopeSpectrum;
use serde::{Deserialize, Serialize};
use signal_model::{FaultFrequencyModel, FaultKind, FaultSet, SignalError};
use tracing::debug;

/// Half-width of the window searched around each fault frequency (Hz)
pub const DEFAULT_SEARCH_BANDWIDTH_HZ: f64 = 10.0;

/// Peak-to-background ratio at which a fault counts as detected
pub const DEFAULT_POWER_RATIO: f64 = 10.0;

/// Search outcome for one fault kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultIndication {
    pub kind: FaultKind,
    /// Predicted characteristic frequency (Hz)
    pub expected_hz: f64,
    /// Peak cleared the power-ratio threshold
    pub detected: bool,
    /// Largest magnitude inside the search window
    pub peak_magnitude: f64,
    /// Frequency of that peak (Hz)
    pub peak_frequency_hz: f64,
    /// `peak_frequency_hz - expected_hz`
    pub offset_hz: f64,
    /// `peak_magnitude / background`
    pub ratio: f64,
}

/// Per-kind fault search results for one spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// One entry per kind, in [`FaultKind::ALL`] order
    pub indications: Vec<FaultIndication>,
    /// Median magnitude outside the search windows
    pub background: f64,
    pub search_bandwidth_hz: f64,
    pub power_ratio: f64,
}

impl DiagnosisResult {
    /// Indication for a fault kind
    pub fn get(&self, kind: FaultKind) -> Option<&FaultIndication> {
        self.indications.iter().find(|i| i.kind == kind)
    }

    /// Whether a fault kind was detected
    pub fn is_detected(&self, kind: FaultKind) -> bool {
        self.get(kind).is_some_and(|i| i.detected)
    }

    /// Set of detected kinds
    pub fn detected_faults(&self) -> FaultSet {
        self.indications
            .iter()
            .filter(|i| i.detected)
            .fold(FaultSet::EMPTY, |set, i| set.with(i.kind))
    }
}

/// Searches an envelope spectrum for energy at predicted defect frequencies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultFrequencyLocator {
    search_bandwidth_hz: f64,
    power_ratio: f64,
}

impl FaultFrequencyLocator {
    pub fn new(search_bandwidth_hz: f64, power_ratio: f64) -> Result<Self, SignalError> {
        if !(search_bandwidth_hz.is_finite() && search_bandwidth_hz > 0.0) {
            return Err(SignalError::InvalidParameter(format!(
                "search bandwidth must be positive, got {search_bandwidth_hz}"
            )));
        }
        if !(power_ratio.is_finite() && power_ratio > 0.0) {
            return Err(SignalError::InvalidParameter(format!(
                "power ratio must be positive, got {power_ratio}"
            )));
        }
        Ok(Self {
            search_bandwidth_hz,
            power_ratio,
        })
    }

    pub fn search_bandwidth_hz(&self) -> f64 {
        self.search_bandwidth_hz
    }

    pub fn power_ratio(&self) -> f64 {
        self.power_ratio
    }

    /// Look for each fault frequency of `model` in `spectrum`.
    ///
    /// `model` must already carry the recording's rotation rate.
    pub fn locate(
        &self,
        spectrum: &EnvelopeSpectrum,
        model: &FaultFrequencyModel,
    ) -> Result<DiagnosisResult, SignalError> {
        let freqs = spectrum.frequencies();
        let mags = spectrum.magnitudes();

        let mut windows = Vec::with_capacity(FaultKind::ALL.len());
        for kind in FaultKind::ALL {
            let expected_hz = model.frequency(kind);
            let (lo, hi) = self.window(freqs, expected_hz);
            if lo >= hi {
                return Err(SignalError::EmptySearchBand {
                    kind,
                    expected_hz,
                    bandwidth_hz: self.search_bandwidth_hz,
                });
            }
            windows.push((kind, expected_hz, lo, hi));
        }

        let background = background_level(mags, &windows);

        let indications = windows
            .into_iter()
            .map(|(kind, expected_hz, lo, hi)| {
                let (peak_idx, peak_magnitude) = (lo..hi)
                    .map(|i| (i, mags[i]))
                    .fold((lo, f64::NEG_INFINITY), |best, cur| {
                        if cur.1 > best.1 {
                            cur
                        } else {
                            best
                        }
                    });

                let ratio = if background > 0.0 {
                    peak_magnitude / background
                } else if peak_magnitude > 0.0 {
                    f64::INFINITY
                } else {
                    0.0
                };
                let detected = ratio >= self.power_ratio;
                let peak_frequency_hz = freqs[peak_idx];

                debug!(
                    "{}: expected {:.2} Hz, peak {:.4} at {:.2} Hz, ratio {:.2}, detected={}",
                    kind, expected_hz, peak_magnitude, peak_frequency_hz, ratio, detected
                );

                FaultIndication {
                    kind,
                    expected_hz,
                    detected,
                    peak_magnitude,
                    peak_frequency_hz,
                    offset_hz: peak_frequency_hz - expected_hz,
                    ratio,
                }
            })
            .collect();

        Ok(DiagnosisResult {
            indications,
            background,
            search_bandwidth_hz: self.search_bandwidth_hz,
            power_ratio: self.power_ratio,
        })
    }

    /// Index range of bins with `|f - expected| <= bandwidth`
    fn window(&self, freqs: &[f64], expected_hz: f64) -> (usize, usize) {
        let low = expected_hz - self.search_bandwidth_hz;
        let high = expected_hz + self.search_bandwidth_hz;
        let lo = freqs.partition_point(|&f| f < low);
        let hi = freqs.partition_point(|&f| f <= high);
        (lo, hi)
    }
}

impl Default for FaultFrequencyLocator {
    fn default() -> Self {
        Self {
            search_bandwidth_hz: DEFAULT_SEARCH_BANDWIDTH_HZ,
            power_ratio: DEFAULT_POWER_RATIO,
        }
    }
}

/// Search `spectrum` for the fault frequencies of `model`
pub fn locate_fault_frequencies(
    spectrum: &EnvelopeSpectrum,
    model: &FaultFrequencyModel,
    search_bandwidth_hz: f64,
    power_ratio: f64,
) -> Result<DiagnosisResult, SignalError> {
    FaultFrequencyLocator::new(search_bandwidth_hz, power_ratio)?.locate(spectrum, model)
}

/// Median of non-DC bins outside every search window, or of all non-DC bins
/// when the windows cover the whole spectrum
fn background_level(mags: &[f64], windows: &[(FaultKind, f64, usize, usize)]) -> f64 {
    let outside: Vec<f64> = mags
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, _)| !windows.iter().any(|&(_, _, lo, hi)| (lo..hi).contains(i)))
        .map(|(_, &m)| m)
        .collect();

    if outside.is_empty() {
        median(mags.get(1..).unwrap_or(&[]))
    } else {
        median(&outside)
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwru_model() -> FaultFrequencyModel {
        FaultFrequencyModel::new(3.5848, 5.4152, 0.3983, 4.7135)
            .unwrap()
            .with_rotation_rate(1730.0 / 60.0)
            .unwrap()
    }

    /// Flat background of 1.0 with a single 50.0 spike on the BPFI bin
    fn spiked_spectrum(model: &FaultFrequencyModel) -> EnvelopeSpectrum {
        let step = model.bpfi() / 300.0;
        let frequencies: Vec<f64> = (0..1000).map(|k| k as f64 * step).collect();
        let mut magnitudes = vec![1.0; 1000];
        magnitudes[300] = 50.0;
        EnvelopeSpectrum::from_parts(frequencies, magnitudes).unwrap()
    }

    #[test]
    fn test_inner_spike_detected_only() {
        let model = cwru_model();
        let spectrum = spiked_spectrum(&model);
        let result = locate_fault_frequencies(&spectrum, &model, DEFAULT_SEARCH_BANDWIDTH_HZ, 10.0).unwrap();

        assert!(result.is_detected(FaultKind::Inner));
        assert!(!result.is_detected(FaultKind::Outer));
        assert!(!result.is_detected(FaultKind::Ball));
        assert!(!result.is_detected(FaultKind::Cage));
        assert_eq!(result.detected_faults(), FaultSet::of(&[FaultKind::Inner]));
        assert_eq!(result.background, 1.0);

        let inner = result.get(FaultKind::Inner).unwrap();
        assert_eq!(inner.peak_magnitude, 50.0);
        assert!(inner.offset_hz.abs() < 1e-9);
        assert!((inner.ratio - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let model = cwru_model();
        let spectrum = spiked_spectrum(&model);
        let result = locate_fault_frequencies(&spectrum, &model, 10.0, 50.0).unwrap();
        assert!(result.is_detected(FaultKind::Inner));
        let result = locate_fault_frequencies(&spectrum, &model, 10.0, 50.5).unwrap();
        assert!(!result.is_detected(FaultKind::Inner));
    }

    #[test]
    fn test_empty_band_reported() {
        let model = cwru_model();
        // Spectrum stops at 50 Hz, far below BPFI
        let frequencies: Vec<f64> = (0..51).map(|k| k as f64).collect();
        let spectrum = EnvelopeSpectrum::from_parts(frequencies, vec![1.0; 51]).unwrap();

        match locate_fault_frequencies(&spectrum, &model, 10.0, 10.0) {
            Err(SignalError::EmptySearchBand { kind, .. }) => assert_eq!(kind, FaultKind::Inner),
            other => panic!("expected EmptySearchBand, got {other:?}"),
        }
    }

    #[test]
    fn test_band_narrower_than_resolution() {
        let model = cwru_model();
        // 1 Hz bins never land within 0.01 Hz of a non-integer BPFI
        let frequencies: Vec<f64> = (0..1000).map(|k| k as f64).collect();
        let spectrum = EnvelopeSpectrum::from_parts(frequencies, vec![1.0; 1000]).unwrap();
        assert!(matches!(
            locate_fault_frequencies(&spectrum, &model, 0.01, 10.0),
            Err(SignalError::EmptySearchBand { .. })
        ));
    }

    #[test]
    fn test_zero_background() {
        let model = cwru_model();
        let frequencies: Vec<f64> = (0..400).map(|k| k as f64).collect();
        let mut magnitudes = vec![0.0; 400];
        magnitudes[103] = 2.0;
        let spectrum = EnvelopeSpectrum::from_parts(frequencies, magnitudes).unwrap();

        let result = FaultFrequencyLocator::default().locate(&spectrum, &model).unwrap();
        assert_eq!(result.background, 0.0);
        assert!(result.is_detected(FaultKind::Outer));
        assert!(!result.is_detected(FaultKind::Cage));
        assert_eq!(result.get(FaultKind::Cage).unwrap().ratio, 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(FaultFrequencyLocator::new(0.0, 10.0).is_err());
        assert!(FaultFrequencyLocator::new(10.0, -1.0).is_err());
        assert!(FaultFrequencyLocator::new(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_reproducible() {
        let model = cwru_model();
        let spectrum = spiked_spectrum(&model);
        let a = FaultFrequencyLocator::default().locate(&spectrum, &model).unwrap();
        let b = FaultFrequencyLocator::default().locate(&spectrum, &model).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    proptest::proptest! {
        #[test]
        fn prop_indications_consistent(
            magnitudes in proptest::collection::vec(0.01f64..100.0, 400),
            ratio in 1.0f64..50.0,
        ) {
            let model = cwru_model();
            let frequencies: Vec<f64> = (0..400).map(|k| k as f64 * 0.5).collect();
            let spectrum = EnvelopeSpectrum::from_parts(frequencies, magnitudes).unwrap();
            let result = locate_fault_frequencies(&spectrum, &model, 5.0, ratio).unwrap();

            proptest::prop_assert_eq!(result.indications.len(), FaultKind::ALL.len());
            for indication in &result.indications {
                proptest::prop_assert_eq!(indication.detected, indication.ratio >= ratio);
                proptest::prop_assert!(indication.offset_hz.abs() <= 5.0 + 1e-9);
            }
        }
    }
}
