//! Diagnosis configuration

use crate::locator::{DEFAULT_POWER_RATIO, DEFAULT_SEARCH_BANDWIDTH_HZ};
use feature_engine::{FilterSpec, SpectrumScaling};
use serde::{Deserialize, Serialize};

/// Envelope analysis and fault search parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    /// Pre-demodulation filter; `None` analyses the raw waveform
    pub filter: Option<FilterSpec>,

    /// Half-width of each fault search window (Hz)
    pub search_bandwidth_hz: f64,

    /// Peak-to-background ratio required for detection
    pub power_ratio: f64,

    /// Magnitude scaling of the envelope spectrum
    pub scaling: SpectrumScaling,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            filter: Some(FilterSpec::highpass(8, 800.0)),
            search_bandwidth_hz: DEFAULT_SEARCH_BANDWIDTH_HZ,
            power_ratio: DEFAULT_POWER_RATIO,
            scaling: SpectrumScaling::Raw,
        }
    }
}

impl DiagnosisConfig {
    /// Create strict config (higher detection threshold, narrower windows)
    pub fn strict() -> Self {
        Self {
            search_bandwidth_hz: 5.0,
            power_ratio: 20.0,
            ..Default::default()
        }
    }

    /// Create lenient config (lower detection threshold)
    pub fn lenient() -> Self {
        Self {
            power_ratio: 5.0,
            ..Default::default()
        }
    }

    /// Default search without the pre-demodulation filter
    pub fn unfiltered() -> Self {
        Self {
            filter: None,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::FilterBand;

    #[test]
    fn test_default_filter() {
        let config = DiagnosisConfig::default();
        let filter = config.filter.unwrap();
        assert_eq!(filter.order, 8);
        assert_eq!(filter.band, FilterBand::Highpass { cutoff_hz: 800.0 });
        assert_eq!(config.search_bandwidth_hz, 10.0);
        assert_eq!(config.power_ratio, 10.0);
    }

    #[test]
    fn test_presets() {
        assert!(DiagnosisConfig::strict().power_ratio > DiagnosisConfig::default().power_ratio);
        assert!(DiagnosisConfig::lenient().power_ratio < DiagnosisConfig::default().power_ratio);
        assert!(DiagnosisConfig::unfiltered().filter.is_none());
    }
}
