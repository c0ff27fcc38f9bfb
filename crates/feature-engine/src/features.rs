//! Feature Vector and Typed Feature Names

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of statistics in a [`FeatureVector`]
pub const FEATURE_DIMENSION: usize = 14;

/// Closed set of time-domain features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    Mean,
    Peak,
    PeakToPeak,
    Rms,
    RootSquare,
    PeakFactor,
    Kurtosis,
    Skewness,
    PulseFactor,
    AllowanceFactor,
    ShapeFactor,
    CrestFactor,
    Variance,
    StdDev,
}

impl FeatureName {
    /// Every feature, in storage column order
    pub const ALL: [FeatureName; FEATURE_DIMENSION] = [
        FeatureName::Mean,
        FeatureName::Peak,
        FeatureName::PeakToPeak,
        FeatureName::Rms,
        FeatureName::RootSquare,
        FeatureName::PeakFactor,
        FeatureName::Kurtosis,
        FeatureName::Skewness,
        FeatureName::PulseFactor,
        FeatureName::AllowanceFactor,
        FeatureName::ShapeFactor,
        FeatureName::CrestFactor,
        FeatureName::Variance,
        FeatureName::StdDev,
    ];

    /// Storage column name
    pub const fn column(self) -> &'static str {
        match self {
            FeatureName::Mean => "mean",
            FeatureName::Peak => "peak",
            FeatureName::PeakToPeak => "peakpeak",
            FeatureName::Rms => "rms",
            FeatureName::RootSquare => "root_square",
            FeatureName::PeakFactor => "peak_factor",
            FeatureName::Kurtosis => "kurtosis_factor",
            FeatureName::Skewness => "skewness_factor",
            FeatureName::PulseFactor => "pulse_factor",
            FeatureName::AllowanceFactor => "allowance_factor",
            FeatureName::ShapeFactor => "shape_factor",
            FeatureName::CrestFactor => "crest_factor",
            FeatureName::Variance => "variance",
            FeatureName::StdDev => "std_dev",
        }
    }

}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Time-domain health indicators for one channel of one recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean absolute value
    pub mean: f64,
    /// Maximum absolute value
    pub peak: f64,
    /// max(x) - min(x)
    pub peak_to_peak: f64,
    /// Root mean square
    pub rms: f64,
    /// Square of the mean square-root amplitude
    pub root_square: f64,
    /// Peak-to-peak over RMS, zero for near-silent signals
    pub peak_factor: f64,
    /// Pearson kurtosis (normal distribution = 3)
    pub kurtosis: f64,
    /// Third standardized moment
    pub skewness: f64,
    /// Peak over mean absolute value (impulse factor)
    pub pulse_factor: f64,
    /// Peak over root-square amplitude (margin factor)
    pub allowance_factor: f64,
    /// RMS over mean absolute value
    pub shape_factor: f64,
    /// Peak over RMS
    pub crest_factor: f64,
    /// Population variance
    pub variance: f64,
    /// Population standard deviation
    pub std_dev: f64,

    /// Channel the samples came from
    pub channel: String,
    /// Recording the samples came from
    pub recording_id: String,
}

impl FeatureVector {
    /// Value of a single feature
    pub fn get(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::Mean => self.mean,
            FeatureName::Peak => self.peak,
            FeatureName::PeakToPeak => self.peak_to_peak,
            FeatureName::Rms => self.rms,
            FeatureName::RootSquare => self.root_square,
            FeatureName::PeakFactor => self.peak_factor,
            FeatureName::Kurtosis => self.kurtosis,
            FeatureName::Skewness => self.skewness,
            FeatureName::PulseFactor => self.pulse_factor,
            FeatureName::AllowanceFactor => self.allowance_factor,
            FeatureName::ShapeFactor => self.shape_factor,
            FeatureName::CrestFactor => self.crest_factor,
            FeatureName::Variance => self.variance,
            FeatureName::StdDev => self.std_dev,
        }
    }

    /// All statistics in [`FeatureName::ALL`] order
    pub fn values(&self) -> [f64; FEATURE_DIMENSION] {
        FeatureName::ALL.map(|name| self.get(name))
    }

    /// Rebuild a vector from values in [`FeatureName::ALL`] order
    pub fn from_values(
        values: [f64; FEATURE_DIMENSION],
        recording_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        let [
            mean,
            peak,
            peak_to_peak,
            rms,
            root_square,
            peak_factor,
            kurtosis,
            skewness,
            pulse_factor,
            allowance_factor,
            shape_factor,
            crest_factor,
            variance,
            std_dev,
        ] = values;
        Self {
            mean,
            peak,
            peak_to_peak,
            rms,
            root_square,
            peak_factor,
            kurtosis,
            skewness,
            pulse_factor,
            allowance_factor,
            shape_factor,
            crest_factor,
            variance,
            std_dev,
            channel: channel.into(),
            recording_id: recording_id.into(),
        }
    }

    /// Attach provenance
    pub fn with_provenance(
        mut self,
        recording_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        self.recording_id = recording_id.into();
        self.channel = channel.into();
        self
    }
}
