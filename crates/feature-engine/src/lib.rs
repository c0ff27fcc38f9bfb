//! Vibration Feature Engine
//!
//! Time-domain health indicators, Butterworth filtering and envelope
//! (demodulation) spectra for rotating-machinery vibration signals.

mod conditioning;
mod features;
mod filter;
mod spectrum;
mod statistics;
mod validate;

pub use conditioning::{
    acceleration_to_velocity, frequency_synchronous_average, DEFAULT_VELOCITY_HIGHPASS_HZ,
};
pub use features::{FeatureName, FeatureVector, FEATURE_DIMENSION};
pub use filter::{Biquad, ButterworthFilter, FilterBand, FilterSpec, MAX_FILTER_ORDER};
pub use spectrum::{extract_envelope_spectrum, EnvelopeAnalyzer, EnvelopeSpectrum, SpectrumScaling};
pub use statistics::{extract_time_features, DEGENERATE_RMS};
pub use validate::{validate_sample_rate, validate_samples, MIN_SAMPLES};
