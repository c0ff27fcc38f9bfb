//! Input Validation for Signals and Parameters

use signal_model::SignalError;

/// Minimum number of samples for variance and higher moments
pub const MIN_SAMPLES: usize = 2;

/// Check that a waveform is long enough and contains only finite samples
pub fn validate_samples(samples: &[f64]) -> Result<(), SignalError> {
    if samples.len() < MIN_SAMPLES {
        return Err(SignalError::InvalidInput(format!(
            "signal needs at least {MIN_SAMPLES} samples, got {}",
            samples.len()
        )));
    }

    if let Some(idx) = samples.iter().position(|v| !v.is_finite()) {
        return Err(SignalError::InvalidInput(format!(
            "non-finite sample {} at index {idx}",
            samples[idx]
        )));
    }

    Ok(())
}

/// Check that a sampling frequency is positive and finite
pub fn validate_sample_rate(sample_rate: f64) -> Result<(), SignalError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(SignalError::InvalidParameter(format!(
            "sample rate must be positive, got {sample_rate}"
        )))
    }
}

/// Check that a named parameter is positive and finite
pub fn validate_positive(field: &'static str, value: f64) -> Result<(), SignalError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SignalError::InvalidParameter(format!(
            "{field} must be positive, got {value}"
        )))
    }
}
