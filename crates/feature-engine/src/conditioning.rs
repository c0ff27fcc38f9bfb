//! Signal Conditioning Helpers

use crate::filter::{ButterworthFilter, FilterSpec};
use crate::validate::{validate_positive, validate_sample_rate, validate_samples};
use rustfft::{num_complex::Complex64, FftPlanner};
use signal_model::SignalError;

/// Order of the drift-removal high-pass used before integration
const VELOCITY_HIGHPASS_ORDER: usize = 6;

/// Default drift-removal cutoff (Hz)
pub const DEFAULT_VELOCITY_HIGHPASS_HZ: f64 = 1.0;

/// Average equal-length segments in the frequency domain.
///
/// Components that are not phase-locked across segments cancel out, leaving
/// the synchronous part of the signal.
pub fn frequency_synchronous_average(segments: &[Vec<f64>]) -> Result<Vec<f64>, SignalError> {
    let first = segments
        .first()
        .ok_or_else(|| SignalError::InvalidInput("no segments to average".into()))?;
    let n = first.len();
    if n == 0 {
        return Err(SignalError::InvalidInput("segments are empty".into()));
    }
    if let Some(bad) = segments.iter().position(|s| s.len() != n) {
        return Err(SignalError::InvalidInput(format!(
            "inconsistent segment length: segment {bad} has {} samples, expected {n}",
            segments[bad].len()
        )));
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let mut sum = vec![Complex64::new(0.0, 0.0); n];

    for segment in segments {
        let mut buffer: Vec<Complex64> = segment.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        forward.process(&mut buffer);
        for (acc, bin) in sum.iter_mut().zip(&buffer) {
            *acc += bin;
        }
    }

    planner.plan_fft_inverse(n).process(&mut sum);
    // Inverse FFT is unnormalised
    let scale = 1.0 / (n as f64 * segments.len() as f64);
    Ok(sum.iter().map(|c| c.re * scale).collect())
}

/// Integrate an acceleration signal into velocity.
///
/// Optionally removes a linear trend, suppresses drift with a 6th-order
/// high-pass at `highpass_hz`, then applies cumulative trapezoidal
/// integration starting from zero. The output has the same length as the input.
pub fn acceleration_to_velocity(
    samples: &[f64],
    sample_rate: f64,
    highpass_hz: f64,
    detrend: bool,
) -> Result<Vec<f64>, SignalError> {
    validate_samples(samples)?;
    validate_sample_rate(sample_rate)?;
    validate_positive("highpass_hz", highpass_hz)?;

    let input = if detrend {
        remove_linear_trend(samples)
    } else {
        samples.to_vec()
    };

    let filter = ButterworthFilter::design(
        FilterSpec::highpass(VELOCITY_HIGHPASS_ORDER, highpass_hz),
        sample_rate,
    )?;
    let filtered = filter.apply(&input);

    let dt = 1.0 / sample_rate;
    let mut velocity = Vec::with_capacity(filtered.len());
    let mut acc = 0.0;
    velocity.push(acc);
    for pair in filtered.windows(2) {
        acc += 0.5 * (pair[0] + pair[1]) * dt;
        velocity.push(acc);
    }
    Ok(velocity)
}

/// Subtract the least-squares line through the samples
fn remove_linear_trend(samples: &[f64]) -> Vec<f64> {
    let n = samples.len() as f64;
    let t_mean = (n - 1.0) / 2.0;
    let y_mean = samples.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, &y) in samples.iter().enumerate() {
        let dt = i as f64 - t_mean;
        cov += dt * (y - y_mean);
        var += dt * dt;
    }
    let slope = if var > 0.0 { cov / var } else { 0.0 };

    samples
        .iter()
        .enumerate()
        .map(|(i, &y)| y - y_mean - slope * (i as f64 - t_mean))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_average_of_identical_segments() {
        let segment: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
        let averaged = frequency_synchronous_average(&[segment.clone(), segment.clone(), segment.clone()]).unwrap();
        for (a, b) in averaged.iter().zip(&segment) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_opposite_segments_cancel() {
        let segment: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let negated: Vec<f64> = segment.iter().map(|v| -v).collect();
        let averaged = frequency_synchronous_average(&[segment, negated]).unwrap();
        assert!(averaged.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_average_rejects_bad_segments() {
        assert!(frequency_synchronous_average(&[]).is_err());
        assert!(frequency_synchronous_average(&[vec![]]).is_err());
        assert!(matches!(
            frequency_synchronous_average(&[vec![1.0, 2.0], vec![1.0]]),
            Err(SignalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_linear_trend_removed() {
        let ramp: Vec<f64> = (0..100).map(|i| 3.0 + 0.5 * i as f64).collect();
        assert!(remove_linear_trend(&ramp).iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_velocity_of_constant_acceleration_is_zero_after_detrend() {
        let velocity = acceleration_to_velocity(&[9.81; 1000], 1000.0, 1.0, true).unwrap();
        assert_eq!(velocity.len(), 1000);
        assert_eq!(velocity[0], 0.0);
        assert!(velocity.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_velocity_amplitude_of_tone() {
        let fs = 20_000.0;
        let f = 200.0;
        let acceleration: Vec<f64> = (0..40_000)
            .map(|i| (2.0 * PI * f * i as f64 / fs).cos())
            .collect();
        let velocity = acceleration_to_velocity(&acceleration, fs, 20.0, true).unwrap();

        let tail = &velocity[20_000..];
        let max = tail.iter().cloned().fold(f64::MIN, f64::max);
        let min = tail.iter().cloned().fold(f64::MAX, f64::min);
        let expected = 2.0 / (2.0 * PI * f);
        assert!(((max - min) - expected).abs() / expected < 0.05);
    }

    #[test]
    fn test_velocity_rejects_bad_parameters() {
        assert!(acceleration_to_velocity(&[1.0, 2.0], 0.0, 1.0, false).is_err());
        assert!(acceleration_to_velocity(&[1.0, 2.0], 100.0, 0.0, false).is_err());
        assert!(acceleration_to_velocity(&[1.0, 2.0], 100.0, 60.0, false).is_err());
    }
}
