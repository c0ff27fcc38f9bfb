//! Time-Domain Statistics

use crate::features::FeatureVector;
use crate::validate::validate_samples;
use signal_model::SignalError;

/// RMS at or below which a signal is treated as silent
pub const DEGENERATE_RMS: f64 = 1e-6;

/// Compute the time-domain feature vector of a waveform.
///
/// Requires at least two finite samples. Provenance fields are left empty.
pub fn extract_time_features(samples: &[f64]) -> Result<FeatureVector, SignalError> {
    validate_samples(samples)?;

    let n = samples.len() as f64;

    let mut abs_sum = 0.0;
    let mut sqrt_abs_sum = 0.0;
    let mut square_sum = 0.0;
    let mut signed_sum = 0.0;
    let mut peak = 0.0_f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for &v in samples {
        let a = v.abs();
        abs_sum += a;
        sqrt_abs_sum += a.sqrt();
        square_sum += v * v;
        signed_sum += v;
        peak = peak.max(a);
        min = min.min(v);
        max = max.max(v);
    }

    let mean = abs_sum / n;
    let rms = (square_sum / n).sqrt();
    let root_square = (sqrt_abs_sum / n).powi(2);

    // Central moments about the signed mean
    let centre = signed_sum / n;
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &v in samples {
        let d = v - centre;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let variance = m2;
    let std_dev = variance.sqrt();

    // Constant signals leave rounding residue in m2 proportional to centre²
    let (skewness, kurtosis) = if m2 > f64::EPSILON * centre * centre {
        (m3 / m2.powf(1.5), m4 / (m2 * m2))
    } else {
        (0.0, 0.0)
    };

    let (peak_factor, crest_factor) = if rms > DEGENERATE_RMS {
        ((max - min) / rms, peak / rms)
    } else {
        (0.0, 0.0)
    };

    Ok(FeatureVector {
        mean,
        peak,
        peak_to_peak: max - min,
        rms,
        root_square,
        peak_factor,
        kurtosis,
        skewness,
        pulse_factor: ratio_or_zero(peak, mean),
        allowance_factor: ratio_or_zero(peak, root_square),
        shape_factor: ratio_or_zero(rms, mean),
        crest_factor,
        variance,
        std_dev,
        channel: String::new(),
        recording_id: String::new(),
    })
}

/// `num / den`, or zero when the denominator vanishes (all-zero signal)
fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}
