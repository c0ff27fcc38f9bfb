//! Butterworth IIR Filtering
//!
//! Filters are designed as cascaded second-order sections through the
//! bilinear transform with cutoff pre-warping, and applied causally.

use crate::validate::{validate_positive, validate_sample_rate};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use signal_model::SignalError;
use std::f64::consts::PI;

/// Highest supported filter order (per band edge)
pub const MAX_FILTER_ORDER: usize = 10;

/// Pass band of a filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum FilterBand {
    /// Pass frequencies below the cutoff
    Lowpass { cutoff_hz: f64 },
    /// Pass frequencies above the cutoff
    Highpass { cutoff_hz: f64 },
    /// Pass frequencies between the two edges
    Bandpass { low_hz: f64, high_hz: f64 },
}

/// Filter design request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Butterworth order (per edge for band-pass)
    pub order: usize,
    /// Pass band
    pub band: FilterBand,
}

impl FilterSpec {
    pub fn lowpass(order: usize, cutoff_hz: f64) -> Self {
        Self {
            order,
            band: FilterBand::Lowpass { cutoff_hz },
        }
    }

    pub fn highpass(order: usize, cutoff_hz: f64) -> Self {
        Self {
            order,
            band: FilterBand::Highpass { cutoff_hz },
        }
    }

    pub fn bandpass(order: usize, low_hz: f64, high_hz: f64) -> Self {
        Self {
            order,
            band: FilterBand::Bandpass { low_hz, high_hz },
        }
    }

    /// Check the order alone, independent of any sample rate
    pub fn validate_order(&self) -> Result<(), SignalError> {
        if self.order == 0 || self.order > MAX_FILTER_ORDER {
            return Err(SignalError::InvalidParameter(format!(
                "filter order must be 1-{MAX_FILTER_ORDER}, got {}",
                self.order
            )));
        }
        Ok(())
    }

    /// Check order and cutoffs against the sampling frequency
    pub fn validate(&self, sample_rate: f64) -> Result<(), SignalError> {
        validate_sample_rate(sample_rate)?;
        self.validate_order()?;

        let nyquist = sample_rate / 2.0;
        let check_edge = |field: &'static str, hz: f64| -> Result<(), SignalError> {
            validate_positive(field, hz)?;
            if hz >= nyquist {
                return Err(SignalError::InvalidParameter(format!(
                    "{field} {hz} Hz must be below Nyquist ({nyquist} Hz)"
                )));
            }
            Ok(())
        };

        match self.band {
            FilterBand::Lowpass { cutoff_hz } | FilterBand::Highpass { cutoff_hz } => {
                check_edge("cutoff_hz", cutoff_hz)
            }
            FilterBand::Bandpass { low_hz, high_hz } => {
                check_edge("low_hz", low_hz)?;
                check_edge("high_hz", high_hz)?;
                if low_hz >= high_hz {
                    return Err(SignalError::InvalidParameter(format!(
                        "band-pass edges must satisfy low < high, got {low_hz} / {high_hz}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Second-order section, H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    b: [f64; 3],
    a: [f64; 2],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a }
    }

    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    pub fn denominator(&self) -> &[f64; 2] {
        &self.a
    }

    /// Poles inside the unit circle
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }

    /// Run the section over a buffer in place (Direct Form II Transposed, zero initial state)
    fn process_in_place(&self, signal: &mut [f64]) {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        for x in signal.iter_mut() {
            let input = *x;
            let output = self.b[0] * input + s0;
            s0 = self.b[1] * input - self.a[0] * output + s1;
            s1 = self.b[2] * input - self.a[1] * output;
            *x = output;
        }
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + self.b[1] * z_inv + self.b[2] * z_inv2;
        let den = 1.0 + self.a[0] * z_inv + self.a[1] * z_inv2;
        num / den
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Low,
    High,
}

/// Butterworth filter as a cascade of biquads
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    sections: Vec<Biquad>,
    spec: FilterSpec,
    sample_rate: f64,
}

impl ButterworthFilter {
    /// Design a filter for the given sampling frequency
    pub fn design(spec: FilterSpec, sample_rate: f64) -> Result<Self, SignalError> {
        spec.validate(sample_rate)?;

        let sections = match spec.band {
            FilterBand::Lowpass { cutoff_hz } => {
                edge_sections(spec.order, cutoff_hz, sample_rate, Edge::Low)
            }
            FilterBand::Highpass { cutoff_hz } => {
                edge_sections(spec.order, cutoff_hz, sample_rate, Edge::High)
            }
            FilterBand::Bandpass { low_hz, high_hz } => {
                // Cascade of a low-pass at the upper edge and a high-pass at the lower edge
                let mut sections = edge_sections(spec.order, high_hz, sample_rate, Edge::Low);
                sections.extend(edge_sections(spec.order, low_hz, sample_rate, Edge::High));
                sections
            }
        };

        Ok(Self {
            sections,
            spec,
            sample_rate,
        })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// Filter a signal; the input is left untouched
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut output = input.to_vec();
        for section in &self.sections {
            section.process_in_place(&mut output);
        }
        output
    }

    /// Magnitude of the frequency response at `freq_hz`
    pub fn magnitude_response(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate;
        let z_inv = Complex64::new(omega.cos(), -omega.sin());
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
            .norm()
    }
}

fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    2.0 * sample_rate * (PI * freq_hz / sample_rate).tan()
}

/// Sections for a single low-pass or high-pass edge
fn edge_sections(order: usize, cutoff_hz: f64, sample_rate: f64, edge: Edge) -> Vec<Biquad> {
    let wc = prewarp(cutoff_hz, sample_rate);
    let k = 2.0 * sample_rate;
    let mut sections = Vec::with_capacity((order + 1) / 2);

    // Conjugate pole pairs on the circle of radius wc, left half plane
    for i in 0..order / 2 {
        let theta = PI * (2 * i + 1) as f64 / (2 * order) as f64;
        let p_re = -wc * theta.sin();
        sections.push(bilinear_pair(p_re, wc * wc, k, edge));
    }

    // Odd orders keep one real pole at -wc
    if order % 2 == 1 {
        sections.push(bilinear_real(-wc, k, edge));
    }

    sections
}

/// Bilinear transform of a conjugate pole pair with real part `p_re` and squared magnitude `p_mag_sq`
fn bilinear_pair(p_re: f64, p_mag_sq: f64, k: f64, edge: Edge) -> Biquad {
    let k2 = k * k;
    let d = k2 - 2.0 * k * p_re + p_mag_sq;
    let a1 = 2.0 * (p_mag_sq - k2) / d;
    let a2 = (k2 + 2.0 * k * p_re + p_mag_sq) / d;

    let b = match edge {
        Edge::Low => [p_mag_sq / d, 2.0 * p_mag_sq / d, p_mag_sq / d],
        Edge::High => [k2 / d, -2.0 * k2 / d, k2 / d],
    };

    Biquad::new(b, [a1, a2])
}

/// Bilinear transform of a single real pole `p`
fn bilinear_real(p: f64, k: f64, edge: Edge) -> Biquad {
    let alpha = k - p;
    let a1 = -(k + p) / alpha;

    let b = match edge {
        Edge::Low => [-p / alpha, -p / alpha, 0.0],
        Edge::High => [k / alpha, -k / alpha, 0.0],
    };

    Biquad::new(b, [a1, 0.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 12_000.0;

    fn tone(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    fn tail_rms(signal: &[f64]) -> f64 {
        let tail = &signal[signal.len() / 2..];
        (tail.iter().map(|v| v * v).sum::<f64>() / tail.len() as f64).sqrt()
    }

    #[test]
    fn test_lowpass_response() {
        let filter = ButterworthFilter::design(FilterSpec::lowpass(4, 1000.0), FS).unwrap();
        assert_eq!(filter.sections().len(), 2);
        assert!(filter.is_stable());
        assert!((filter.magnitude_response(0.0) - 1.0).abs() < 1e-9);
        assert!((filter.magnitude_response(1000.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(filter.magnitude_response(4000.0) < 0.01);
    }

    #[test]
    fn test_highpass_response() {
        let filter = ButterworthFilter::design(FilterSpec::highpass(8, 800.0), FS).unwrap();
        assert!(filter.is_stable());
        assert!(filter.magnitude_response(0.0) < 1e-9);
        assert!((filter.magnitude_response(800.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((filter.magnitude_response(FS / 2.0 - 1.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_odd_order_has_real_section() {
        let filter = ButterworthFilter::design(FilterSpec::lowpass(3, 500.0), FS).unwrap();
        assert_eq!(filter.sections().len(), 2);
        assert_eq!(filter.sections()[1].numerator()[2], 0.0);
        assert!((filter.magnitude_response(500.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_bandpass_isolates_tone() {
        let filter = ButterworthFilter::design(FilterSpec::bandpass(4, 2000.0, 4000.0), FS).unwrap();
        let inside = filter.apply(&tone(3000.0, 6000));
        let outside = filter.apply(&tone(200.0, 6000));
        assert!(tail_rms(&inside) > 0.6);
        assert!(tail_rms(&outside) < 0.01);
    }

    #[test]
    fn test_apply_keeps_length_and_input() {
        let input = tone(100.0, 257);
        let filter = ButterworthFilter::design(FilterSpec::highpass(2, 50.0), FS).unwrap();
        let output = filter.apply(&input);
        assert_eq!(output.len(), input.len());
        assert_eq!(input, tone(100.0, 257));
    }

    #[test]
    fn test_invalid_specs() {
        let cases = [
            FilterSpec::lowpass(0, 100.0),
            FilterSpec::lowpass(MAX_FILTER_ORDER + 1, 100.0),
            FilterSpec::highpass(4, 0.0),
            FilterSpec::highpass(4, FS / 2.0),
            FilterSpec::bandpass(4, 3000.0, 2000.0),
        ];
        for spec in cases {
            assert!(matches!(
                ButterworthFilter::design(spec, FS),
                Err(SignalError::InvalidParameter(_))
            ));
        }
        assert!(ButterworthFilter::design(FilterSpec::lowpass(2, 100.0), 0.0).is_err());
    }

    #[test]
    fn test_order_checked_without_sample_rate() {
        assert!(FilterSpec::highpass(1, 800.0).validate_order().is_ok());
        assert!(FilterSpec::highpass(MAX_FILTER_ORDER, 800.0).validate_order().is_ok());
        assert!(FilterSpec::highpass(0, 800.0).validate_order().is_err());
        assert!(FilterSpec::bandpass(MAX_FILTER_ORDER + 1, 1.0, 2.0).validate_order().is_err());
        // Cutoffs are not part of the order check
        assert!(FilterSpec::lowpass(4, -5.0).validate_order().is_ok());
    }
}
