use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{extract_time_features, EnvelopeAnalyzer, FilterSpec, SpectrumScaling};
use std::f64::consts::PI;

/// One XJTU-SY file: 1.28 s at 25.6 kHz
fn xjtu_like_signal() -> Vec<f64> {
    let fs = 25_600.0;
    (0..32_768)
        .map(|i| {
            let t = i as f64 / fs;
            (1.0 + 0.5 * (2.0 * PI * 107.9 * t).cos()) * (2.0 * PI * 3_000.0 * t).sin()
        })
        .collect()
}

fn bench_envelope(c: &mut Criterion) {
    let signal = xjtu_like_signal();
    let filter = FilterSpec::highpass(8, 800.0);
    let mut analyzer = EnvelopeAnalyzer::new(SpectrumScaling::Raw);

    c.bench_function("envelope_spectrum_32k_hp8", |b| {
        b.iter(|| {
            analyzer
                .analyze(black_box(&signal), 25_600.0, Some(&filter))
                .unwrap()
        })
    });

    c.bench_function("time_features_32k", |b| {
        b.iter(|| extract_time_features(black_box(&signal)).unwrap())
    });
}

criterion_group!(benches, bench_envelope);
criterion_main!(benches);
