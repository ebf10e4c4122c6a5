use criterion::{black_box, criterion_group, criterion_main, Criterion};
use speakerid_features::{FeatureExtractor, SpeakerFeatureExtractor};

fn make_voiced_window(f0: f64, n_samples: usize, sample_rate: usize) -> Vec<f64> {
    (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (1..=5)
                .map(|h| {
                    (f0 * h as f64 * 2.0 * std::f64::consts::PI * t).sin() * 8000.0 / h as f64
                })
                .sum()
        })
        .collect()
}

fn bench_extract_1s(c: &mut Criterion) {
    let ext = SpeakerFeatureExtractor::default();
    let window = make_voiced_window(180.0, 8000, 8000);

    c.bench_function("features_extract_1s_8k", |b| {
        b.iter(|| {
            let _ = black_box(ext.extract(black_box(&window)));
        });
    });
}

fn bench_extract_250ms(c: &mut Criterion) {
    let ext = SpeakerFeatureExtractor::default();
    let window = make_voiced_window(120.0, 2000, 8000);

    c.bench_function("features_extract_250ms_8k", |b| {
        b.iter(|| {
            let _ = black_box(ext.extract(black_box(&window)));
        });
    });
}

criterion_group!(benches, bench_extract_1s, bench_extract_250ms);
criterion_main!(benches);
