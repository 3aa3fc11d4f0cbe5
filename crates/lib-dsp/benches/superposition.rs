//! Superposition and resampling benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lib_dsp::alignment::delay_and_align;
use lib_dsp::resample::{resample, ResampleConfig};
use lib_dsp::superposition::{combine, PadPolicy};
use lib_dsp::FftEngine;
use lib_types::timeseries::TimeSeries;
use lib_types::units::Seconds;

fn response(len: usize, dt: f64) -> TimeSeries {
    let samples = (0..len).map(|i| (i as f64 * 0.01).sin() * (-(i as f64) * 1e-3).exp()).collect();
    TimeSeries::new(samples, Seconds(dt), Seconds::ZERO)
}

fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");
    let policy = PadPolicy::default();

    for len in [1024, 4096, 16384].iter() {
        let a = response(*len, 0.05);
        let mut b = response(*len, 0.05);
        delay_and_align(&mut b, Seconds(12.34));

        group.bench_with_input(BenchmarkId::new("offset", len), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| combine(black_box(a), black_box(b), 0.7, -1.3, &policy));
        });
    }

    group.finish();
}

fn bench_accumulate(c: &mut Criterion) {
    let policy = PadPolicy::default();
    let unit = response(2048, 0.05);
    let delayed: Vec<TimeSeries> = (0..200)
        .map(|k| {
            let mut s = unit.clone();
            delay_and_align(&mut s, Seconds(k as f64 * 0.37));
            s
        })
        .collect();

    c.bench_function("accumulate_200_subfaults", |bench| {
        bench.iter(|| {
            delayed.iter().try_fold(TimeSeries::empty(Seconds(0.05)), |acc, s| {
                combine(&acc, black_box(s), 1.0, 1.0, &policy)
            })
        });
    });
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let config = ResampleConfig::default();
    let series = response(8192, 0.05);

    for target in [0.2, 0.02].iter() {
        let mut engine = FftEngine::new();
        group.bench_with_input(BenchmarkId::new("to", target), target, |bench, &target| {
            bench.iter(|| resample(black_box(&series), Seconds(target), &config, &mut engine));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_combine, bench_accumulate, bench_resample);
criterion_main!(benches);
