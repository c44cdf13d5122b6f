//! Period calculation benchmarks
//!
//! The scheduler computes one period per template per run, so these are the
//! hot path of a large tenant's generation pass.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use compliance_core::period::{next_period_for, period_label_for};
use compliance_core::EngineConfig;

fn benchmark_next_period(c: &mut Criterion) {
    let reference = NaiveDate::from_ymd_opt(2025, 5, 20)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let today = reference.date();

    let mut group = c.benchmark_group("next_period");
    for (frequency, duration) in [
        ("monthly", None),
        ("quarterly", None),
        ("yearly", Some("Fiscal Year")),
        ("yearly", Some("5 years")),
    ] {
        let id = format!("{frequency}/{}", duration.unwrap_or("none"));
        group.bench_with_input(BenchmarkId::from_parameter(id), &(frequency, duration), |b, (f, d)| {
            b.iter(|| next_period_for(black_box(f), black_box(*d), reference, today))
        });
    }
    group.finish();
}

fn benchmark_period_label(c: &mut Criterion) {
    let reference = NaiveDate::from_ymd_opt(2025, 5, 20)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let period = next_period_for("quarterly", None, reference, reference.date()).unwrap();

    c.bench_function("period_label", |b| {
        b.iter(|| period_label_for(black_box(&period), black_box("quarterly")))
    });
}

fn benchmark_config_defaults(c: &mut Criterion) {
    c.bench_function("config_creation", |b| b.iter(EngineConfig::default));
}

criterion_group!(
    benches,
    benchmark_next_period,
    benchmark_period_label,
    benchmark_config_defaults
);
criterion_main!(benches);
