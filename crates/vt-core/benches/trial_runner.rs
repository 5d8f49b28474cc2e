//! Criterion benchmarks for the trial runner.
//!
//! Covers the two hot paths: cohort generation and evaluating every policy
//! on one cohort.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vt_config::{CalibrationPreset, SimulationConstants};
use vt_core::cohort::CohortGenerator;
use vt_core::seed::cohort_rng;
use vt_core::{ExecutionMode, Policy, RunConfig, TrialRunner};

fn bench_cohort_generation(c: &mut Criterion) {
    let preset = CalibrationPreset::Cdc2020;
    let (age, severity) = (preset.age_table(), preset.severity_table());
    let constants = SimulationConstants::default();
    let generator = CohortGenerator::new(&age, &severity, &constants).expect("valid preset");

    let mut group = c.benchmark_group("cohort");
    for n in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("generate", n), &n, |b, &n| {
            let mut trial = 0;
            b.iter(|| {
                trial += 1;
                black_box(generator.generate(n, &mut cohort_rng(7, trial)).expect("generate"));
            });
        });
    }
    group.finish();
}

fn bench_trial_evaluation(c: &mut Criterion) {
    let preset = CalibrationPreset::Cdc2020;
    let (age, severity) = (preset.age_table(), preset.severity_table());
    let constants = SimulationConstants::default();

    let mut group = c.benchmark_group("trial");
    for execution in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let config = RunConfig {
            patients: 1_000,
            ventilators: 500,
            trials: 32,
            seed: 7,
            policies: Policy::defaults(),
            execution,
        };
        let runner = TrialRunner::new(config, &age, &severity, &constants).expect("runner");
        group.bench_function(BenchmarkId::new("run_32x1000", execution), |b| {
            b.iter(|| black_box(runner.run().expect("run")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cohort_generation, bench_trial_evaluation);
criterion_main!(benches);
