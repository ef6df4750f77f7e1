use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex64;

use gisasrs::compute::compute_coefficients;
use gisasrs::data::relative_difference;
use gisasrs::{SampleBuilderRegistry, SimulationOptions, SimulationRegistry};

fn bench_standard_samples(c: &mut Criterion) {
    let builders = SampleBuilderRegistry::new_with_defaults();
    let simulations = SimulationRegistry::new_with_defaults();
    let mut group = c.benchmark_group("mini_gisas");
    group.sample_size(20);

    for name in ["CylindersInBA", "CylindersInDWBA", "RadialParaCrystal", "CylindersSSCA", "CoreShellBoxes"] {
        let mut simulation = simulations.create("MiniGISAS").expect("standard simulation");
        simulation.set_sample_builder(builders.create(name).expect("standard builder"));
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                simulation.run_simulation().expect("simulation runs");
                black_box(simulation.raw_intensity_data().sum())
            })
        });
    }
    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic_gisas_threads");
    group.sample_size(10);
    for threads in [1usize, 2, 4] {
        let mut simulation = SimulationRegistry::new_with_defaults()
            .create("BasicGISAS")
            .expect("standard simulation");
        simulation.set_sample_builder(
            SampleBuilderRegistry::new_with_defaults()
                .create("CylindersInDWBA")
                .expect("standard builder"),
        );
        simulation.set_options(SimulationOptions::with_threads(threads));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter(|| simulation.run_simulation().expect("simulation runs"))
        });
    }
    group.finish();
}

fn bench_fresnel(c: &mut Criterion) {
    let n2 = vec![
        Complex64::new(1.0, 0.0),
        Complex64::new(1.0 - 2.0 * 3.45e-6, 2.0 * 5.24e-9),
        Complex64::new(1.0 - 2.0 * 7.43e-6, 2.0 * 1.72e-7),
    ];
    let thickness = vec![0.0, 30.0, 0.0];
    let k0 = 2.0 * std::f64::consts::PI / 0.15;
    c.bench_function("fresnel_three_layers", |b| {
        b.iter(|| compute_coefficients(black_box(&n2), black_box(&thickness), k0, black_box(-0.0026)))
    });
}

fn bench_relative_difference(c: &mut Criterion) {
    let mut simulation = SimulationRegistry::new_with_defaults()
        .create("BasicGISAS")
        .expect("standard simulation");
    simulation.set_sample_builder(
        SampleBuilderRegistry::new_with_defaults()
            .create("CylindersInBA")
            .expect("standard builder"),
    );
    simulation.run_simulation().expect("simulation runs");
    let data = simulation.intensity_data();
    let mut reference = data.clone();
    reference.scale(1.0 + 1e-9);
    c.bench_function("relative_difference_100x100", |b| {
        b.iter(|| relative_difference(black_box(&data), black_box(&reference)).expect("same shape"))
    });
}

criterion_group!(
    benches,
    bench_standard_samples,
    bench_threads,
    bench_fresnel,
    bench_relative_difference
);
criterion_main!(benches);
