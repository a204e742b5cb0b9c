use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use bottleroute_optimizer::problem::{
    location::Location,
    routing_problem::{RoutingProblem, RoutingProblemBuilder},
    stop::{Stop, StopBuilder},
    travel_matrix::{DistanceMethod, TravelMatrix},
};
use bottleroute_optimizer::solver::{
    annealing::{SaParams, SimulatedAnnealing},
    genetic::{GaParams, GeneticAlgorithm},
    greedy::GreedyConstructor,
};

fn ring_stops(count: usize, demand: u32) -> Vec<Stop> {
    (0..count)
        .map(|i| {
            let angle = (i as f64 / count as f64) * std::f64::consts::TAU;
            let mut builder = StopBuilder::default();
            builder.set_external_id(format!("stop-{i}"));
            builder.set_location(Location::new(
                48.1375 + 0.05 * angle.sin(),
                11.5755 + 0.07 * angle.cos(),
            ));
            builder.set_demand(demand);
            builder.build()
        })
        .collect()
}

fn ring_problem(count: usize, demand: u32) -> RoutingProblem {
    let mut builder = RoutingProblemBuilder::default();
    builder.set_depot(Location::new(48.1375, 11.5755));
    builder.set_stops(ring_stops(count, demand));
    builder.build().unwrap()
}

fn distance_benchmark(c: &mut Criterion) {
    let munich = Location::new(48.1375, 11.5755);
    let berlin = Location::new(52.5200, 13.4050);

    let mut group = c.benchmark_group("distance");
    group.bench_function("haversine", |b| {
        b.iter(|| black_box(&munich).haversine_km(black_box(&berlin)))
    });
    group.bench_function("vincenty", |b| {
        b.iter(|| black_box(&munich).vincenty_km(black_box(&berlin)))
    });
    group.finish();
}

fn matrix_benchmark(c: &mut Criterion) {
    let locations: Vec<Location> = ring_stops(100, 10)
        .iter()
        .map(|stop| *stop.location())
        .collect();

    c.bench_function("matrix build 100", |b| {
        b.iter(|| TravelMatrix::build(black_box(&locations), DistanceMethod::Haversine))
    });
}

fn greedy_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy");
    for count in [20, 50, 100] {
        let problem = ring_problem(count, 15);
        group.bench_function(format!("construct {count}"), |b| {
            b.iter(|| GreedyConstructor::construct(black_box(&problem)))
        });
    }
    group.finish();
}

fn genetic_benchmark(c: &mut Criterion) {
    let problem = Arc::new(ring_problem(40, 15));
    let params = GaParams {
        population_size: 20,
        max_iterations: 20,
        seed: Some(42),
        ..GaParams::default()
    };

    c.bench_function("genetic 40 stops x 20 generations", |b| {
        b.iter(|| {
            GeneticAlgorithm::new(Arc::clone(&problem), params.clone())
                .unwrap()
                .optimize()
        })
    });
}

fn annealing_benchmark(c: &mut Criterion) {
    let problem = Arc::new(ring_problem(40, 15));
    let params = SaParams {
        max_iterations: 500,
        seed: Some(42),
        ..SaParams::default()
    };

    c.bench_function("annealing 40 stops x 500 iterations", |b| {
        b.iter(|| {
            SimulatedAnnealing::new(Arc::clone(&problem), params.clone())
                .unwrap()
                .optimize()
        })
    });
}

criterion_group!(
    benches,
    distance_benchmark,
    matrix_benchmark,
    greedy_benchmark,
    genetic_benchmark,
    annealing_benchmark
);
criterion_main!(benches);
