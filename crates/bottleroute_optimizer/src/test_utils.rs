use jiff::SignedDuration;

use crate::problem::{
    constraints::VehicleConstraints,
    location::Location,
    routing_problem::{RoutingProblem, RoutingProblemBuilder},
    stop::{Priority, Stop, StopBuilder},
};

/// The depot used across tests: Munich city center.
pub fn munich_depot() -> Location {
    Location::new(48.1375, 11.5755)
}

pub fn stop(id: &str, lat: f64, lng: f64, demand: u32, priority: Priority) -> Stop {
    let mut builder = StopBuilder::default();
    builder.set_external_id(id);
    builder.set_location(Location::new(lat, lng));
    builder.set_demand(demand);
    builder.set_priority(priority);
    builder.build()
}

pub fn munich_stops(specs: &[(f64, f64, u32)]) -> Vec<Stop> {
    specs
        .iter()
        .enumerate()
        .map(|(index, &(lat, lng, demand))| {
            stop(
                &format!("stop-{index}"),
                lat,
                lng,
                demand,
                Priority::DEFAULT,
            )
        })
        .collect()
}

pub fn problem_from_stops(stops: Vec<Stop>) -> RoutingProblem {
    let mut builder = RoutingProblemBuilder::default();
    builder.set_depot(munich_depot());
    builder.set_stops(stops);
    builder
        .build()
        .expect("test problem should always be valid")
}

pub fn munich_problem(specs: &[(f64, f64, u32)]) -> RoutingProblem {
    problem_from_stops(munich_stops(specs))
}

pub fn munich_problem_with_constraints(
    specs: &[(f64, f64, u32)],
    max_demand: u32,
    max_stops: usize,
) -> RoutingProblem {
    let mut builder = RoutingProblemBuilder::default();
    builder.set_depot(munich_depot());
    builder.set_stops(munich_stops(specs));
    builder.set_constraints(VehicleConstraints::new(
        max_demand,
        max_stops,
        SignedDuration::from_hours(8),
    ));
    builder
        .build()
        .expect("test problem should always be valid")
}

/// A ring of `count` stops around the depot, all with the given demand.
pub fn ring_problem(count: usize, demand: u32) -> RoutingProblem {
    let specs: Vec<(f64, f64, u32)> = (0..count)
        .map(|i| {
            let angle = (i as f64 / count as f64) * std::f64::consts::TAU;
            (
                48.1375 + 0.05 * angle.sin(),
                11.5755 + 0.07 * angle.cos(),
                demand,
            )
        })
        .collect();

    munich_problem(&specs)
}
