//! Capacitated tour planning for bottled-water delivery.
//!
//! Takes a depot, a set of delivery stops (bottles, priorities, optional
//! time windows) and a vehicle profile, and partitions the stops into
//! depot-to-depot tours. Three engines share one solution model:
//!
//! - a greedy multi-criteria constructor for small inputs and seeding,
//! - a genetic algorithm over tour assignments,
//! - simulated annealing over neighborhood moves.
//!
//! [`orchestrator::Orchestrator`] is the front door: it validates the
//! request, picks an engine, and reports tours with violations, refill
//! suggestions and recommendations. Capacity, stop-count and duration
//! limits are soft everywhere inside the search; breaches are priced into
//! fitness/energy and surfaced as [`solution::violation::ConstraintViolation`]s.

pub mod error;
pub mod orchestrator;
pub mod problem;
pub mod solution;
pub mod solver;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
