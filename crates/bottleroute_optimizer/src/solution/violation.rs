use jiff::SignedDuration;
use serde::Serialize;
use smallvec::SmallVec;

use crate::problem::routing_problem::RoutingProblem;

use super::{solution::Solution, tour::Tour};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum ViolationKind {
    CapacityExceeded,
    MaxStopsExceeded,
    MaxDurationExceeded,
    TimeWindowViolated,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// A soft-constraint breach. Purely descriptive: violations never prevent a
/// solution from existing, they feed fitness/energy penalties and reports.
#[derive(Clone, Debug, Serialize)]
pub struct ConstraintViolation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub tour_id: usize,
    pub observed: f64,
    pub limit: f64,
}

pub type TourViolations = SmallVec<[ConstraintViolation; 4]>;

/// Severity ladders with the relative overshoot.
fn severity_for(observed: f64, limit: f64) -> Severity {
    if limit <= 0.0 {
        return Severity::Critical;
    }

    let ratio = observed / limit;
    if ratio <= 1.1 {
        Severity::Warning
    } else if ratio <= 1.5 {
        Severity::Error
    } else {
        Severity::Critical
    }
}

pub fn check_tour(problem: &RoutingProblem, tour: &Tour) -> TourViolations {
    let constraints = problem.constraints();
    let mut violations = TourViolations::new();

    if tour.load() > constraints.max_demand() {
        violations.push(ConstraintViolation {
            kind: ViolationKind::CapacityExceeded,
            severity: severity_for(tour.load() as f64, constraints.max_demand() as f64),
            tour_id: tour.id().get(),
            observed: tour.load() as f64,
            limit: constraints.max_demand() as f64,
        });
    }

    if tour.len() > constraints.max_stops() {
        violations.push(ConstraintViolation {
            kind: ViolationKind::MaxStopsExceeded,
            severity: severity_for(tour.len() as f64, constraints.max_stops() as f64),
            tour_id: tour.id().get(),
            observed: tour.len() as f64,
            limit: constraints.max_stops() as f64,
        });
    }

    let max_duration_mins = constraints.max_duration().as_secs_f64() / 60.0;
    if tour.duration_mins() > max_duration_mins {
        violations.push(ConstraintViolation {
            kind: ViolationKind::MaxDurationExceeded,
            severity: severity_for(tour.duration_mins(), max_duration_mins),
            tour_id: tour.id().get(),
            observed: tour.duration_mins(),
            limit: max_duration_mins,
        });
    }

    check_time_windows(problem, tour, &mut violations);

    violations
}

/// Walks the tour accumulating arrival offsets from route start; waiting for
/// a window to open is allowed, arriving after it closes is a violation.
fn check_time_windows(problem: &RoutingProblem, tour: &Tour, violations: &mut TourViolations) {
    if !problem.has_time_windows() || tour.is_empty() {
        return;
    }

    let mut clock = SignedDuration::ZERO;
    let mut previous = None;

    for &stop_id in tour.stops() {
        clock += match previous {
            None => problem.depot_travel_duration(stop_id),
            Some(previous) => problem.travel_duration(previous, stop_id),
        };

        let stop = problem.stop(stop_id);
        if let Some(window) = stop.time_window() {
            if !window.is_satisfied(clock) {
                violations.push(ConstraintViolation {
                    kind: ViolationKind::TimeWindowViolated,
                    severity: severity_for(
                        clock.as_secs_f64(),
                        window.end().as_secs_f64().max(1.0),
                    ),
                    tour_id: tour.id().get(),
                    observed: clock.as_secs_f64() / 60.0,
                    limit: window.end().as_secs_f64() / 60.0,
                });
            } else if clock < window.start() {
                clock = window.start();
            }
        }

        clock += stop.service_duration();
        previous = Some(stop_id);
    }
}

pub fn check_solution(problem: &RoutingProblem, solution: &Solution) -> Vec<ConstraintViolation> {
    solution
        .tours()
        .iter()
        .flat_map(|tour| check_tour(problem, tour))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        problem::{stop::StopIdx, time_window::TimeWindow},
        solution::tour::TourId,
        test_utils,
    };

    #[test]
    fn test_capacity_violation_detected() {
        let problem = test_utils::munich_problem(&[(48.20, 11.60, 50), (48.25, 11.65, 40)]);
        let tour = Tour::new(
            TourId::new(0),
            vec![StopIdx::new(0), StopIdx::new(1)],
            &problem,
        );

        let violations = check_tour(&problem, &tour);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CapacityExceeded);
        assert_eq!(violations[0].observed, 90.0);
        assert_eq!(violations[0].limit, 80.0);
        assert_eq!(violations[0].severity, Severity::Error);
    }

    #[test]
    fn test_feasible_tour_has_no_violations() {
        let problem = test_utils::munich_problem(&[(48.20, 11.60, 10), (48.25, 11.65, 10)]);
        let tour = Tour::new(
            TourId::new(0),
            vec![StopIdx::new(0), StopIdx::new(1)],
            &problem,
        );

        assert!(check_tour(&problem, &tour).is_empty());
    }

    #[test]
    fn test_time_window_violation() {
        let mut stops = test_utils::munich_stops(&[(48.90, 12.40, 10)]);
        // Window closes long before the ~1.5h drive is over
        let mut builder = crate::problem::stop::StopBuilder::default();
        builder.set_external_id("tw-1");
        builder.set_location(*stops[0].location());
        builder.set_demand(10);
        builder.set_time_window(TimeWindow::from_minutes(0, 10).unwrap());
        stops[0] = builder.build();

        let problem = test_utils::problem_from_stops(stops);
        let tour = Tour::new(TourId::new(0), vec![StopIdx::new(0)], &problem);

        let violations = check_tour(&problem, &tour);
        assert!(
            violations
                .iter()
                .any(|violation| violation.kind == ViolationKind::TimeWindowViolated)
        );
    }

    #[test]
    fn test_severity_ladder() {
        assert_eq!(severity_for(81.0, 80.0), Severity::Warning);
        assert_eq!(severity_for(100.0, 80.0), Severity::Error);
        assert_eq!(severity_for(150.0, 80.0), Severity::Critical);
    }
}
