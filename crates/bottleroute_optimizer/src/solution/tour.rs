use jiff::SignedDuration;
use serde::Serialize;

use crate::{define_index_newtype, problem::routing_problem::RoutingProblem, problem::stop::StopIdx};

define_index_newtype!(TourId, Tour);

/// One depot-to-depot trip: an ordered stop sequence plus derived metrics.
///
/// Metrics are recomputed from scratch after every structural mutation;
/// neighborhood operators rely on that instead of incremental deltas.
#[derive(Clone, Debug, Serialize)]
pub struct Tour {
    id: TourId,
    stops: Vec<StopIdx>,
    load: u32,
    distance_km: f64,
    duration: SignedDuration,
}

impl Tour {
    pub fn new(id: TourId, stops: Vec<StopIdx>, problem: &RoutingProblem) -> Self {
        let mut tour = Tour {
            id,
            stops,
            load: 0,
            distance_km: 0.0,
            duration: SignedDuration::ZERO,
        };
        tour.recompute(problem);
        tour
    }

    pub fn empty(id: TourId) -> Self {
        Tour {
            id,
            stops: Vec::new(),
            load: 0,
            distance_km: 0.0,
            duration: SignedDuration::ZERO,
        }
    }

    pub fn id(&self) -> TourId {
        self.id
    }

    pub fn set_id(&mut self, id: TourId) {
        self.id = id;
    }

    pub fn stops(&self) -> &[StopIdx] {
        &self.stops
    }

    pub fn stops_mut(&mut self) -> &mut Vec<StopIdx> {
        &mut self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn load(&self) -> u32 {
        self.load
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn duration_mins(&self) -> f64 {
        self.duration.as_secs_f64() / 60.0
    }

    /// Depot → stops → depot distance, total load and door-to-door duration
    /// (bucketed-speed travel plus per-stop service time).
    pub fn recompute(&mut self, problem: &RoutingProblem) {
        self.load = self
            .stops
            .iter()
            .map(|&stop| problem.stop(stop).demand())
            .sum();

        if self.stops.is_empty() {
            self.distance_km = 0.0;
            self.duration = SignedDuration::ZERO;
            return;
        }

        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];

        let mut distance = problem.depot_distance_km(first);
        let mut duration = problem.depot_travel_duration(first);

        for window in self.stops.windows(2) {
            distance += problem.distance_km(window[0], window[1]);
            duration += problem.travel_duration(window[0], window[1]);
        }

        distance += problem.depot_distance_km(last);
        duration += problem.depot_travel_duration(last);

        for &stop in &self.stops {
            duration += problem.stop(stop).service_duration();
        }

        self.distance_km = distance;
        self.duration = duration;
    }

    /// Would appending `stop` keep the tour within capacity and stop count?
    pub fn can_accept(&self, problem: &RoutingProblem, stop: StopIdx) -> bool {
        let constraints = problem.constraints();
        self.stops.len() < constraints.max_stops()
            && self.load + problem.stop(stop).demand() <= constraints.max_demand()
    }

    pub fn push(&mut self, problem: &RoutingProblem, stop: StopIdx) {
        self.stops.push(stop);
        self.recompute(problem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_recompute_closes_back_to_depot() {
        let problem = test_utils::munich_problem(&[(48.20, 11.60, 10), (48.25, 11.65, 10)]);
        let tour = Tour::new(
            TourId::new(0),
            vec![StopIdx::new(0), StopIdx::new(1)],
            &problem,
        );

        let out = problem.depot_distance_km(StopIdx::new(0));
        let middle = problem.distance_km(StopIdx::new(0), StopIdx::new(1));
        let back = problem.depot_distance_km(StopIdx::new(1));

        assert!((tour.distance_km() - (out + middle + back)).abs() < 1e-9);
        assert_eq!(tour.load(), 20);
    }

    #[test]
    fn test_duration_includes_service_time() {
        let problem = test_utils::munich_problem(&[(48.20, 11.60, 10)]);
        let tour = Tour::new(TourId::new(0), vec![StopIdx::new(0)], &problem);

        let travel = problem.depot_travel_duration(StopIdx::new(0)) * 2;
        let service = problem.stop(StopIdx::new(0)).service_duration();

        assert_eq!(tour.duration(), travel + service);
    }

    #[test]
    fn test_can_accept_respects_capacity() {
        let problem = test_utils::munich_problem(&[(48.20, 11.60, 50), (48.25, 11.65, 50)]);
        let mut tour = Tour::empty(TourId::new(0));
        tour.push(&problem, StopIdx::new(0));

        // 50 + 50 > 80
        assert!(!tour.can_accept(&problem, StopIdx::new(1)));
    }
}
