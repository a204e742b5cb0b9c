use fxhash::FxHashSet;
use jiff::SignedDuration;
use serde::Serialize;

use crate::problem::{routing_problem::RoutingProblem, stop::StopIdx};

use super::tour::{Tour, TourId};

/// A set of tours over a stop pool. Stops the constructors could not place
/// anywhere end up in `unassigned` instead of being dropped.
#[derive(Clone, Debug, Serialize, Default)]
pub struct Solution {
    tours: Vec<Tour>,
    unassigned: Vec<StopIdx>,
}

impl Solution {
    pub fn new(tours: Vec<Tour>, unassigned: Vec<StopIdx>) -> Self {
        Solution { tours, unassigned }
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn tours_mut(&mut self) -> &mut Vec<Tour> {
        &mut self.tours
    }

    pub fn tour(&self, id: TourId) -> &Tour {
        &self.tours[id]
    }

    pub fn unassigned(&self) -> &[StopIdx] {
        &self.unassigned
    }

    pub fn num_tours(&self) -> usize {
        self.tours.iter().filter(|tour| !tour.is_empty()).count()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.tours.iter().map(Tour::distance_km).sum()
    }

    pub fn total_duration(&self) -> SignedDuration {
        self.tours.iter().map(Tour::duration).sum()
    }

    pub fn total_duration_mins(&self) -> f64 {
        self.total_duration().as_secs_f64() / 60.0
    }

    pub fn total_load(&self) -> u32 {
        self.tours.iter().map(Tour::load).sum()
    }

    pub fn assigned_count(&self) -> usize {
        self.tours.iter().map(Tour::len).sum()
    }

    pub fn recompute_all(&mut self, problem: &RoutingProblem) {
        for tour in &mut self.tours {
            tour.recompute(problem);
        }
    }

    /// Drops empty tours and renumbers the rest so tour ids stay dense.
    pub fn compact(&mut self) {
        self.tours.retain(|tour| !tour.is_empty());
        for (index, tour) in self.tours.iter_mut().enumerate() {
            tour.set_id(TourId::new(index));
        }
    }

    /// Every stop appears exactly once, either in a tour or in `unassigned`.
    pub fn is_partition(&self, problem: &RoutingProblem) -> bool {
        let mut seen = FxHashSet::default();
        for tour in &self.tours {
            for &stop in tour.stops() {
                if !seen.insert(stop) {
                    return false;
                }
            }
        }
        for &stop in &self.unassigned {
            if !seen.insert(stop) {
                return false;
            }
        }
        seen.len() == problem.num_stops()
    }
}
