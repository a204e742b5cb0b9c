use rand::Rng;
use serde::Serialize;

use crate::{
    problem::routing_problem::RoutingProblem,
    solution::solution::Solution,
};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum NeighborhoodMove {
    SwapWithinTour,
    ReinsertWithinTour,
    ReverseSegment,
    RelocateBetweenTours,
    ExchangeBetweenTours,
    /// Moves a block of 2-3 consecutive stops to another position in the
    /// same tour.
    OrOptBlock,
}

const ALL_MOVES: [NeighborhoodMove; 6] = [
    NeighborhoodMove::SwapWithinTour,
    NeighborhoodMove::ReinsertWithinTour,
    NeighborhoodMove::ReverseSegment,
    NeighborhoodMove::RelocateBetweenTours,
    NeighborhoodMove::ExchangeBetweenTours,
    NeighborhoodMove::OrOptBlock,
];

impl NeighborhoodMove {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        ALL_MOVES[rng.random_range(0..ALL_MOVES.len())]
    }

    /// Mutates the solution in place. Returns false when the move found no
    /// feasible application (too few tours, capacity would break, ...), in
    /// which case the solution is untouched.
    pub fn apply<R: Rng>(
        self,
        problem: &RoutingProblem,
        solution: &mut Solution,
        rng: &mut R,
    ) -> bool {
        match self {
            NeighborhoodMove::SwapWithinTour => swap_within(problem, solution, rng),
            NeighborhoodMove::ReinsertWithinTour => reinsert_within(problem, solution, rng),
            NeighborhoodMove::ReverseSegment => reverse_segment(problem, solution, rng),
            NeighborhoodMove::RelocateBetweenTours => relocate(problem, solution, rng),
            NeighborhoodMove::ExchangeBetweenTours => exchange(problem, solution, rng),
            NeighborhoodMove::OrOptBlock => or_opt(problem, solution, rng),
        }
    }
}

fn pick_tour<R: Rng>(solution: &Solution, min_len: usize, rng: &mut R) -> Option<usize> {
    let candidates: Vec<usize> = solution
        .tours()
        .iter()
        .enumerate()
        .filter(|(_, tour)| tour.len() >= min_len)
        .map(|(index, _)| index)
        .collect();

    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

fn swap_within<R: Rng>(problem: &RoutingProblem, solution: &mut Solution, rng: &mut R) -> bool {
    let Some(index) = pick_tour(solution, 2, rng) else {
        return false;
    };
    let tour = &mut solution.tours_mut()[index];
    let len = tour.len();

    let i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len - 1);
    if j >= i {
        j += 1;
    }

    tour.stops_mut().swap(i, j);
    tour.recompute(problem);
    true
}

fn reinsert_within<R: Rng>(problem: &RoutingProblem, solution: &mut Solution, rng: &mut R) -> bool {
    let Some(index) = pick_tour(solution, 2, rng) else {
        return false;
    };
    let tour = &mut solution.tours_mut()[index];
    let len = tour.len();

    let from = rng.random_range(0..len);
    let to = rng.random_range(0..len);
    if from == to {
        return false;
    }

    let stop = tour.stops_mut().remove(from);
    tour.stops_mut().insert(to, stop);
    tour.recompute(problem);
    true
}

fn reverse_segment<R: Rng>(problem: &RoutingProblem, solution: &mut Solution, rng: &mut R) -> bool {
    let Some(index) = pick_tour(solution, 3, rng) else {
        return false;
    };
    let tour = &mut solution.tours_mut()[index];
    let len = tour.len();

    let a = rng.random_range(0..len);
    let b = rng.random_range(0..len);
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        return false;
    }

    tour.stops_mut()[start..=end].reverse();
    tour.recompute(problem);
    true
}

/// Moves one stop into another tour, provided the target can take it.
fn relocate<R: Rng>(problem: &RoutingProblem, solution: &mut Solution, rng: &mut R) -> bool {
    if solution.tours().len() < 2 {
        return false;
    }

    let Some(source) = pick_tour(solution, 1, rng) else {
        return false;
    };
    let mut target = rng.random_range(0..solution.tours().len() - 1);
    if target >= source {
        target += 1;
    }

    let position = rng.random_range(0..solution.tours()[source].len());
    let stop = solution.tours()[source].stops()[position];

    if !solution.tours()[target].can_accept(problem, stop) {
        return false;
    }

    solution.tours_mut()[source].stops_mut().remove(position);
    let slot = rng.random_range(0..=solution.tours()[target].len());
    solution.tours_mut()[target].stops_mut().insert(slot, stop);

    solution.tours_mut()[source].recompute(problem);
    solution.tours_mut()[target].recompute(problem);
    true
}

/// Swaps one stop between two tours when both stay within capacity.
fn exchange<R: Rng>(problem: &RoutingProblem, solution: &mut Solution, rng: &mut R) -> bool {
    if solution.tours().len() < 2 {
        return false;
    }

    let Some(first) = pick_tour(solution, 1, rng) else {
        return false;
    };
    let mut second = rng.random_range(0..solution.tours().len() - 1);
    if second >= first {
        second += 1;
    }
    if solution.tours()[second].is_empty() {
        return false;
    }

    let position_a = rng.random_range(0..solution.tours()[first].len());
    let position_b = rng.random_range(0..solution.tours()[second].len());
    let stop_a = solution.tours()[first].stops()[position_a];
    let stop_b = solution.tours()[second].stops()[position_b];

    let demand_a = problem.stop(stop_a).demand();
    let demand_b = problem.stop(stop_b).demand();
    let max_demand = problem.constraints().max_demand();

    let load_first = solution.tours()[first].load() - demand_a + demand_b;
    let load_second = solution.tours()[second].load() - demand_b + demand_a;
    if load_first > max_demand || load_second > max_demand {
        return false;
    }

    solution.tours_mut()[first].stops_mut()[position_a] = stop_b;
    solution.tours_mut()[second].stops_mut()[position_b] = stop_a;

    solution.tours_mut()[first].recompute(problem);
    solution.tours_mut()[second].recompute(problem);
    true
}

fn or_opt<R: Rng>(problem: &RoutingProblem, solution: &mut Solution, rng: &mut R) -> bool {
    let Some(index) = pick_tour(solution, 3, rng) else {
        return false;
    };
    let tour = &mut solution.tours_mut()[index];
    let len = tour.len();

    let block = rng.random_range(2..=3.min(len - 1));
    let start = rng.random_range(0..=len - block);
    let segment: Vec<_> = tour.stops_mut().drain(start..start + block).collect();

    let slot = rng.random_range(0..=tour.len());
    if slot == start {
        // Same place, restore and report a no-op
        for (offset, stop) in segment.into_iter().enumerate() {
            tour.stops_mut().insert(start + offset, stop);
        }
        return false;
    }

    for (offset, stop) in segment.into_iter().enumerate() {
        tour.stops_mut().insert(slot + offset, stop);
    }
    tour.recompute(problem);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::{solver::greedy::GreedyConstructor, test_utils};

    #[test]
    fn test_moves_preserve_partition_and_capacity() {
        let problem = test_utils::ring_problem(20, 15);
        let mut rng = SmallRng::seed_from_u64(31);
        let mut solution = GreedyConstructor::construct(&problem);

        for iteration in 0..500 {
            let candidate = NeighborhoodMove::random(&mut rng);
            candidate.apply(&problem, &mut solution, &mut rng);

            assert!(
                solution.is_partition(&problem),
                "partition broken at iteration {iteration} by {candidate:?}"
            );
            for tour in solution.tours() {
                assert!(
                    tour.load() <= problem.constraints().max_demand(),
                    "capacity broken at iteration {iteration} by {candidate:?}"
                );
            }
        }
    }

    #[test]
    fn test_relocate_refuses_overload() {
        // Two full tours, nothing can move between them
        let problem = test_utils::munich_problem(&[(48.15, 11.58, 80), (48.30, 11.70, 80)]);
        let mut rng = SmallRng::seed_from_u64(37);
        let mut solution = GreedyConstructor::construct(&problem);
        assert_eq!(solution.num_tours(), 2);

        for _ in 0..50 {
            assert!(!relocate(&problem, &mut solution, &mut rng));
        }
    }

    #[test]
    fn test_single_tour_cross_moves_are_noops() {
        let problem = test_utils::munich_problem(&[(48.15, 11.58, 10), (48.16, 11.60, 10)]);
        let mut rng = SmallRng::seed_from_u64(41);
        let mut solution = GreedyConstructor::construct(&problem);
        assert_eq!(solution.num_tours(), 1);

        assert!(!relocate(&problem, &mut solution, &mut rng));
        assert!(!exchange(&problem, &mut solution, &mut rng));
    }
}
