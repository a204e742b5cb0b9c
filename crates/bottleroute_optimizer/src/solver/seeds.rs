//! Seed solutions for population-based search. Each constructor produces a
//! feasible-by-construction solution from a different angle so the initial
//! population starts spread out.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{
    problem::{routing_problem::RoutingProblem, stop::StopIdx},
    solution::{
        solution::Solution,
        tour::{Tour, TourId},
    },
};

use super::greedy::GreedyConstructor;

/// Splits a giant-tour ordering into tours, opening a new tour whenever
/// capacity or the stop limit would be breached.
pub fn split_giant_tour(problem: &RoutingProblem, order: &[StopIdx]) -> Solution {
    let mut tours = Vec::new();
    let mut unassigned = Vec::new();
    let mut current = Tour::empty(TourId::new(0));

    for &stop in order {
        if !current.can_accept(problem, stop) {
            if current.is_empty() {
                // Does not fit even in a fresh tour
                unassigned.push(stop);
                continue;
            }
            tours.push(current);
            current = Tour::empty(TourId::new(tours.len()));
            if !current.can_accept(problem, stop) {
                unassigned.push(stop);
                continue;
            }
        }
        current.push(problem, stop);
    }

    if !current.is_empty() {
        tours.push(current);
    }

    Solution::new(tours, unassigned)
}

/// Pure nearest-neighbor chains, ignoring priorities.
pub fn nearest_neighbor(problem: &RoutingProblem) -> Solution {
    let mut remaining: Vec<StopIdx> = problem.stop_ids().collect();
    let mut order = Vec::with_capacity(remaining.len());
    let mut current: Option<StopIdx> = None;

    while !remaining.is_empty() {
        let (position, _) = remaining
            .iter()
            .enumerate()
            .min_by(|&(_, &a), &(_, &b)| {
                let da = match current {
                    None => problem.depot_distance_km(a),
                    Some(from) => problem.distance_km(from, a),
                };
                let db = match current {
                    None => problem.depot_distance_km(b),
                    Some(from) => problem.distance_km(from, b),
                };
                da.total_cmp(&db)
            })
            .map(|(position, &stop)| (position, stop))
            .unwrap();

        let stop = remaining.swap_remove(position);
        current = Some(stop);
        order.push(stop);
    }

    split_giant_tour(problem, &order)
}

/// Classic farthest insertion on the giant tour: start from the stop
/// farthest from the depot, repeatedly insert the stop farthest from the
/// partial tour at its cheapest position.
pub fn farthest_insertion(problem: &RoutingProblem) -> Solution {
    let mut remaining: Vec<StopIdx> = problem.stop_ids().collect();
    if remaining.is_empty() {
        return Solution::default();
    }

    let first_position = remaining
        .iter()
        .enumerate()
        .max_by(|&(_, &a), &(_, &b)| {
            problem
                .depot_distance_km(a)
                .total_cmp(&problem.depot_distance_km(b))
        })
        .map(|(position, _)| position)
        .unwrap();
    let mut order = vec![remaining.swap_remove(first_position)];

    while !remaining.is_empty() {
        // Farthest from its nearest routed stop
        let (position, _) = remaining
            .iter()
            .enumerate()
            .map(|(position, &candidate)| {
                let nearest = order
                    .iter()
                    .map(|&routed| problem.distance_km(candidate, routed))
                    .fold(f64::INFINITY, f64::min);
                (position, nearest)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        let candidate = remaining.swap_remove(position);

        let best_slot = (0..=order.len())
            .min_by(|&a, &b| {
                insertion_cost(problem, &order, candidate, a)
                    .total_cmp(&insertion_cost(problem, &order, candidate, b))
            })
            .unwrap();
        order.insert(best_slot, candidate);
    }

    split_giant_tour(problem, &order)
}

fn insertion_cost(
    problem: &RoutingProblem,
    order: &[StopIdx],
    candidate: StopIdx,
    slot: usize,
) -> f64 {
    let before = if slot == 0 { None } else { Some(order[slot - 1]) };
    let after = order.get(slot).copied();

    let to_candidate = match before {
        None => problem.depot_distance_km(candidate),
        Some(before) => problem.distance_km(before, candidate),
    };
    let from_candidate = match after {
        None => problem.depot_distance_km(candidate),
        Some(after) => problem.distance_km(candidate, after),
    };
    let removed = match (before, after) {
        (Some(before), Some(after)) => problem.distance_km(before, after),
        (None, Some(after)) => problem.depot_distance_km(after),
        (Some(before), None) => problem.depot_distance_km(before),
        (None, None) => 0.0,
    };

    to_candidate + from_candidate - removed
}

/// Inserts every stop at the cheapest feasible position across all open
/// tours, opening a new tour when nothing fits.
pub fn cheapest_insertion(problem: &RoutingProblem) -> Solution {
    let mut tours: Vec<Tour> = Vec::new();
    let mut unassigned = Vec::new();

    // Far stops first so tours grow around the expensive anchors
    let mut stops: Vec<StopIdx> = problem.stop_ids().collect();
    stops.sort_by(|&a, &b| {
        problem
            .depot_distance_km(b)
            .total_cmp(&problem.depot_distance_km(a))
    });

    for stop in stops {
        let best = tours
            .iter()
            .enumerate()
            .filter(|(_, tour)| tour.can_accept(problem, stop))
            .flat_map(|(tour_index, tour)| {
                (0..=tour.len()).map(move |slot| {
                    (
                        tour_index,
                        slot,
                        insertion_cost(problem, tour.stops(), stop, slot),
                    )
                })
            })
            .min_by(|a, b| a.2.total_cmp(&b.2));

        match best {
            Some((tour_index, slot, _)) => {
                tours[tour_index].stops_mut().insert(slot, stop);
                tours[tour_index].recompute(problem);
            }
            None => {
                let mut tour = Tour::empty(TourId::new(tours.len()));
                if tour.can_accept(problem, stop) {
                    tour.push(problem, stop);
                    tours.push(tour);
                } else {
                    unassigned.push(stop);
                }
            }
        }
    }

    Solution::new(tours, unassigned)
}

/// Priority-first ordering (ties broken by demand, heaviest first) split
/// sequentially.
pub fn priority_sorted(problem: &RoutingProblem) -> Solution {
    let mut order: Vec<StopIdx> = problem.stop_ids().collect();
    order.sort_by(|&a, &b| {
        let sa = problem.stop(a);
        let sb = problem.stop(b);
        sa.priority()
            .level()
            .cmp(&sb.priority().level())
            .then(sb.demand().cmp(&sa.demand()))
    });

    split_giant_tour(problem, &order)
}

/// Uniformly random giant tour, split by capacity.
pub fn random_split<R: Rng>(problem: &RoutingProblem, rng: &mut R) -> Solution {
    let mut order: Vec<StopIdx> = problem.stop_ids().collect();
    order.shuffle(rng);
    split_giant_tour(problem, &order)
}

/// The full seed battery, greedy included.
pub fn seed_pool<R: Rng>(problem: &RoutingProblem, rng: &mut R, count: usize) -> Vec<Solution> {
    let mut seeds = vec![
        GreedyConstructor::construct(problem),
        nearest_neighbor(problem),
        farthest_insertion(problem),
        cheapest_insertion(problem),
        priority_sorted(problem),
    ];
    seeds.truncate(count);
    while seeds.len() < count {
        seeds.push(random_split(problem, rng));
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::test_utils;

    fn assert_feasible(problem: &RoutingProblem, solution: &Solution) {
        assert!(solution.is_partition(problem));
        for tour in solution.tours() {
            assert!(tour.load() <= problem.constraints().max_demand());
            assert!(tour.len() <= problem.constraints().max_stops());
        }
    }

    #[test]
    fn test_split_respects_capacity() {
        let problem = test_utils::ring_problem(12, 30);
        let order: Vec<StopIdx> = problem.stop_ids().collect();

        let solution = split_giant_tour(&problem, &order);

        assert_feasible(&problem, &solution);
        // 12 * 30 = 360 bottles at 80 per tour needs at least 5 tours
        assert!(solution.num_tours() >= 5);
    }

    #[test]
    fn test_all_seeds_feasible() {
        let problem = test_utils::ring_problem(25, 13);
        let mut rng = SmallRng::seed_from_u64(7);

        for solution in seed_pool(&problem, &mut rng, 10) {
            assert_feasible(&problem, &solution);
        }
    }

    #[test]
    fn test_priority_sorted_puts_urgent_first() {
        let mut stops = test_utils::munich_stops(&[(48.15, 11.58, 10), (48.16, 11.60, 10)]);
        stops.push(test_utils::stop(
            "urgent",
            48.30,
            11.80,
            10,
            crate::problem::stop::Priority::HIGHEST,
        ));
        let problem = test_utils::problem_from_stops(stops);

        let solution = priority_sorted(&problem);

        assert_eq!(solution.tours()[0].stops()[0], StopIdx::new(2));
    }

    #[test]
    fn test_nearest_neighbor_visits_everything() {
        let problem = test_utils::ring_problem(15, 5);
        let solution = nearest_neighbor(&problem);

        assert_eq!(solution.assigned_count(), 15);
        assert_feasible(&problem, &solution);
    }

    #[test]
    fn test_farthest_insertion_visits_everything() {
        let problem = test_utils::ring_problem(15, 5);
        let solution = farthest_insertion(&problem);

        assert_eq!(solution.assigned_count(), 15);
        assert_feasible(&problem, &solution);
    }
}
