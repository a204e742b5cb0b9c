use fxhash::FxHashSet;
use jiff::Timestamp;
use tracing::debug;

use crate::{
    problem::{routing_problem::RoutingProblem, stop::StopIdx},
    solution::{
        solution::Solution,
        tour::{Tour, TourId},
        violation,
    },
};

use super::result::{
    AlgorithmKind, AlgorithmResult, ConvergencePoint, SummaryMetrics, TerminationReason,
    efficiency_percent, feasibility_percent,
};

/// Extra pull towards high-priority stops when seeding a tour.
const SEED_PRIORITY_WEIGHT: f64 = 10.0;
/// Distance discount per priority weight point when extending a tour.
const EXTEND_PRIORITY_BONUS_KM: f64 = 2.0;
/// Bottle-efficiency tie-break: bigger drops are cheaper per kilometre.
const EFFICIENCY_PER_BOTTLE: f64 = 0.125;
const EFFICIENCY_WEIGHT: f64 = 0.15;

/// Multi-criteria nearest-neighbor construction. Opens a tour at the most
/// attractive unrouted stop, then extends it with the cheapest feasible stop
/// until capacity or the stop limit is reached. Tours it produces are always
/// within `max_demand` and `max_stops`.
pub struct GreedyConstructor;

impl GreedyConstructor {
    pub fn construct(problem: &RoutingProblem) -> Solution {
        let mut pool: FxHashSet<StopIdx> = problem.stop_ids().collect();
        let mut tours = Vec::new();
        let mut unassigned = Vec::new();

        while !pool.is_empty() {
            let mut tour = Tour::empty(TourId::new(tours.len()));

            let Some(seed) = Self::pick_seed(problem, &pool, &tour) else {
                // Nothing fits even in an empty tour (e.g. max_stops of 0)
                unassigned.extend(pool.drain());
                break;
            };
            pool.remove(&seed);
            tour.push(problem, seed);

            let mut current = seed;
            while let Some(next) = Self::pick_next(problem, &pool, &tour, current) {
                pool.remove(&next);
                tour.push(problem, next);
                current = next;
            }

            tours.push(tour);
        }

        unassigned.sort_unstable();
        debug!(
            tours = tours.len(),
            unassigned = unassigned.len(),
            "greedy construction finished"
        );

        Solution::new(tours, unassigned)
    }

    /// Construction wrapped into a full result, for when greedy is the
    /// selected algorithm rather than just a seeding step.
    pub fn optimize(problem: &RoutingProblem) -> AlgorithmResult {
        let started = Timestamp::now();
        let solution = Self::construct(problem);
        let violations = violation::check_solution(problem, &solution);

        let score = solution.total_distance_km();
        let convergence = vec![ConvergencePoint {
            iteration: 0,
            best: score,
            average: score,
        }];

        AlgorithmResult {
            algorithm: AlgorithmKind::Greedy,
            metrics: SummaryMetrics {
                score,
                improvement_percent: 0.0,
                efficiency: efficiency_percent(problem, &solution),
                feasibility: feasibility_percent(problem, &solution, &violations),
                diversity: 0.0,
                stability: 100.0,
            },
            solution,
            violations,
            convergence,
            execution_time: Timestamp::now().duration_since(started),
            iterations: 1,
            termination: TerminationReason::Converged,
        }
    }

    /// Seed score: priority pull minus the cost of driving out there.
    fn pick_seed(
        problem: &RoutingProblem,
        pool: &FxHashSet<StopIdx>,
        tour: &Tour,
    ) -> Option<StopIdx> {
        pool.iter()
            .filter(|&&stop| tour.can_accept(problem, stop))
            .map(|&stop| {
                let score = problem.stop(stop).priority().weight() * SEED_PRIORITY_WEIGHT
                    - problem.depot_distance_km(stop);
                (stop, score)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(stop, _)| stop)
    }

    /// Extension score: distance from the current stop, discounted for
    /// priority and for demand (dropping many bottles in one drive is cheap
    /// per bottle).
    fn pick_next(
        problem: &RoutingProblem,
        pool: &FxHashSet<StopIdx>,
        tour: &Tour,
        current: StopIdx,
    ) -> Option<StopIdx> {
        pool.iter()
            .filter(|&&stop| tour.can_accept(problem, stop))
            .map(|&stop| {
                let candidate = problem.stop(stop);
                let efficiency_malus =
                    (10.0 - candidate.demand() as f64 * EFFICIENCY_PER_BOTTLE).max(0.0);
                let score = problem.distance_km(current, stop)
                    - candidate.priority().weight() * EXTEND_PRIORITY_BONUS_KM
                    + efficiency_malus * EFFICIENCY_WEIGHT;
                (stop, score)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(stop, _)| stop)
    }
}
