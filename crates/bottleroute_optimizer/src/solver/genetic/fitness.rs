use crate::problem::routing_problem::RoutingProblem;

use super::chromosome::Chromosome;

/// The fitness model works on a deliberately coarse time estimate (flat
/// 30 km/h plus a fixed per-stop service charge) rather than the bucketed
/// matrix durations; it only has to rank candidates consistently.
const FITNESS_SPEED_KMH: f64 = 30.0;
const FITNESS_SERVICE_MINS: f64 = 5.0;

const CAPACITY_PENALTY_PER_BOTTLE: f64 = 10.0;
const STOP_PENALTY_PER_STOP: f64 = 5.0;
const DURATION_PENALTY_PER_MIN: f64 = 2.0;
const PENALTY_WEIGHT: f64 = 100.0;

const DISTANCE_BASELINE: f64 = 1000.0;
const TIME_BASELINE: f64 = 500.0;

/// Scores the chromosome in place: per-gene fitness, violation count and the
/// aggregate fitness (higher is better, floored at zero).
pub fn evaluate(problem: &RoutingProblem, chromosome: &mut Chromosome) {
    let constraints = problem.constraints();
    let max_duration_mins = constraints.max_duration().as_secs_f64() / 60.0;

    let mut total_distance = 0.0;
    let mut total_time_mins = 0.0;
    let mut priority_bonus = 0.0;
    let mut penalty = 0.0;
    let mut violations = 0u32;

    for gene in &mut chromosome.genes {
        let distance = gene_distance(problem, &gene.stops);
        let time_mins =
            distance / FITNESS_SPEED_KMH * 60.0 + gene.stops.len() as f64 * FITNESS_SERVICE_MINS;

        let mut load = 0u32;
        for &stop in &gene.stops {
            let stop = problem.stop(stop);
            load += stop.demand();
            priority_bonus += stop.priority().weight() * stop.demand() as f64;
        }

        let mut gene_penalty = 0.0;
        if load > constraints.max_demand() {
            gene_penalty +=
                (load - constraints.max_demand()) as f64 * CAPACITY_PENALTY_PER_BOTTLE;
            violations += 1;
        }
        if gene.stops.len() > constraints.max_stops() {
            gene_penalty +=
                (gene.stops.len() - constraints.max_stops()) as f64 * STOP_PENALTY_PER_STOP;
            violations += 1;
        }
        if time_mins > max_duration_mins {
            gene_penalty += (time_mins - max_duration_mins) * DURATION_PENALTY_PER_MIN;
            violations += 1;
        }

        gene.fitness = (DISTANCE_BASELINE - distance - gene_penalty).max(0.0);

        total_distance += distance;
        total_time_mins += time_mins;
        penalty += gene_penalty;
    }

    let gene_count = chromosome.genes.len().max(1) as f64;
    let fitness = (DISTANCE_BASELINE - total_distance)
        + (TIME_BASELINE - total_time_mins / 10.0)
        + priority_bonus / gene_count
        - PENALTY_WEIGHT * penalty;

    chromosome.fitness = fitness.max(0.0);
    chromosome.violations = violations;
}

fn gene_distance(problem: &RoutingProblem, stops: &[crate::problem::stop::StopIdx]) -> f64 {
    let Some((&first, rest)) = stops.split_first() else {
        return 0.0;
    };
    let last = *stops.last().unwrap();

    let mut distance = problem.depot_distance_km(first);
    let mut previous = first;
    for &stop in rest {
        distance += problem.distance_km(previous, stop);
        previous = stop;
    }
    distance + problem.depot_distance_km(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        problem::stop::StopIdx,
        solver::greedy::GreedyConstructor,
        test_utils,
    };

    #[test]
    fn test_feasible_beats_overloaded() {
        let problem = test_utils::munich_problem(&[(48.15, 11.58, 50), (48.16, 11.60, 50)]);

        // Same stops, one packs both into a single overloaded tour
        let mut split = super::super::chromosome::Chromosome::from_tours(vec![
            vec![StopIdx::new(0)],
            vec![StopIdx::new(1)],
        ]);
        let mut packed = super::super::chromosome::Chromosome::from_tours(vec![vec![
            StopIdx::new(0),
            StopIdx::new(1),
        ]]);

        evaluate(&problem, &mut split);
        evaluate(&problem, &mut packed);

        assert_eq!(split.violations, 0);
        assert_eq!(packed.violations, 1);
        assert!(split.fitness > packed.fitness);
    }

    #[test]
    fn test_fitness_floored_at_zero() {
        // 120 bottles in one 80-bottle tour: 40 over, penalty dwarfs the
        // baselines, fitness clamps to zero instead of going negative
        let problem = test_utils::munich_problem(&[
            (48.15, 11.58, 40),
            (48.16, 11.60, 40),
            (48.17, 11.62, 40),
        ]);
        let mut chromosome = super::super::chromosome::Chromosome::from_tours(vec![vec![
            StopIdx::new(0),
            StopIdx::new(1),
            StopIdx::new(2),
        ]]);

        evaluate(&problem, &mut chromosome);

        assert_eq!(chromosome.fitness, 0.0);
        assert_eq!(chromosome.violations, 1);
    }

    #[test]
    fn test_shorter_tour_scores_higher() {
        // One near stop vs one far stop, otherwise identical
        let problem = test_utils::munich_problem(&[(48.14, 11.58, 10), (48.60, 12.20, 10)]);

        let mut near =
            super::super::chromosome::Chromosome::from_tours(vec![vec![StopIdx::new(0)]]);
        let mut far =
            super::super::chromosome::Chromosome::from_tours(vec![vec![StopIdx::new(1)]]);

        evaluate(&problem, &mut near);
        evaluate(&problem, &mut far);

        assert!(near.fitness > far.fitness);
    }

    #[test]
    fn test_greedy_solution_is_violation_free() {
        let problem = test_utils::ring_problem(8, 10);
        let mut chromosome = super::super::chromosome::Chromosome::from_solution(
            &GreedyConstructor::construct(&problem),
        );

        evaluate(&problem, &mut chromosome);

        assert_eq!(chromosome.violations, 0);
        assert!(chromosome.fitness > 0.0);
    }
}
