use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::problem::{routing_problem::RoutingProblem, stop::StopIdx};

use super::chromosome::Chromosome;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MutationKind {
    Swap,
    Insert,
    Inversion,
    /// Applies the best improving segment reversal, judged by the actual
    /// distance delta of the affected edges. No-op when nothing improves.
    TwoOpt,
}

pub fn mutate<R: Rng>(
    kind: MutationKind,
    chromosome: &mut Chromosome,
    problem: &RoutingProblem,
    rng: &mut R,
) {
    let Some(gene_index) = pick_mutable_gene(chromosome, rng) else {
        return;
    };
    let stops = &mut chromosome.genes[gene_index].stops;

    match kind {
        MutationKind::Swap => {
            let (i, j) = two_distinct(stops.len(), rng);
            stops.swap(i, j);
        }
        MutationKind::Insert => {
            let (from, to) = two_distinct(stops.len(), rng);
            let stop = stops.remove(from);
            stops.insert(to, stop);
        }
        MutationKind::Inversion => {
            let (i, j) = two_distinct(stops.len(), rng);
            stops[i..=j].reverse();
        }
        MutationKind::TwoOpt => two_opt(problem, stops),
    }
}

/// Genes with fewer than two stops have nothing to rearrange.
fn pick_mutable_gene<R: Rng>(chromosome: &Chromosome, rng: &mut R) -> Option<usize> {
    let mutable: Vec<usize> = chromosome
        .genes
        .iter()
        .enumerate()
        .filter(|(_, gene)| gene.stops.len() >= 2)
        .map(|(index, _)| index)
        .collect();

    if mutable.is_empty() {
        None
    } else {
        Some(mutable[rng.random_range(0..mutable.len())])
    }
}

/// Two distinct positions, ordered.
fn two_distinct<R: Rng>(len: usize, rng: &mut R) -> (usize, usize) {
    let i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len - 1);
    if j >= i {
        j += 1;
    }
    (i.min(j), i.max(j))
}

/// Distance change of reversing `stops[i..=j]`, depot edges included.
fn reversal_delta(problem: &RoutingProblem, stops: &[StopIdx], i: usize, j: usize) -> f64 {
    let old_in = if i == 0 {
        problem.depot_distance_km(stops[i])
    } else {
        problem.distance_km(stops[i - 1], stops[i])
    };
    let old_out = if j == stops.len() - 1 {
        problem.depot_distance_km(stops[j])
    } else {
        problem.distance_km(stops[j], stops[j + 1])
    };

    let new_in = if i == 0 {
        problem.depot_distance_km(stops[j])
    } else {
        problem.distance_km(stops[i - 1], stops[j])
    };
    let new_out = if j == stops.len() - 1 {
        problem.depot_distance_km(stops[i])
    } else {
        problem.distance_km(stops[i], stops[j + 1])
    };

    (new_in + new_out) - (old_in + old_out)
}

fn two_opt(problem: &RoutingProblem, stops: &mut [StopIdx]) {
    let len = stops.len();
    if len < 2 {
        return;
    }

    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..len - 1 {
        for j in i + 1..len {
            let delta = reversal_delta(problem, stops, i, j);
            if delta < -1e-9 && best.is_none_or(|(_, _, best_delta)| delta < best_delta) {
                best = Some((i, j, delta));
            }
        }
    }

    if let Some((i, j, _)) = best {
        stops[i..=j].reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::test_utils;

    fn tour_distance(problem: &RoutingProblem, stops: &[StopIdx]) -> f64 {
        let mut distance = problem.depot_distance_km(stops[0]);
        for window in stops.windows(2) {
            distance += problem.distance_km(window[0], window[1]);
        }
        distance + problem.depot_distance_km(stops[stops.len() - 1])
    }

    #[test]
    fn test_two_opt_never_lengthens() {
        let problem = test_utils::ring_problem(9, 5);
        let mut stops: Vec<StopIdx> = problem.stop_ids().collect();
        // Deliberately bad ordering: jump across the ring
        stops.swap(1, 5);
        stops.swap(2, 7);

        let before = tour_distance(&problem, &stops);
        two_opt(&problem, &mut stops);
        let after = tour_distance(&problem, &stops);

        assert!(after <= before + 1e-9);
    }

    #[test]
    fn test_two_opt_untangles_crossing() {
        let problem = test_utils::ring_problem(6, 5);
        // Ring order is near-optimal; scrambling must be repairable
        let mut scrambled: Vec<StopIdx> = problem.stop_ids().collect();
        scrambled.swap(0, 3);

        let before = tour_distance(&problem, &scrambled);
        two_opt(&problem, &mut scrambled);

        assert!(tour_distance(&problem, &scrambled) < before);
    }

    #[test]
    fn test_mutations_preserve_stop_set() {
        let problem = test_utils::ring_problem(10, 8);
        let mut rng = SmallRng::seed_from_u64(23);

        for kind in [
            MutationKind::Swap,
            MutationKind::Insert,
            MutationKind::Inversion,
            MutationKind::TwoOpt,
        ] {
            let mut chromosome = Chromosome::from_solution(
                &crate::solver::greedy::GreedyConstructor::construct(&problem),
            );
            let before = chromosome.num_stops();

            for _ in 0..20 {
                mutate(kind, &mut chromosome, &problem, &mut rng);
            }

            assert_eq!(chromosome.num_stops(), before, "{kind:?} changed stop count");
            assert!(
                chromosome.to_solution(&problem).is_partition(&problem),
                "{kind:?} broke the partition"
            );
        }
    }

    #[test]
    fn test_single_stop_gene_untouched() {
        let problem = test_utils::munich_problem(&[(48.15, 11.58, 10)]);
        let mut rng = SmallRng::seed_from_u64(29);
        let mut chromosome = Chromosome::from_tours(vec![vec![StopIdx::new(0)]]);

        mutate(MutationKind::Swap, &mut chromosome, &problem, &mut rng);

        assert_eq!(chromosome.genes[0].stops, vec![StopIdx::new(0)]);
    }
}
