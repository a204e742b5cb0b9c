use fxhash::{FxHashMap, FxHashSet};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    problem::{routing_problem::RoutingProblem, stop::StopIdx},
    solver::seeds::split_giant_tour,
};

use super::chromosome::Chromosome;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CrossoverKind {
    /// Order crossover (OX) on the flattened giant tour.
    Order,
    /// Partially mapped crossover (PMX) on the giant tour.
    Pmx,
    /// Per-tour coin flip with duplicate repair.
    Uniform,
}

/// Recombines two parents into two children. Order and PMX operate on the
/// giant tour and re-split under capacity, so their children are feasible by
/// construction; uniform repairs duplicates and omissions afterwards.
pub fn crossover<R: Rng>(
    kind: CrossoverKind,
    a: &Chromosome,
    b: &Chromosome,
    problem: &RoutingProblem,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    match kind {
        CrossoverKind::Order => {
            let giant_a = a.giant_tour();
            let giant_b = b.giant_tour();
            (
                resplit(problem, &order_crossover(&giant_a, &giant_b, rng)),
                resplit(problem, &order_crossover(&giant_b, &giant_a, rng)),
            )
        }
        CrossoverKind::Pmx => {
            let giant_a = a.giant_tour();
            let giant_b = b.giant_tour();
            (
                resplit(problem, &pmx_crossover(&giant_a, &giant_b, rng)),
                resplit(problem, &pmx_crossover(&giant_b, &giant_a, rng)),
            )
        }
        CrossoverKind::Uniform => (
            uniform_crossover(a, b, problem, rng),
            uniform_crossover(b, a, problem, rng),
        ),
    }
}

fn resplit(problem: &RoutingProblem, giant: &[StopIdx]) -> Chromosome {
    let solution = split_giant_tour(problem, giant);
    Chromosome::from_solution(&solution)
}

fn cut_points<R: Rng>(len: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..len);
    let b = rng.random_range(0..len);
    (a.min(b), a.max(b))
}

/// OX: keep `first[start..=end]` in place, fill the rest in the order the
/// stops appear in `second`, wrapping from just past the segment.
fn order_crossover<R: Rng>(first: &[StopIdx], second: &[StopIdx], rng: &mut R) -> Vec<StopIdx> {
    let len = first.len();
    if len < 2 {
        return first.to_vec();
    }

    let (start, end) = cut_points(len, rng);
    let segment: FxHashSet<StopIdx> = first[start..=end].iter().copied().collect();

    let mut child = vec![StopIdx::new(usize::MAX); len];
    child[start..=end].copy_from_slice(&first[start..=end]);

    let mut fill = (end + 1) % len;
    for offset in 0..len {
        let candidate = second[(end + 1 + offset) % len];
        if segment.contains(&candidate) {
            continue;
        }
        child[fill] = candidate;
        fill = (fill + 1) % len;
    }

    child
}

/// PMX: copy the segment from `first`, place the rest from `second`,
/// following the segment mapping chain for conflicts.
fn pmx_crossover<R: Rng>(first: &[StopIdx], second: &[StopIdx], rng: &mut R) -> Vec<StopIdx> {
    let len = first.len();
    if len < 2 {
        return first.to_vec();
    }

    let (start, end) = cut_points(len, rng);
    let mut child = vec![None; len];
    // first -> second within the segment
    let mut mapping: FxHashMap<StopIdx, StopIdx> = FxHashMap::default();

    for position in start..=end {
        child[position] = Some(first[position]);
        mapping.insert(first[position], second[position]);
    }

    for position in (0..start).chain(end + 1..len) {
        let mut candidate = second[position];
        let mut hops = 0;
        while mapping.contains_key(&candidate) {
            candidate = mapping[&candidate];
            hops += 1;
            if hops > len {
                break;
            }
        }
        child[position] = Some(candidate);
    }

    child.into_iter().map(|stop| stop.unwrap()).collect()
}

/// Coin-flips whole tours from either parent, then repairs: duplicate stops
/// keep their first occurrence, missing stops are appended wherever they
/// fit, opening new tours when they do not.
fn uniform_crossover<R: Rng>(
    a: &Chromosome,
    b: &Chromosome,
    problem: &RoutingProblem,
    rng: &mut R,
) -> Chromosome {
    let max_tours = a.genes.len().max(b.genes.len());
    let mut tours: Vec<Vec<StopIdx>> = Vec::with_capacity(max_tours);

    for index in 0..max_tours {
        let parent = if rng.random_bool(0.5) { a } else { b };
        if let Some(gene) = parent.genes.get(index) {
            tours.push(gene.stops.clone());
        }
    }

    // Repair pass
    let mut seen = FxHashSet::default();
    for tour in &mut tours {
        tour.retain(|&stop| seen.insert(stop));
    }
    tours.retain(|tour| !tour.is_empty());

    let missing: Vec<StopIdx> = problem
        .stop_ids()
        .filter(|stop| !seen.contains(stop))
        .collect();

    let constraints = problem.constraints();
    for stop in missing {
        let demand = problem.stop(stop).demand();
        let slot = tours.iter_mut().find(|tour| {
            tour.len() < constraints.max_stops()
                && tour
                    .iter()
                    .map(|&s| problem.stop(s).demand())
                    .sum::<u32>()
                    + demand
                    <= constraints.max_demand()
        });
        match slot {
            Some(tour) => tour.push(stop),
            None => tours.push(vec![stop]),
        }
    }

    Chromosome::from_tours(tours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::{solver::seeds, test_utils};

    fn indices(n: usize) -> Vec<StopIdx> {
        (0..n).map(StopIdx::new).collect()
    }

    #[test]
    fn test_order_crossover_is_permutation() {
        let mut rng = SmallRng::seed_from_u64(11);
        let first = indices(10);
        let mut second = indices(10);
        second.reverse();

        for _ in 0..50 {
            let child = order_crossover(&first, &second, &mut rng);
            let mut sorted = child.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, indices(10));
        }
    }

    #[test]
    fn test_pmx_crossover_is_permutation() {
        let mut rng = SmallRng::seed_from_u64(13);
        let first = indices(10);
        let mut second = indices(10);
        second.rotate_left(3);

        for _ in 0..50 {
            let child = pmx_crossover(&first, &second, &mut rng);
            let mut sorted = child.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, indices(10));
        }
    }

    #[test]
    fn test_children_cover_all_stops() {
        let problem = test_utils::ring_problem(14, 20);
        let mut rng = SmallRng::seed_from_u64(17);

        let parent_a = Chromosome::from_solution(&seeds::nearest_neighbor(&problem));
        let parent_b =
            Chromosome::from_solution(&seeds::random_split(&problem, &mut rng));

        for kind in [
            CrossoverKind::Order,
            CrossoverKind::Pmx,
            CrossoverKind::Uniform,
        ] {
            let (left, right) = crossover(kind, &parent_a, &parent_b, &problem, &mut rng);
            for child in [left, right] {
                assert_eq!(child.num_stops(), 14, "{kind:?} lost or duplicated stops");
                let solution = child.to_solution(&problem);
                assert!(solution.is_partition(&problem), "{kind:?} broke the partition");
            }
        }
    }
}
