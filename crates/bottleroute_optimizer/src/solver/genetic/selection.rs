use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::chromosome::Chromosome;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionKind {
    Tournament,
    Roulette,
    Rank,
}

/// Picks one parent. `population` must be sorted by fitness, best first;
/// rank selection relies on that ordering.
pub fn select<'a, R: Rng>(
    kind: SelectionKind,
    population: &'a [Chromosome],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Chromosome {
    match kind {
        SelectionKind::Tournament => tournament(population, tournament_size, rng),
        SelectionKind::Roulette => roulette(population, rng),
        SelectionKind::Rank => rank(population, rng),
    }
}

fn tournament<'a, R: Rng>(
    population: &'a [Chromosome],
    size: usize,
    rng: &mut R,
) -> &'a Chromosome {
    let size = size.clamp(1, population.len());
    let mut best: Option<&Chromosome> = None;
    for _ in 0..size {
        let candidate = &population[rng.random_range(0..population.len())];
        if best.is_none_or(|current| candidate.fitness > current.fitness) {
            best = Some(candidate);
        }
    }
    best.unwrap()
}

fn roulette<'a, R: Rng>(population: &'a [Chromosome], rng: &mut R) -> &'a Chromosome {
    let total: f64 = population.iter().map(|c| c.fitness.max(0.0)).sum();
    if total <= 0.0 {
        // All-zero fitness degenerates to a uniform draw
        return population.choose(rng).unwrap();
    }

    let mut target = rng.random_range(0.0..total);
    for chromosome in population {
        target -= chromosome.fitness.max(0.0);
        if target <= 0.0 {
            return chromosome;
        }
    }
    population.last().unwrap()
}

/// Linear rank weights: best gets weight n, worst gets 1.
fn rank<'a, R: Rng>(population: &'a [Chromosome], rng: &mut R) -> &'a Chromosome {
    let n = population.len();
    let total = n * (n + 1) / 2;
    let mut target = rng.random_range(0..total);
    for (index, chromosome) in population.iter().enumerate() {
        let weight = n - index;
        if target < weight {
            return chromosome;
        }
        target -= weight;
    }
    population.last().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::problem::stop::StopIdx;
    use crate::solver::genetic::chromosome::Chromosome;

    fn population(fitnesses: &[f64]) -> Vec<Chromosome> {
        fitnesses
            .iter()
            .map(|&fitness| {
                let mut chromosome = Chromosome::from_tours(vec![vec![StopIdx::new(0)]]);
                chromosome.fitness = fitness;
                chromosome
            })
            .collect()
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let population = population(&[900.0, 500.0, 100.0]);
        let mut rng = SmallRng::seed_from_u64(1);

        let mut wins = [0usize; 3];
        for _ in 0..300 {
            let picked = tournament(&population, 2, &mut rng);
            let index = population
                .iter()
                .position(|c| c.fitness == picked.fitness)
                .unwrap();
            wins[index] += 1;
        }

        assert!(wins[0] > wins[2]);
    }

    #[test]
    fn test_roulette_zero_total_falls_back_to_uniform() {
        let population = population(&[0.0, 0.0, 0.0]);
        let mut rng = SmallRng::seed_from_u64(2);

        // Must not panic or loop, any member is fine
        for _ in 0..50 {
            let _ = roulette(&population, &mut rng);
        }
    }

    #[test]
    fn test_rank_covers_whole_population() {
        let population = population(&[300.0, 200.0, 100.0]);
        let mut rng = SmallRng::seed_from_u64(3);

        let mut seen = [false; 3];
        for _ in 0..500 {
            let picked = rank(&population, &mut rng);
            let index = population
                .iter()
                .position(|c| c.fitness == picked.fitness)
                .unwrap();
            seen[index] = true;
        }

        assert_eq!(seen, [true, true, true]);
    }
}
