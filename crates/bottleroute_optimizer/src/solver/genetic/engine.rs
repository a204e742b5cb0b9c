use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jiff::Timestamp;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::{
    problem::routing_problem::RoutingProblem,
    solution::violation,
    solver::{
        result::{
            AlgorithmKind, AlgorithmResult, ConvergencePoint, SummaryMetrics, TerminationReason,
            efficiency_percent, feasibility_percent, improvement_percent, stability_percent,
        },
        seeds,
    },
};

use super::{
    chromosome::Chromosome,
    crossover::crossover,
    fitness::evaluate,
    mutation::mutate,
    params::GaParams,
    selection::select,
};

/// Generations without improvement before the run stops.
const STAGNATION_LIMIT: u32 = 50;
/// Stagnation span that triggers a mutation-rate bump.
const ADAPT_UP_AFTER: u32 = 20;
/// Improvement recency below which the rate is eased back down.
const ADAPT_DOWN_BEFORE: u32 = 5;
const MUTATION_RATE_CAP: f64 = 20.0;
const MUTATION_RATE_FLOOR: f64 = 1.0;

pub struct GeneticAlgorithm {
    problem: Arc<RoutingProblem>,
    params: GaParams,
    cancelled: Arc<AtomicBool>,
}

struct SearchState {
    population: Vec<Chromosome>,
    best: Chromosome,
    best_fitness: f64,
    stagnation: u32,
    mutation_rate: f64,
    convergence: Vec<ConvergencePoint>,
}

impl GeneticAlgorithm {
    pub fn new(
        problem: Arc<RoutingProblem>,
        params: GaParams,
    ) -> Result<Self, crate::error::ConfigurationError> {
        params.validate()?;
        Ok(GeneticAlgorithm {
            problem,
            params,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag: flip it from any thread to stop the run after the
    /// current generation.
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn optimize(&self) -> AlgorithmResult {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.threads.num_threads())
            .build()
        {
            Ok(pool) => pool.install(|| self.search()),
            Err(err) => {
                warn!(%err, "falling back to the global rayon pool");
                self.search()
            }
        }
    }

    fn search(&self) -> AlgorithmResult {
        let started = Timestamp::now();
        let mut rng = match self.params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let mut state = self.initial_state(&mut rng);
        let initial_fitness = state.best_fitness;
        let mut iteration = 0usize;
        let mut termination = None;

        info!(
            population = self.params.population_size,
            max_iterations = self.params.max_iterations,
            "genetic search started"
        );

        while termination.is_none() {
            if self.cancelled.load(Ordering::Relaxed) {
                termination = Some(TerminationReason::Cancelled);
                break;
            }
            if iteration >= self.params.max_iterations {
                termination = Some(TerminationReason::MaxIterations);
                break;
            }
            if let Some(limit) = self.params.time_limit {
                if Timestamp::now().duration_since(started) >= limit {
                    termination = Some(TerminationReason::TimeLimit);
                    break;
                }
            }
            if state.stagnation >= STAGNATION_LIMIT {
                termination = Some(TerminationReason::Stagnation);
                break;
            }

            // A panicking operator loses the generation, not the run
            let step = catch_unwind(AssertUnwindSafe(|| {
                self.step(&mut state, iteration, &mut rng);
            }));
            if let Err(panic) = step {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                error!(iteration, panic = %message, "genetic search aborted");
                termination = Some(TerminationReason::Error);
                break;
            }

            iteration += 1;
        }

        let termination = termination.unwrap_or(TerminationReason::Error);
        let mut solution = state.best.to_solution(&self.problem);
        solution.compact();
        let violations = violation::check_solution(&self.problem, &solution);

        debug!(
            iterations = iteration,
            fitness = state.best_fitness,
            ?termination,
            "genetic search finished"
        );

        AlgorithmResult {
            algorithm: AlgorithmKind::Genetic,
            metrics: SummaryMetrics {
                score: state.best_fitness,
                improvement_percent: improvement_percent(
                    initial_fitness,
                    state.best_fitness,
                    false,
                ),
                efficiency: efficiency_percent(&self.problem, &solution),
                feasibility: feasibility_percent(&self.problem, &solution, &violations),
                diversity: population_diversity(&state.population),
                stability: stability_percent(&state.convergence),
            },
            solution,
            violations,
            convergence: state.convergence,
            execution_time: Timestamp::now().duration_since(started),
            iterations: iteration,
            termination,
        }
    }

    fn initial_state(&self, rng: &mut SmallRng) -> SearchState {
        let mut population: Vec<Chromosome> =
            seeds::seed_pool(&self.problem, rng, self.params.population_size)
                .iter()
                .map(Chromosome::from_solution)
                .collect();

        population
            .par_iter_mut()
            .for_each(|chromosome| evaluate(&self.problem, chromosome));
        population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let best = population[0].clone();
        let best_fitness = best.fitness;

        SearchState {
            population,
            best,
            best_fitness,
            stagnation: 0,
            mutation_rate: self.params.mutation_rate,
            convergence: Vec::new(),
        }
    }

    /// One generation: record, breed, evaluate, sort, adapt.
    fn step(&self, state: &mut SearchState, iteration: usize, rng: &mut SmallRng) {
        let average = state
            .population
            .iter()
            .map(|chromosome| chromosome.fitness)
            .sum::<f64>()
            / state.population.len() as f64;
        state.convergence.push(ConvergencePoint {
            iteration,
            best: state.best_fitness,
            average,
        });

        let elite_count = self.params.elite_count();
        let mut next: Vec<Chromosome> = state.population[..elite_count]
            .iter()
            .map(|chromosome| {
                let mut elite = chromosome.clone();
                elite.age += 1;
                elite
            })
            .collect();

        while next.len() < self.params.population_size {
            let parent_a = select(
                self.params.selection,
                &state.population,
                self.params.tournament_size,
                rng,
            );
            let parent_b = select(
                self.params.selection,
                &state.population,
                self.params.tournament_size,
                rng,
            );

            let (mut child_a, mut child_b) =
                if rng.random_bool(self.params.crossover_rate / 100.0) {
                    crossover(self.params.crossover, parent_a, parent_b, &self.problem, rng)
                } else {
                    (parent_a.clone(), parent_b.clone())
                };

            for child in [&mut child_a, &mut child_b] {
                child.age = 0;
                if rng.random_bool(state.mutation_rate / 100.0) {
                    mutate(self.params.mutation, child, &self.problem, rng);
                }
            }

            next.push(child_a);
            if next.len() < self.params.population_size {
                next.push(child_b);
            }
        }

        next.par_iter_mut()
            .skip(elite_count)
            .for_each(|chromosome| evaluate(&self.problem, chromosome));
        next.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        if next[0].fitness > state.best_fitness {
            state.best = next[0].clone();
            state.best_fitness = next[0].fitness;
            state.stagnation = 0;
        } else {
            state.stagnation += 1;
        }

        if self.params.adaptive_rates {
            if state.stagnation > ADAPT_UP_AFTER {
                state.mutation_rate = (state.mutation_rate * 1.1).min(MUTATION_RATE_CAP);
            } else if state.stagnation < ADAPT_DOWN_BEFORE {
                state.mutation_rate = (state.mutation_rate * 0.95).max(MUTATION_RATE_FLOOR);
            }
        }

        state.population = next;
    }
}

/// Coefficient of variation of population fitness, as a percentage.
fn population_diversity(population: &[Chromosome]) -> f64 {
    if population.len() < 2 {
        return 0.0;
    }

    let mean = population.iter().map(|c| c.fitness).sum::<f64>() / population.len() as f64;
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }

    let variance = population
        .iter()
        .map(|c| (c.fitness - mean).powi(2))
        .sum::<f64>()
        / population.len() as f64;

    (variance.sqrt() / mean.abs() * 100.0).min(100.0)
}
