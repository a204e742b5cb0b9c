use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jiff::Timestamp;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info};

use crate::{
    problem::routing_problem::RoutingProblem,
    solution::{solution::Solution, violation},
    solver::{
        greedy::GreedyConstructor,
        result::{
            AlgorithmKind, AlgorithmResult, ConvergencePoint, SummaryMetrics, TerminationReason,
            efficiency_percent, feasibility_percent, improvement_percent, stability_percent,
        },
    },
};

use super::{cooling, neighborhood::NeighborhoodMove, params::SaParams};

/// Iterations without improvement before the run stops.
const STAGNATION_LIMIT: usize = 500;
/// Iterations without improvement before a reheat becomes possible.
const REHEAT_AFTER: usize = 100;
/// Reheats only fire once the temperature has collapsed below this share of
/// the initial temperature.
const REHEAT_TEMPERATURE_SHARE: f64 = 0.1;
const REHEAT_FACTOR: f64 = 10.0;
/// Rolling acceptance window length.
const ACCEPTANCE_WINDOW: usize = 100;

const ENERGY_PER_KM: f64 = 1.0;
const ENERGY_PER_MIN: f64 = 0.1;
const ENERGY_PER_TOUR: f64 = 100.0;
const ENERGY_PER_UNASSIGNED: f64 = 1000.0;
const ENERGY_PER_VIOLATION: f64 = 500.0;

/// Total cost to minimize. Violations are priced in, never forbidden.
pub fn energy(problem: &RoutingProblem, solution: &Solution) -> f64 {
    let violations = violation::check_solution(problem, solution);

    solution.total_distance_km() * ENERGY_PER_KM
        + solution.total_duration_mins() * ENERGY_PER_MIN
        + solution.num_tours() as f64 * ENERGY_PER_TOUR
        + solution.unassigned().len() as f64 * ENERGY_PER_UNASSIGNED
        + violations.len() as f64 * ENERGY_PER_VIOLATION
}

pub struct SimulatedAnnealing {
    problem: Arc<RoutingProblem>,
    params: SaParams,
    cancelled: Arc<AtomicBool>,
}

struct AnnealState {
    current: Solution,
    current_energy: f64,
    best: Solution,
    best_energy: f64,
    temperature: f64,
    accepted: VecDeque<bool>,
    accepted_total: usize,
    attempted_total: usize,
    last_improvement: usize,
    cooling_steps: usize,
    convergence: Vec<ConvergencePoint>,
}

impl AnnealState {
    fn acceptance_rate(&self) -> f64 {
        if self.accepted.is_empty() {
            1.0
        } else {
            self.accepted.iter().filter(|&&accepted| accepted).count() as f64
                / self.accepted.len() as f64
        }
    }

    fn record_attempt(&mut self, accepted: bool) {
        if self.accepted.len() == ACCEPTANCE_WINDOW {
            self.accepted.pop_front();
        }
        self.accepted.push_back(accepted);
        self.attempted_total += 1;
        if accepted {
            self.accepted_total += 1;
        }
    }
}

impl SimulatedAnnealing {
    pub fn new(
        problem: Arc<RoutingProblem>,
        params: SaParams,
    ) -> Result<Self, crate::error::ConfigurationError> {
        params.validate()?;
        Ok(SimulatedAnnealing {
            problem,
            params,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn optimize(&self) -> AlgorithmResult {
        let started = Timestamp::now();
        let mut rng = match self.params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let initial = GreedyConstructor::construct(&self.problem);
        let initial_energy = energy(&self.problem, &initial);

        let mut state = AnnealState {
            current: initial.clone(),
            current_energy: initial_energy,
            best: initial,
            best_energy: initial_energy,
            temperature: self.params.initial_temperature,
            accepted: VecDeque::with_capacity(ACCEPTANCE_WINDOW),
            accepted_total: 0,
            attempted_total: 0,
            last_improvement: 0,
            cooling_steps: 0,
            convergence: Vec::new(),
        };

        info!(
            initial_energy,
            temperature = state.temperature,
            max_iterations = self.params.max_iterations,
            "annealing started"
        );

        let mut iteration = 0usize;
        let mut termination = None;

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
            if state.temperature <= self.params.final_temperature {
                termination = Some(TerminationReason::Converged);
                break;
            }
            if iteration - state.last_improvement > STAGNATION_LIMIT {
                termination = Some(TerminationReason::Stagnation);
                break;
            }

            let step = catch_unwind(AssertUnwindSafe(|| {
                self.step(&mut state, iteration, &mut rng);
            }));
            if let Err(panic) = step {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                error!(iteration, panic = %message, "annealing aborted");
                termination = Some(TerminationReason::Error);
                break;
            }

            iteration += 1;
        }

        let termination = termination.unwrap_or(TerminationReason::Error);
        let mut solution = state.best.clone();
        solution.compact();
        solution.recompute_all(&self.problem);
        let violations = violation::check_solution(&self.problem, &solution);

        let overall_acceptance = if state.attempted_total == 0 {
            0.0
        } else {
            state.accepted_total as f64 / state.attempted_total as f64 * 100.0
        };

        debug!(
            iterations = iteration,
            energy = state.best_energy,
            ?termination,
            "annealing finished"
        );

        AlgorithmResult {
            algorithm: AlgorithmKind::Annealing,
            metrics: SummaryMetrics {
                score: state.best_energy,
                improvement_percent: improvement_percent(initial_energy, state.best_energy, true),
                efficiency: efficiency_percent(&self.problem, &solution),
                feasibility: feasibility_percent(&self.problem, &solution, &violations),
                diversity: overall_acceptance,
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

    fn step(&self, state: &mut AnnealState, iteration: usize, rng: &mut SmallRng) {
        let candidate_move = NeighborhoodMove::random(rng);
        let mut neighbor = state.current.clone();

        if candidate_move.apply(&self.problem, &mut neighbor, rng) {
            let neighbor_energy = energy(&self.problem, &neighbor);
            let delta = neighbor_energy - state.current_energy;

            if self.accept(delta, state.temperature, rng) {
                state.current = neighbor;
                state.current_energy = neighbor_energy;
                state.record_attempt(true);

                if state.current_energy < state.best_energy {
                    state.best = state.current.clone();
                    state.best_energy = state.current_energy;
                    state.last_improvement = iteration;
                }
            } else {
                state.record_attempt(false);
            }
        }

        state.convergence.push(ConvergencePoint {
            iteration,
            best: state.best_energy,
            average: state.current_energy,
        });

        if (iteration + 1) % self.params.iterations_per_temperature == 0 {
            state.cooling_steps += 1;
            state.temperature = cooling::next_temperature(
                &self.params,
                state.temperature,
                state.cooling_steps,
                state.acceptance_rate(),
            );
            self.maybe_reheat(state, iteration);
        }
    }

    /// Metropolis criterion. At non-positive temperatures only strict
    /// improvements pass, so the search can never climb uphill forever.
    fn accept(&self, delta: f64, temperature: f64, rng: &mut SmallRng) -> bool {
        if delta <= 0.0 {
            return true;
        }
        if temperature <= 0.0 {
            return false;
        }
        rng.random_range(0.0..1.0) < (-delta / temperature).exp()
    }

    /// Kicks the temperature back up when the search is both stuck and
    /// frozen: long since the last improvement, low acceptance, temperature
    /// collapsed to under 10% of the start value.
    fn maybe_reheat(&self, state: &mut AnnealState, iteration: usize) {
        let stuck = iteration - state.last_improvement > REHEAT_AFTER;
        let frozen = state.acceptance_rate() < self.params.min_acceptance_rate;
        let cold = state.temperature
            < self.params.initial_temperature * REHEAT_TEMPERATURE_SHARE;

        if stuck && frozen && cold {
            let ceiling = self.params.initial_temperature * self.params.reheat_threshold;
            state.temperature = (state.temperature * REHEAT_FACTOR).min(ceiling);
            debug!(
                temperature = state.temperature,
                iteration, "reheated the annealing schedule"
            );
        }
    }
}
