pub mod preprocess;
pub mod report;
pub mod request;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jiff::{SignedDuration, Timestamp};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{
    error::{ConfigurationError, OptimizeError, StateError, ValidationError},
    problem::routing_problem::{RoutingProblem, RoutingProblemBuilder},
    solver::{
        annealing::{SaParams, SimulatedAnnealing},
        genetic::{GaParams, GeneticAlgorithm},
        greedy::GreedyConstructor,
        result::AlgorithmResult,
    },
};

use report::{OptimizationRecord, OptimizationSummary};
use request::{AlgorithmParams, OptimizeRequest};

/// Below this stop count greedy construction is good enough.
const SMALL_PROBLEM_STOPS: usize = 20;
/// From this stop count on, only population search scales.
const LARGE_PROBLEM_STOPS: usize = 100;

/// History is trimmed back to this length whenever it exceeds twice as much.
const HISTORY_KEEP: usize = 50;
const HISTORY_CAP: usize = 100;

/// Entry point tying the engines together: validates requests, picks an
/// algorithm, runs it and keeps a bounded run history. One optimization at a
/// time; concurrent calls fail fast instead of queuing.
pub struct Orchestrator {
    in_flight: Arc<AtomicBool>,
    cancel_current: RwLock<Option<Arc<AtomicBool>>>,
    history: RwLock<Vec<OptimizationRecord>>,
    last_finished: RwLock<Option<Timestamp>>,
    cooldown: Option<SignedDuration>,
}

/// Releases the single-flight slot even when a run path exits early.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Orchestrator::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Orchestrator {
            in_flight: Arc::new(AtomicBool::new(false)),
            cancel_current: RwLock::new(None),
            history: RwLock::new(Vec::new()),
            last_finished: RwLock::new(None),
            cooldown: None,
        }
    }

    /// Rejects back-to-back runs closer together than `cooldown`.
    pub fn with_cooldown(cooldown: SignedDuration) -> Self {
        Orchestrator {
            cooldown: Some(cooldown),
            ..Orchestrator::new()
        }
    }

    /// Requests cancellation of the in-flight run, if any. The run winds
    /// down after its current iteration and still returns its best solution.
    pub fn stop(&self) {
        if let Some(cancel) = self.cancel_current.read().as_ref() {
            cancel.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_optimizing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn history(&self) -> Vec<OptimizationRecord> {
        self.history.read().clone()
    }

    pub fn optimize(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizationSummary, OptimizeError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StateError::AlreadyOptimizing.into());
        }
        let _guard = FlightGuard(&self.in_flight);

        self.check_cooldown()?;

        if request.vehicle_constraints.is_empty() {
            return Err(ValidationError::EmptyConstraints.into());
        }
        if request.vehicle_constraints.len() > 1 {
            warn!(
                profiles = request.vehicle_constraints.len(),
                "multiple vehicle profiles submitted, using the first"
            );
        }

        let stops = preprocess::normalize_stops(&request.stops);

        let mut builder = RoutingProblemBuilder::default();
        builder.set_depot(request.depot());
        builder.set_stops(stops);
        builder.set_constraints((&request.vehicle_constraints[0]).into());
        builder.set_distance_method(request.distance_method);
        if let Some(max_trips) = request.max_trips {
            builder.set_max_trips(max_trips);
        }
        let problem = Arc::new(builder.build()?);

        let result = self.run_engine(&problem, &request.algorithm)?;
        let summary = report::summarize(&problem, result);

        self.push_history(report::record(&summary, problem.num_stops()));
        *self.last_finished.write() = Some(Timestamp::now());

        info!(
            algorithm = ?summary.algorithm,
            tours = summary.tours.len(),
            score = summary.metrics.score,
            ?summary.termination,
            "optimization finished"
        );

        Ok(summary)
    }

    fn check_cooldown(&self) -> Result<(), OptimizeError> {
        let (Some(cooldown), Some(last)) = (self.cooldown, *self.last_finished.read()) else {
            return Ok(());
        };
        if Timestamp::now().duration_since(last) < cooldown {
            return Err(StateError::CooldownActive.into());
        }
        Ok(())
    }

    fn run_engine(
        &self,
        problem: &Arc<RoutingProblem>,
        algorithm: &AlgorithmParams,
    ) -> Result<AlgorithmResult, OptimizeError> {
        let result = match algorithm {
            AlgorithmParams::Greedy => GreedyConstructor::optimize(problem),
            AlgorithmParams::Genetic(params) => self.run_genetic(problem, params.clone())?,
            AlgorithmParams::Annealing(params) => self.run_annealing(problem, params.clone())?,
            AlgorithmParams::Hybrid => {
                return Err(ConfigurationError::HybridNotImplemented.into());
            }
            AlgorithmParams::Auto => {
                let choice = choose_algorithm(problem);
                info!(stops = problem.num_stops(), algorithm = ?choice, "auto-selected");
                match choice {
                    AutoChoice::Greedy => GreedyConstructor::optimize(problem),
                    AutoChoice::Genetic => self.run_genetic(problem, GaParams::default())?,
                    AutoChoice::Annealing => {
                        self.run_annealing(problem, SaParams::default())?
                    }
                    AutoChoice::Hybrid => {
                        return Err(ConfigurationError::HybridNotImplemented.into());
                    }
                }
            }
        };
        Ok(result)
    }

    fn run_genetic(
        &self,
        problem: &Arc<RoutingProblem>,
        params: GaParams,
    ) -> Result<AlgorithmResult, OptimizeError> {
        let engine = GeneticAlgorithm::new(Arc::clone(problem), params)
            .map_err(OptimizeError::Configuration)?;
        *self.cancel_current.write() = Some(engine.cancellation_handle());
        let result = engine.optimize();
        *self.cancel_current.write() = None;
        Ok(result)
    }

    fn run_annealing(
        &self,
        problem: &Arc<RoutingProblem>,
        params: SaParams,
    ) -> Result<AlgorithmResult, OptimizeError> {
        let engine = SimulatedAnnealing::new(Arc::clone(problem), params)
            .map_err(OptimizeError::Configuration)?;
        *self.cancel_current.write() = Some(engine.cancellation_handle());
        let result = engine.optimize();
        *self.cancel_current.write() = None;
        Ok(result)
    }

    fn push_history(&self, record: OptimizationRecord) {
        let mut history = self.history.write();
        history.push(record);
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_KEEP;
            history.drain(..excess);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AutoChoice {
    Greedy,
    Genetic,
    Annealing,
    Hybrid,
}

/// Size-and-structure heuristic:
/// small problems go greedy, mid-size structured problems anneal, large
/// ones breed. Large problems with both time windows and priorities would
/// want the hybrid engine, which is not built yet.
fn choose_algorithm(problem: &RoutingProblem) -> AutoChoice {
    let stops = problem.num_stops();
    let windows = problem.has_time_windows();
    let priorities = problem.has_priorities();

    if stops < SMALL_PROBLEM_STOPS {
        AutoChoice::Greedy
    } else if stops < LARGE_PROBLEM_STOPS {
        if windows || priorities {
            AutoChoice::Annealing
        } else {
            AutoChoice::Genetic
        }
    } else if windows && priorities {
        AutoChoice::Hybrid
    } else {
        AutoChoice::Genetic
    }
}
