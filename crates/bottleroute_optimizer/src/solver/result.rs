use jiff::SignedDuration;
use serde::Serialize;

use crate::{
    problem::routing_problem::RoutingProblem,
    solution::{solution::Solution, violation::ConstraintViolation},
};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum AlgorithmKind {
    Greedy,
    Genetic,
    Annealing,
    Hybrid,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum TerminationReason {
    MaxIterations,
    TimeLimit,
    Stagnation,
    Converged,
    Cancelled,
    Error,
}

/// One sample of the convergence trace: best-known and population/trajectory
/// average score at a given iteration.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ConvergencePoint {
    pub iteration: usize,
    pub best: f64,
    pub average: f64,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SummaryMetrics {
    pub score: f64,
    pub improvement_percent: f64,
    /// Mean capacity utilization across non-empty tours, percent.
    pub efficiency: f64,
    /// Share of stops assigned to violation-free tours, percent.
    pub feasibility: f64,
    /// Search-specific spread measure (population fitness spread for the GA,
    /// move acceptance rate for annealing), percent.
    pub diversity: f64,
    /// How settled the tail of the convergence trace is, percent.
    pub stability: f64,
}

/// Raw engine output. The orchestrator reshapes this into the externally
/// visible tour records.
#[derive(Debug, Serialize)]
pub struct AlgorithmResult {
    pub algorithm: AlgorithmKind,
    pub solution: Solution,
    pub violations: Vec<ConstraintViolation>,
    pub metrics: SummaryMetrics,
    pub convergence: Vec<ConvergencePoint>,
    pub execution_time: SignedDuration,
    pub iterations: usize,
    pub termination: TerminationReason,
}

/// Positive percentage when `final_score` beats `initial_score` in the
/// engine's own direction (GA maximizes fitness, SA minimizes energy).
pub(crate) fn improvement_percent(initial_score: f64, final_score: f64, minimize: bool) -> f64 {
    if initial_score.abs() < f64::EPSILON {
        return 0.0;
    }

    let delta = if minimize {
        initial_score - final_score
    } else {
        final_score - initial_score
    };

    delta / initial_score.abs() * 100.0
}

pub(crate) fn efficiency_percent(problem: &RoutingProblem, solution: &Solution) -> f64 {
    let max_demand = problem.constraints().max_demand();
    if max_demand == 0 {
        return 0.0;
    }

    let utilizations: Vec<f64> = solution
        .tours()
        .iter()
        .filter(|tour| !tour.is_empty())
        .map(|tour| tour.load() as f64 / max_demand as f64 * 100.0)
        .collect();

    if utilizations.is_empty() {
        0.0
    } else {
        utilizations.iter().sum::<f64>() / utilizations.len() as f64
    }
}

pub(crate) fn feasibility_percent(
    problem: &RoutingProblem,
    solution: &Solution,
    violations: &[ConstraintViolation],
) -> f64 {
    if problem.num_stops() == 0 {
        return 100.0;
    }

    let clean_stops: usize = solution
        .tours()
        .iter()
        .filter(|tour| {
            !violations
                .iter()
                .any(|violation| violation.tour_id == tour.id().get())
        })
        .map(|tour| tour.len())
        .sum();

    clean_stops as f64 / problem.num_stops() as f64 * 100.0
}

/// 100 when the last few convergence samples have settled, lower when the
/// best score is still moving.
pub(crate) fn stability_percent(convergence: &[ConvergencePoint]) -> f64 {
    let tail: Vec<f64> = convergence
        .iter()
        .rev()
        .take(10)
        .map(|point| point.best)
        .collect();

    if tail.len() < 2 {
        return 100.0;
    }

    let min = tail.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = tail.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = tail.iter().sum::<f64>() / tail.len() as f64;

    if mean.abs() < f64::EPSILON {
        return 100.0;
    }

    (100.0 - (max - min).abs() / mean.abs() * 100.0).clamp(0.0, 100.0)
}
