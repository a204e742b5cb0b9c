use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::{
    problem::routing_problem::RoutingProblem,
    solution::{solution::Solution, violation::ConstraintViolation},
    solver::result::{
        AlgorithmKind, AlgorithmResult, ConvergencePoint, SummaryMetrics, TerminationReason,
    },
};

/// Tours above this share of capacity get a mid-route refill suggestion.
const REFILL_UTILIZATION_SHARE: f64 = 0.75;
/// Tours below this utilization are flagged as underused.
const UNDERUTILIZED_PERCENT: f64 = 60.0;
const LOW_EFFICIENCY_PERCENT: f64 = 70.0;

/// Externally visible tour: stop ids instead of indices, metrics included.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizedTour {
    pub tour_id: usize,
    pub stop_ids: Vec<String>,
    pub load: u32,
    pub distance_km: f64,
    pub duration_mins: f64,
    pub utilization_percent: f64,
    pub violations: Vec<ConstraintViolation>,
    pub refill: Option<RefillSuggestion>,
}

/// A suggested depot restock partway through a heavy tour.
#[derive(Clone, Debug, Serialize)]
pub struct RefillSuggestion {
    /// Refill after visiting this stop.
    pub after_stop_id: String,
    /// Zero-based position within the tour.
    pub position: usize,
    /// Bottles already delivered when the refill happens.
    pub delivered_before_refill: u32,
}

#[derive(Clone, Debug, Serialize)]
pub enum Recommendation {
    UnderutilizedTour { tour_id: usize, utilization_percent: f64 },
    OverlongTour { tour_id: usize, duration_mins: f64 },
    LowOverallEfficiency { efficiency_percent: f64 },
    UnscheduledHighPriority { stop_ids: Vec<String> },
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::UnderutilizedTour {
                tour_id,
                utilization_percent,
            } => write!(
                f,
                "tour {tour_id} runs at {utilization_percent:.0}% capacity, consider merging it"
            ),
            Recommendation::OverlongTour {
                tour_id,
                duration_mins,
            } => write!(
                f,
                "tour {tour_id} takes {duration_mins:.0} minutes, consider splitting it"
            ),
            Recommendation::LowOverallEfficiency { efficiency_percent } => write!(
                f,
                "overall capacity utilization is {efficiency_percent:.0}%, fewer tours may suffice"
            ),
            Recommendation::UnscheduledHighPriority { stop_ids } => write!(
                f,
                "high-priority stops left unscheduled: {}",
                stop_ids.join(", ")
            ),
        }
    }
}

/// The complete answer to one optimization request.
#[derive(Debug, Serialize)]
pub struct OptimizationSummary {
    pub algorithm: AlgorithmKind,
    pub tours: Vec<OptimizedTour>,
    pub unassigned_stop_ids: Vec<String>,
    pub metrics: SummaryMetrics,
    pub recommendations: Vec<Recommendation>,
    pub convergence: Vec<ConvergencePoint>,
    pub execution_time: SignedDuration,
    pub iterations: usize,
    pub termination: TerminationReason,
}

/// Compact history entry kept by the orchestrator.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizationRecord {
    pub finished_at: Timestamp,
    pub algorithm: AlgorithmKind,
    pub num_stops: usize,
    pub num_tours: usize,
    pub total_distance_km: f64,
    pub score: f64,
}

pub fn summarize(problem: &RoutingProblem, result: AlgorithmResult) -> OptimizationSummary {
    let tours = build_tours(problem, &result.solution, &result.violations);
    let unassigned_stop_ids: Vec<String> = result
        .solution
        .unassigned()
        .iter()
        .map(|&stop| problem.stop(stop).external_id().to_owned())
        .collect();
    let recommendations = recommend(problem, &result, &tours);

    OptimizationSummary {
        algorithm: result.algorithm,
        tours,
        unassigned_stop_ids,
        metrics: result.metrics,
        recommendations,
        convergence: result.convergence,
        execution_time: result.execution_time,
        iterations: result.iterations,
        termination: result.termination,
    }
}

fn build_tours(
    problem: &RoutingProblem,
    solution: &Solution,
    violations: &[ConstraintViolation],
) -> Vec<OptimizedTour> {
    let max_demand = problem.constraints().max_demand();

    solution
        .tours()
        .iter()
        .filter(|tour| !tour.is_empty())
        .map(|tour| {
            let stop_ids = tour
                .stops()
                .iter()
                .map(|&stop| problem.stop(stop).external_id().to_owned())
                .collect();

            let utilization_percent = if max_demand == 0 {
                0.0
            } else {
                tour.load() as f64 / max_demand as f64 * 100.0
            };

            OptimizedTour {
                tour_id: tour.id().get(),
                stop_ids,
                load: tour.load(),
                distance_km: tour.distance_km(),
                duration_mins: tour.duration_mins(),
                utilization_percent,
                violations: violations
                    .iter()
                    .filter(|violation| violation.tour_id == tour.id().get())
                    .cloned()
                    .collect(),
                refill: refill_suggestion(problem, tour),
            }
        })
        .collect()
}

/// Heavy tours get a restock hint at the halfway point of the stop
/// sequence, so the driver leaves the depot with a partial load twice
/// instead of once overloaded.
fn refill_suggestion(
    problem: &RoutingProblem,
    tour: &crate::solution::tour::Tour,
) -> Option<RefillSuggestion> {
    let threshold = problem.constraints().max_demand() as f64 * REFILL_UTILIZATION_SHARE;
    if tour.len() < 2 || (tour.load() as f64) <= threshold {
        return None;
    }

    let position = tour.len() / 2 - 1;
    let delivered_before_refill = tour.stops()[..=position]
        .iter()
        .map(|&stop| problem.stop(stop).demand())
        .sum();

    Some(RefillSuggestion {
        after_stop_id: problem
            .stop(tour.stops()[position])
            .external_id()
            .to_owned(),
        position,
        delivered_before_refill,
    })
}

fn recommend(
    problem: &RoutingProblem,
    result: &AlgorithmResult,
    tours: &[OptimizedTour],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let max_duration_mins = problem.constraints().max_duration().as_secs_f64() / 60.0;

    for tour in tours {
        if tour.utilization_percent < UNDERUTILIZED_PERCENT && tours.len() > 1 {
            recommendations.push(Recommendation::UnderutilizedTour {
                tour_id: tour.tour_id,
                utilization_percent: tour.utilization_percent,
            });
        }
        if tour.duration_mins > max_duration_mins {
            recommendations.push(Recommendation::OverlongTour {
                tour_id: tour.tour_id,
                duration_mins: tour.duration_mins,
            });
        }
    }

    if result.metrics.efficiency < LOW_EFFICIENCY_PERCENT && tours.len() > 1 {
        recommendations.push(Recommendation::LowOverallEfficiency {
            efficiency_percent: result.metrics.efficiency,
        });
    }

    let urgent_unassigned: Vec<String> = result
        .solution
        .unassigned()
        .iter()
        .filter(|&&stop| problem.stop(stop).priority().is_high())
        .map(|&stop| problem.stop(stop).external_id().to_owned())
        .collect();
    if !urgent_unassigned.is_empty() {
        recommendations.push(Recommendation::UnscheduledHighPriority {
            stop_ids: urgent_unassigned,
        });
    }

    recommendations
}

pub fn record(result: &OptimizationSummary, num_stops: usize) -> OptimizationRecord {
    OptimizationRecord {
        finished_at: Timestamp::now(),
        algorithm: result.algorithm,
        num_stops,
        num_tours: result.tours.len(),
        total_distance_km: result.tours.iter().map(|tour| tour.distance_km).sum(),
        score: result.metrics.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::greedy::GreedyConstructor,
        test_utils,
    };

    #[test]
    fn test_heavy_tour_gets_refill_suggestion() {
        // 70 of 80 bottles across four stops
        let problem = test_utils::munich_problem(&[
            (48.15, 11.58, 20),
            (48.16, 11.60, 20),
            (48.17, 11.62, 15),
            (48.18, 11.64, 15),
        ]);
        let result = GreedyConstructor::optimize(&problem);
        let summary = summarize(&problem, result);

        assert_eq!(summary.tours.len(), 1);
        let refill = summary.tours[0].refill.as_ref().expect("refill expected");
        assert_eq!(refill.position, 1);
        assert!(refill.delivered_before_refill > 0);
    }

    #[test]
    fn test_light_tour_gets_no_refill() {
        let problem =
            test_utils::munich_problem(&[(48.15, 11.58, 10), (48.16, 11.60, 10)]);
        let result = GreedyConstructor::optimize(&problem);
        let summary = summarize(&problem, result);

        assert!(summary.tours[0].refill.is_none());
    }

    #[test]
    fn test_summary_uses_external_ids() {
        let problem = test_utils::munich_problem(&[(48.15, 11.58, 10)]);
        let result = GreedyConstructor::optimize(&problem);
        let summary = summarize(&problem, result);

        assert_eq!(summary.tours[0].stop_ids, vec!["stop-0".to_owned()]);
    }

    #[test]
    fn test_summary_serializes() {
        let problem = test_utils::munich_problem(&[(48.15, 11.58, 10)]);
        let summary = summarize(&problem, GreedyConstructor::optimize(&problem));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"tours\""));
    }
}
