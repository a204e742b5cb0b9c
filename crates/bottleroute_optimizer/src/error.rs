use thiserror::Error;

/// Errors surfaced before or instead of a search run.
///
/// Infeasibility is deliberately not an error: a solution with `unassigned`
/// stops is still returned so callers can react to the remainder. Runtime
/// failures inside a search loop are reported through
/// [`TerminationReason::Error`](crate::solver::result::TerminationReason)
/// on the result instead of propagating.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid state: {0}")]
    State(#[from] StateError),
}

/// Invalid algorithm parameters. Fatal, raised before any search starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("population size must be at least 10, got {0}")]
    PopulationTooSmall(usize),

    #[error("max iterations must be at least 1, got {0}")]
    NoIterations(usize),

    #[error("{name} must be within [0, 100], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("initial temperature must be positive, got {0}")]
    NonPositiveTemperature(f64),

    #[error("cooling rate must be within (0, 1), got {0}")]
    CoolingRateOutOfRange(f64),

    #[error("iterations per temperature level must be positive")]
    NoIterationsAtTemperature,

    #[error("the hybrid algorithm is not implemented")]
    HybridNotImplemented,
}

/// Bad input stops, constraints or coordinates. The caller must fix the
/// request; retrying the same input will fail again.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("stop list is empty")]
    EmptyStops,

    #[error("vehicle constraints list is empty")]
    EmptyConstraints,

    #[error("invalid coordinate for {id}: ({lat}, {lng})")]
    InvalidCoordinate { id: String, lat: f64, lng: f64 },

    #[error("stop {id} demand {demand} exceeds vehicle capacity {capacity}")]
    StopExceedsCapacity {
        id: String,
        demand: u32,
        capacity: u32,
    },

    #[error("total demand {demand} exceeds fleet capacity {capacity}")]
    DemandExceedsFleetCapacity { demand: u32, capacity: u32 },
}

/// Transient orchestration state. Always retryable once the in-flight run
/// completes or the cooldown elapses.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("an optimization run is already in flight")]
    AlreadyOptimizing,

    #[error("re-optimization requested within the cooldown interval")]
    CooldownActive,
}
