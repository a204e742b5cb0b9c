use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::{
    problem::{constraints::VehicleConstraints, location::Location, travel_matrix::DistanceMethod},
    solver::{annealing::SaParams, genetic::GaParams},
};

/// Raw delivery stop as submitted by a caller, before normalization. Invalid
/// pieces are cleaned up in preprocessing rather than rejected (except for
/// coordinates, which fail validation).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StopSpec {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// Bottles to deliver.
    #[serde(default)]
    pub demand: u32,
    /// 1 (highest) to 5 (lowest); out-of-range values are clamped, absent
    /// means default.
    #[serde(default)]
    pub priority: Option<u8>,
    /// Minutes from route start; dropped with a warning when start >= end.
    #[serde(default)]
    pub time_window_mins: Option<(i64, i64)>,
    #[serde(default)]
    pub service_mins: Option<i64>,
}

impl StopSpec {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, demand: u32) -> Self {
        StopSpec {
            id: id.into(),
            lat,
            lng,
            demand,
            priority: None,
            time_window_mins: None,
            service_mins: None,
        }
    }
}

/// Vehicle limits as submitted. Defaults mirror the standard delivery van.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSpec {
    pub max_demand: u32,
    pub max_stops: usize,
    pub max_duration_mins: i64,
}

impl Default for ConstraintSpec {
    fn default() -> Self {
        ConstraintSpec {
            max_demand: 80,
            max_stops: 50,
            max_duration_mins: 480,
        }
    }
}

impl From<&ConstraintSpec> for VehicleConstraints {
    fn from(spec: &ConstraintSpec) -> Self {
        VehicleConstraints::new(
            spec.max_demand,
            spec.max_stops,
            SignedDuration::from_mins(spec.max_duration_mins),
        )
    }
}

/// Which engine to run. `Auto` picks by problem size and structure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmParams {
    #[default]
    Auto,
    Greedy,
    Genetic(GaParams),
    Annealing(SaParams),
    /// Reserved; selecting it explicitly or hitting it through `Auto` is a
    /// configuration error for now.
    Hybrid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub depot_lat: f64,
    pub depot_lng: f64,
    pub stops: Vec<StopSpec>,
    /// Only a single vehicle profile is supported; the first entry wins and
    /// an empty list is a validation error.
    pub vehicle_constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    pub algorithm: AlgorithmParams,
    #[serde(default)]
    pub distance_method: DistanceMethod,
    /// Cap on depot round trips for the fleet-capacity validation.
    #[serde(default)]
    pub max_trips: Option<usize>,
}

impl OptimizeRequest {
    pub fn new(depot: Location, stops: Vec<StopSpec>) -> Self {
        OptimizeRequest {
            depot_lat: depot.lat(),
            depot_lng: depot.lng(),
            stops,
            vehicle_constraints: vec![ConstraintSpec::default()],
            algorithm: AlgorithmParams::Auto,
            distance_method: DistanceMethod::Haversine,
            max_trips: None,
        }
    }

    pub fn depot(&self) -> Location {
        Location::new(self.depot_lat, self.depot_lng)
    }
}
