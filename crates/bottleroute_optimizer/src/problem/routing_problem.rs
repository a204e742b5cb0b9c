use jiff::SignedDuration;

use crate::error::ValidationError;

use super::{
    constraints::VehicleConstraints,
    location::{Location, LocationIdx},
    stop::{Stop, StopIdx},
    travel_matrix::{DistanceMethod, TravelMatrix},
};

/// A single optimization instance: depot, stops, one vehicle profile and the
/// precomputed travel matrices. Built once per run, read-only afterwards.
///
/// Location index layout: the depot is location 0, stop `i` is location
/// `i + 1`.
pub struct RoutingProblem {
    depot: Location,
    stops: Vec<Stop>,
    constraints: VehicleConstraints,
    matrix: TravelMatrix,
    max_trips: usize,
}

impl RoutingProblem {
    pub fn depot(&self) -> &Location {
        &self.depot
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop(&self, id: StopIdx) -> &Stop {
        &self.stops[id]
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn constraints(&self) -> &VehicleConstraints {
        &self.constraints
    }

    pub fn max_trips(&self) -> usize {
        self.max_trips
    }

    pub fn has_time_windows(&self) -> bool {
        self.stops.iter().any(|stop| stop.time_window().is_some())
    }

    pub fn has_priorities(&self) -> bool {
        self.stops.iter().any(|stop| !stop.priority().is_default())
    }

    pub fn total_demand(&self) -> u32 {
        self.stops.iter().map(Stop::demand).sum()
    }

    #[inline(always)]
    fn location_of(&self, stop: StopIdx) -> LocationIdx {
        LocationIdx::new(stop.get() + 1)
    }

    const DEPOT_LOCATION: LocationIdx = LocationIdx::new(0);

    #[inline(always)]
    pub fn distance_km(&self, from: StopIdx, to: StopIdx) -> f64 {
        self.matrix
            .distance_km(self.location_of(from), self.location_of(to))
    }

    #[inline(always)]
    pub fn depot_distance_km(&self, to: StopIdx) -> f64 {
        self.matrix
            .distance_km(Self::DEPOT_LOCATION, self.location_of(to))
    }

    #[inline(always)]
    pub fn travel_duration(&self, from: StopIdx, to: StopIdx) -> SignedDuration {
        self.matrix
            .travel_duration(self.location_of(from), self.location_of(to))
    }

    #[inline(always)]
    pub fn depot_travel_duration(&self, to: StopIdx) -> SignedDuration {
        self.matrix
            .travel_duration(Self::DEPOT_LOCATION, self.location_of(to))
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = StopIdx> + '_ {
        (0..self.stops.len()).map(StopIdx::new)
    }
}

pub struct RoutingProblemBuilder {
    depot: Option<Location>,
    stops: Vec<Stop>,
    constraints: Option<VehicleConstraints>,
    distance_method: DistanceMethod,
    max_trips: Option<usize>,
}

impl Default for RoutingProblemBuilder {
    fn default() -> Self {
        RoutingProblemBuilder {
            depot: None,
            stops: Vec::new(),
            constraints: None,
            distance_method: DistanceMethod::Haversine,
            max_trips: None,
        }
    }
}

impl RoutingProblemBuilder {
    pub fn set_depot(&mut self, depot: Location) -> &mut Self {
        self.depot = Some(depot);
        self
    }

    pub fn set_stops(&mut self, stops: Vec<Stop>) -> &mut Self {
        self.stops = stops;
        self
    }

    pub fn set_constraints(&mut self, constraints: VehicleConstraints) -> &mut Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn set_distance_method(&mut self, method: DistanceMethod) -> &mut Self {
        self.distance_method = method;
        self
    }

    /// Caps the number of depot round trips used by the fleet-capacity
    /// validation. Defaults to one trip per stop, which never rejects unless
    /// a single stop alone exceeds vehicle capacity.
    pub fn set_max_trips(&mut self, max_trips: usize) -> &mut Self {
        self.max_trips = Some(max_trips);
        self
    }

    pub fn build(self) -> Result<RoutingProblem, ValidationError> {
        if self.stops.is_empty() {
            return Err(ValidationError::EmptyStops);
        }

        let depot = self.depot.ok_or(ValidationError::InvalidCoordinate {
            id: "depot".to_owned(),
            lat: f64::NAN,
            lng: f64::NAN,
        })?;

        if !depot.is_valid() {
            return Err(ValidationError::InvalidCoordinate {
                id: "depot".to_owned(),
                lat: depot.lat(),
                lng: depot.lng(),
            });
        }

        for stop in &self.stops {
            if !stop.location().is_valid() {
                return Err(ValidationError::InvalidCoordinate {
                    id: stop.external_id().to_owned(),
                    lat: stop.location().lat(),
                    lng: stop.location().lng(),
                });
            }
        }

        let constraints = self.constraints.unwrap_or_default();

        for stop in &self.stops {
            if stop.demand() > constraints.max_demand() {
                return Err(ValidationError::StopExceedsCapacity {
                    id: stop.external_id().to_owned(),
                    demand: stop.demand(),
                    capacity: constraints.max_demand(),
                });
            }
        }

        let max_trips = self.max_trips.unwrap_or(self.stops.len()).max(1);
        let total_demand: u32 = self.stops.iter().map(Stop::demand).sum();
        let fleet_capacity = constraints.max_demand().saturating_mul(max_trips as u32);
        if total_demand > fleet_capacity {
            return Err(ValidationError::DemandExceedsFleetCapacity {
                demand: total_demand,
                capacity: fleet_capacity,
            });
        }

        let mut locations = Vec::with_capacity(self.stops.len() + 1);
        locations.push(depot);
        locations.extend(self.stops.iter().map(|stop| *stop.location()));

        let matrix = TravelMatrix::build(&locations, self.distance_method);

        Ok(RoutingProblem {
            depot,
            stops: self.stops,
            constraints,
            matrix,
            max_trips,
        })
    }
}
