use jiff::SignedDuration;
use serde::Serialize;

/// Per-tour limits, shared by every tour in a run (single vehicle profile).
///
/// Only demand, stop count and duration are enforced by the search; weight
/// and volume are derived figures carried through for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct VehicleConstraints {
    max_demand: u32,
    max_stops: usize,
    max_duration: SignedDuration,
    max_weight_kg: f64,
    max_volume_l: f64,
}

/// Weight of one full bottle in kilograms, volume in liters.
const BOTTLE_WEIGHT_KG: f64 = 14.2;
const BOTTLE_VOLUME_L: f64 = 11.3;

impl VehicleConstraints {
    pub fn new(max_demand: u32, max_stops: usize, max_duration: SignedDuration) -> Self {
        VehicleConstraints {
            max_demand,
            max_stops,
            max_duration,
            max_weight_kg: max_demand as f64 * BOTTLE_WEIGHT_KG,
            max_volume_l: max_demand as f64 * BOTTLE_VOLUME_L,
        }
    }

    pub fn max_demand(&self) -> u32 {
        self.max_demand
    }

    pub fn max_stops(&self) -> usize {
        self.max_stops
    }

    pub fn max_duration(&self) -> SignedDuration {
        self.max_duration
    }

    pub fn max_weight_kg(&self) -> f64 {
        self.max_weight_kg
    }

    pub fn max_volume_l(&self) -> f64 {
        self.max_volume_l
    }
}

impl Default for VehicleConstraints {
    /// The canonical delivery van: 80 bottles per trip, 50 stops, 8 hours.
    fn default() -> Self {
        VehicleConstraints::new(80, 50, SignedDuration::from_hours(8))
    }
}
