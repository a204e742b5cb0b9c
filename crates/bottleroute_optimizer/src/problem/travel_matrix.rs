use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::location::{Location, LocationIdx};

pub type Distance = f64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DistanceMethod {
    #[default]
    Haversine,
    Vincenty,
}

/// Average speed bucketed by leg length, in km/h. Short urban hops crawl,
/// long legs approach highway speed. Approximates door-to-door travel time
/// without a road network.
fn estimated_speed_kmh(distance_km: f64) -> f64 {
    if distance_km < 1.0 {
        15.0
    } else if distance_km < 5.0 {
        25.0
    } else if distance_km < 20.0 {
        35.0
    } else if distance_km < 50.0 {
        45.0
    } else {
        55.0
    }
}

/// Flat N×N matrices of distances and estimated travel durations.
///
/// `index = from * num_locations + to`. Symmetric by construction since both
/// distance methods are symmetric.
pub struct TravelMatrix {
    distances: Vec<Distance>,
    durations: Vec<SignedDuration>,
    num_locations: usize,
}

impl TravelMatrix {
    pub fn build(locations: &[Location], method: DistanceMethod) -> Self {
        let num_locations = locations.len();
        let mut distances = vec![0.0; num_locations * num_locations];
        let mut durations = vec![SignedDuration::ZERO; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            // Fill the upper triangle and mirror it
            for (j, to) in locations.iter().enumerate().skip(i + 1) {
                let distance = match method {
                    DistanceMethod::Haversine => from.haversine_km(to),
                    DistanceMethod::Vincenty => from.vincenty_km(to),
                };

                let duration =
                    SignedDuration::from_secs_f64(distance / estimated_speed_kmh(distance) * 3600.0);

                distances[i * num_locations + j] = distance;
                distances[j * num_locations + i] = distance;
                durations[i * num_locations + j] = duration;
                durations[j * num_locations + i] = duration;
            }
        }

        TravelMatrix {
            distances,
            durations,
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn distance_km(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn travel_duration(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        self.durations[self.index(from, to)]
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_buckets() {
        assert_eq!(estimated_speed_kmh(0.5), 15.0);
        assert_eq!(estimated_speed_kmh(3.0), 25.0);
        assert_eq!(estimated_speed_kmh(10.0), 35.0);
        assert_eq!(estimated_speed_kmh(30.0), 45.0);
        assert_eq!(estimated_speed_kmh(120.0), 55.0);
    }

    #[test]
    fn test_matrix_symmetry_and_zero_diagonal() {
        let locations = vec![
            Location::new(48.1375, 11.5755),
            Location::new(48.2000, 11.6000),
            Location::new(48.0500, 11.4000),
        ];

        let matrix = TravelMatrix::build(&locations, DistanceMethod::Haversine);

        for i in 0..locations.len() {
            let i = LocationIdx::new(i);
            assert_eq!(matrix.distance_km(i, i), 0.0);
            for j in 0..locations.len() {
                let j = LocationIdx::new(j);
                assert_eq!(matrix.distance_km(i, j), matrix.distance_km(j, i));
            }
        }
    }

    #[test]
    fn test_duration_uses_bucketed_speed() {
        let locations = vec![
            Location::new(48.1375, 11.5755),
            Location::new(52.5200, 13.4050),
        ];

        let matrix = TravelMatrix::build(&locations, DistanceMethod::Haversine);
        let from = LocationIdx::new(0);
        let to = LocationIdx::new(1);

        let distance = matrix.distance_km(from, to);
        let expected_hours = distance / 55.0;
        let actual_hours = matrix.travel_duration(from, to).as_secs_f64() / 3600.0;

        assert!((expected_hours - actual_hours).abs() < 1e-9);
    }
}
