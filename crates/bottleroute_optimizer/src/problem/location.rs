use geo::{Bearing, Haversine};
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// Mean earth radius used for all internal cost comparisons. Every distance
/// the search engines compare comes from the same spherical model so tours
/// stay comparable across operators.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// WGS-84 ellipsoid, used only by the Vincenty variant.
const WGS84_A_KM: f64 = 6378.137;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

const VINCENTY_MAX_ITERATIONS: usize = 100;
const VINCENTY_TOLERANCE: f64 = 1e-12;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    lat: f64,
    lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Location { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in kilometers on a spherical earth.
    pub fn haversine_km(&self, to: &Location) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = to.lat.to_radians();
        let dlat = (to.lat - self.lat).to_radians();
        let dlng = (to.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    /// Ellipsoidal distance in kilometers (Vincenty inverse formula).
    ///
    /// Higher precision than [`haversine_km`](Self::haversine_km) on long
    /// legs. Falls back to haversine when the iteration does not converge
    /// within the cap or the points are coincident/antipodal enough to make
    /// the solver degenerate.
    pub fn vincenty_km(&self, to: &Location) -> f64 {
        if self == to {
            return 0.0;
        }

        let b = WGS84_A_KM * (1.0 - WGS84_F);

        let u1 = ((1.0 - WGS84_F) * self.lat.to_radians().tan()).atan();
        let u2 = ((1.0 - WGS84_F) * to.lat.to_radians().tan()).atan();
        let l = (to.lng - self.lng).to_radians();

        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut iterations = 0;

        loop {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();

            if sin_sigma == 0.0 {
                // Coincident points
                return 0.0;
            }

            let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            let sigma = sin_sigma.atan2(cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;

            let cos_2sigma_m = if cos_sq_alpha == 0.0 {
                // Equatorial line
                0.0
            } else {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            };

            let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
            let previous_lambda = lambda;
            lambda = l
                + (1.0 - c)
                    * WGS84_F
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m
                                + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

            if (lambda - previous_lambda).abs() <= VINCENTY_TOLERANCE {
                let u_sq = cos_sq_alpha * (WGS84_A_KM * WGS84_A_KM - b * b) / (b * b);
                let a_coef =
                    1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
                let b_coef = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

                let delta_sigma = b_coef
                    * sin_sigma
                    * (cos_2sigma_m
                        + b_coef / 4.0
                            * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                                - b_coef / 6.0
                                    * cos_2sigma_m
                                    * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                    * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

                return b * a_coef * (sigma - delta_sigma);
            }

            iterations += 1;
            if iterations >= VINCENTY_MAX_ITERATIONS {
                return self.haversine_km(to);
            }
        }
    }

    /// Sum of the north-south and east-west great-circle components.
    /// Diagnostics only, never used for search costs.
    pub fn manhattan_km(&self, to: &Location) -> f64 {
        let lat_leg = Location::new(self.lat, self.lng).haversine_km(&Location::new(to.lat, self.lng));
        let lng_leg = Location::new(to.lat, self.lng).haversine_km(&Location::new(to.lat, to.lng));
        lat_leg + lng_leg
    }

    /// Initial great-circle bearing in degrees from north.
    pub fn bearing_deg(&self, to: &Location) -> f64 {
        let haversine = Haversine;
        haversine.bearing(geo::Point::from(self), geo::Point::from(to))
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        geo::Point::new(location.lng, location.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUNICH: Location = Location {
        lat: 48.1375,
        lng: 11.5755,
    };
    const BERLIN: Location = Location {
        lat: 52.5200,
        lng: 13.4050,
    };

    #[test]
    fn test_haversine_identity() {
        assert_eq!(MUNICH.haversine_km(&MUNICH), 0.0);
    }

    #[test]
    fn test_haversine_symmetry() {
        assert_eq!(MUNICH.haversine_km(&BERLIN), BERLIN.haversine_km(&MUNICH));
    }

    #[test]
    fn test_haversine_munich_berlin() {
        let distance = MUNICH.haversine_km(&BERLIN);
        assert!(
            (distance - 504.0).abs() < 5.0,
            "expected ~504km, got {distance}"
        );
    }

    #[test]
    fn test_vincenty_close_to_haversine() {
        let haversine = MUNICH.haversine_km(&BERLIN);
        let vincenty = MUNICH.vincenty_km(&BERLIN);
        // Ellipsoidal correction stays below 1% on this leg
        assert!((haversine - vincenty).abs() / haversine < 0.01);
    }

    #[test]
    fn test_vincenty_coincident_points() {
        assert_eq!(MUNICH.vincenty_km(&MUNICH), 0.0);
    }

    #[test]
    fn test_manhattan_at_least_great_circle() {
        assert!(MUNICH.manhattan_km(&BERLIN) >= MUNICH.haversine_km(&BERLIN));
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(MUNICH.is_valid());
        assert!(!Location::new(91.0, 0.0).is_valid());
        assert!(!Location::new(0.0, 181.0).is_valid());
        assert!(!Location::new(f64::NAN, 0.0).is_valid());
    }
}
