use fxhash::FxHashMap;

use super::location::Location;

/// Geographic centroid via 3D unit-sphere averaging.
///
/// Naive lat/lng averaging breaks near the antimeridian and the poles, so
/// the points are converted to Cartesian unit vectors, averaged, and
/// converted back.
pub fn centroid(locations: &[Location]) -> Option<Location> {
    if locations.is_empty() {
        return None;
    }

    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for location in locations {
        let lat = location.lat().to_radians();
        let lng = location.lng().to_radians();
        x += lat.cos() * lng.cos();
        y += lat.cos() * lng.sin();
        z += lat.sin();
    }

    let n = locations.len() as f64;
    x /= n;
    y /= n;
    z /= n;

    let hyp = (x * x + y * y).sqrt();
    Some(Location::new(
        z.atan2(hyp).to_degrees(),
        y.atan2(x).to_degrees(),
    ))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

pub fn bounding_box(locations: &[Location]) -> Option<BoundingBox> {
    let first = locations.first()?;

    let mut bbox = BoundingBox {
        min_lat: first.lat(),
        min_lng: first.lng(),
        max_lat: first.lat(),
        max_lng: first.lng(),
    };

    for location in &locations[1..] {
        bbox.min_lat = bbox.min_lat.min(location.lat());
        bbox.min_lng = bbox.min_lng.min(location.lng());
        bbox.max_lat = bbox.max_lat.max(location.lat());
        bbox.max_lng = bbox.max_lng.max(location.lng());
    }

    Some(bbox)
}

/// Per-run haversine memoization keyed by the exact coordinate bit patterns.
///
/// Safe because stop coordinates are immutable for the lifetime of a run;
/// the cache is owned by a single run and never shared across runs.
#[derive(Default)]
pub struct DistanceCache {
    entries: FxHashMap<(u64, u64, u64, u64), f64>,
}

impl DistanceCache {
    pub fn new() -> Self {
        DistanceCache::default()
    }

    pub fn distance_km(&mut self, from: &Location, to: &Location) -> f64 {
        let key = (
            from.lat().to_bits(),
            from.lng().to_bits(),
            to.lat().to_bits(),
            to.lng().to_bits(),
        );

        *self
            .entries
            .entry(key)
            .or_insert_with(|| from.haversine_km(to))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
