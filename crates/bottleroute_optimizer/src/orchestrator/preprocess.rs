use jiff::SignedDuration;
use rstar::{RTree, primitives::GeomWithData};
use tracing::warn;

use crate::problem::{
    geometry::DistanceCache,
    location::Location,
    stop::{Priority, Stop, StopBuilder},
    time_window::TimeWindow,
};

use super::request::StopSpec;

/// Stops within this distance are considered one neighborhood during
/// ordering.
const CLUSTER_RADIUS_KM: f64 = 1.5;
/// Degree-space prefilter radius for the R-tree lookup, generous enough to
/// cover [`CLUSTER_RADIUS_KM`] at any latitude the depot plausibly sits at.
const CLUSTER_RADIUS_DEG: f64 = 0.02;

/// Normalizes raw stop specs into solver stops: clamps priorities, drops
/// inverted time windows, then orders by priority with nearby stops kept
/// adjacent so the constructors see them together.
pub fn normalize_stops(specs: &[StopSpec]) -> Vec<Stop> {
    let stops: Vec<Stop> = specs.iter().map(build_stop).collect();

    let clusters = cluster_labels(&stops);
    let mut order: Vec<usize> = (0..stops.len()).collect();
    order.sort_by(|&a, &b| {
        stops[a]
            .priority()
            .level()
            .cmp(&stops[b].priority().level())
            .then(clusters[a].cmp(&clusters[b]))
            .then(stops[b].demand().cmp(&stops[a].demand()))
    });

    order.into_iter().map(|index| stops[index].clone()).collect()
}

fn build_stop(spec: &StopSpec) -> Stop {
    let mut builder = StopBuilder::default();
    builder.set_external_id(spec.id.clone());
    builder.set_location(Location::new(spec.lat, spec.lng));
    builder.set_demand(spec.demand);

    if let Some(level) = spec.priority {
        builder.set_priority(Priority::new(level));
    }

    if let Some((start, end)) = spec.time_window_mins {
        match TimeWindow::from_minutes(start, end) {
            Some(window) => {
                builder.set_time_window(window);
            }
            None => {
                warn!(
                    stop = %spec.id,
                    start, end, "dropping inverted time window"
                );
            }
        }
    }

    if let Some(mins) = spec.service_mins {
        builder.set_service_duration(SignedDuration::from_mins(mins));
    }

    builder.build()
}

/// Flood-fill proximity clustering: R-tree prefilter in degree space, exact
/// haversine check through a [`DistanceCache`]. Labels are only an ordering
/// hint; they carry no semantics beyond "these stops are close together".
fn cluster_labels(stops: &[Stop]) -> Vec<usize> {
    let tree: RTree<GeomWithData<[f64; 2], usize>> = RTree::bulk_load(
        stops
            .iter()
            .enumerate()
            .map(|(index, stop)| {
                GeomWithData::new([stop.location().lat(), stop.location().lng()], index)
            })
            .collect(),
    );

    let mut cache = DistanceCache::new();
    let mut labels = vec![usize::MAX; stops.len()];
    let mut next_label = 0;

    for start in 0..stops.len() {
        if labels[start] != usize::MAX {
            continue;
        }

        let mut frontier = vec![start];
        while let Some(index) = frontier.pop() {
            if labels[index] != usize::MAX {
                continue;
            }
            labels[index] = next_label;

            let here = stops[index].location();
            for neighbor in tree.locate_within_distance(
                [here.lat(), here.lng()],
                CLUSTER_RADIUS_DEG * CLUSTER_RADIUS_DEG,
            ) {
                if labels[neighbor.data] == usize::MAX
                    && cache.distance_km(here, stops[neighbor.data].location())
                        <= CLUSTER_RADIUS_KM
                {
                    frontier.push(neighbor.data);
                }
            }
        }

        next_label += 1;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::request::StopSpec;

    fn spec(id: &str, lat: f64, lng: f64, demand: u32, priority: Option<u8>) -> StopSpec {
        StopSpec {
            id: id.into(),
            lat,
            lng,
            demand,
            priority,
            time_window_mins: None,
            service_mins: None,
        }
    }

    #[test]
    fn test_priority_orders_first() {
        let stops = normalize_stops(&[
            spec("low", 48.15, 11.58, 10, Some(5)),
            spec("high", 48.30, 11.80, 10, Some(1)),
            spec("mid", 48.20, 11.65, 10, None),
        ]);

        assert_eq!(stops[0].external_id(), "high");
        assert_eq!(stops[1].external_id(), "mid");
        assert_eq!(stops[2].external_id(), "low");
    }

    #[test]
    fn test_inverted_window_dropped() {
        let mut bad = spec("A-1", 48.15, 11.58, 10, None);
        bad.time_window_mins = Some((120, 60));

        let stops = normalize_stops(&[bad]);

        assert!(stops[0].time_window().is_none());
    }

    #[test]
    fn test_valid_window_kept() {
        let mut good = spec("A-1", 48.15, 11.58, 10, None);
        good.time_window_mins = Some((60, 120));

        let stops = normalize_stops(&[good]);

        assert!(stops[0].time_window().is_some());
    }

    #[test]
    fn test_out_of_range_priority_clamped() {
        let stops = normalize_stops(&[spec("A-1", 48.15, 11.58, 10, Some(9))]);
        assert_eq!(stops[0].priority(), Priority::LOWEST);
    }

    #[test]
    fn test_nearby_stops_stay_adjacent() {
        // Two tight pairs far apart, all same priority
        let stops = normalize_stops(&[
            spec("north-1", 48.30, 11.60, 10, None),
            spec("south-1", 48.05, 11.60, 10, None),
            spec("north-2", 48.301, 11.601, 10, None),
            spec("south-2", 48.051, 11.601, 10, None),
        ]);

        let ids: Vec<&str> = stops.iter().map(Stop::external_id).collect();
        let north_positions: Vec<usize> = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| id.starts_with("north"))
            .map(|(position, _)| position)
            .collect();

        assert_eq!(north_positions[1] - north_positions[0], 1);
    }
}
