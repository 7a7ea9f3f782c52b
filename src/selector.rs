//! Greedy selection of well-connected, mutually separated sites.

use std::cmp::Reverse;

use geo_types::Point;

use crate::error::PlacementError;
use crate::geo;
use crate::graph::{Candidate, NodeId};

pub const DEFAULT_NUM_STATIONS: usize = 10;
pub const DEFAULT_MIN_DIST_KM: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionConfig {
    pub num_stations: usize,
    pub min_dist_km: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            num_stations: DEFAULT_NUM_STATIONS,
            min_dist_km: DEFAULT_MIN_DIST_KM,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), PlacementError> {
        if self.num_stations == 0 {
            return Err(PlacementError::InvalidParameter {
                name: "num_stations",
                value: self.num_stations.to_string(),
            });
        }
        if !self.min_dist_km.is_finite() || self.min_dist_km < 0.0 {
            return Err(PlacementError::InvalidParameter {
                name: "min_dist_km",
                value: self.min_dist_km.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub node_id: NodeId,
    pub point: Point,
    pub degree: usize,
}

/// Visits candidates by degree (highest first, ties broken by lowest node id)
/// and keeps each one that lies at least `min_dist_km` from every station kept
/// so far, until `num_stations` are kept or candidates run out. Kept points
/// are always distinct.
pub fn select_stations(
    candidates: &[Candidate],
    config: &SelectionConfig,
) -> Result<Vec<Station>, PlacementError> {
    config.validate()?;

    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    ranked.sort_by_key(|c| (Reverse(c.degree), c.id));

    let mut stations: Vec<Station> = Vec::with_capacity(config.num_stations);
    for c in ranked {
        if stations.len() >= config.num_stations {
            break;
        }
        // Coincident nodes stay out even when the separation is zero.
        let far_enough = stations.iter().all(|s| {
            s.point != c.point && geo::distance_km(&c.point, &s.point) >= config.min_dist_km
        });
        if far_enough {
            log::debug!("Accepted node {} (degree {})", c.id, c.degree);
            stations.push(Station {
                node_id: c.id,
                point: c.point,
                degree: c.degree,
            });
        }
    }

    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::lat_lon;

    fn candidate(id: NodeId, lat: f64, lon: f64, degree: usize) -> Candidate {
        Candidate {
            id,
            point: lat_lon(lat, lon),
            degree,
        }
    }

    fn coords(stations: &[Station]) -> Vec<(f64, f64)> {
        stations.iter().map(|s| (s.point.y(), s.point.x())).collect()
    }

    #[test]
    fn defaults() {
        let config = SelectionConfig::default();
        assert_eq!(config.num_stations, 10);
        assert_eq!(config.min_dist_km, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_parameters() {
        let zero = SelectionConfig {
            num_stations: 0,
            ..Default::default()
        };
        assert!(matches!(
            select_stations(&[], &zero),
            Err(PlacementError::InvalidParameter {
                name: "num_stations",
                ..
            })
        ));

        for min_dist_km in [-0.1, f64::NAN, f64::INFINITY] {
            let config = SelectionConfig {
                min_dist_km,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PlacementError::InvalidParameter {
                    name: "min_dist_km",
                    ..
                })
            ));
        }
    }

    #[test]
    fn skips_candidates_too_close_to_a_kept_station() {
        let candidates = [
            candidate(1, 0.0, 0.0, 5),
            candidate(2, 0.0, 1.0, 4),
            candidate(3, 0.0, 10.0, 3),
        ];
        let config = SelectionConfig {
            num_stations: 2,
            min_dist_km: 200.0,
        };
        let stations = select_stations(&candidates, &config).unwrap();
        assert_eq!(coords(&stations), vec![(0.0, 0.0), (0.0, 10.0)]);
    }

    #[test]
    fn stops_at_num_stations() {
        let candidates = [
            candidate(1, 0.0, 0.0, 5),
            candidate(2, 0.0, 1.0, 4),
            candidate(3, 0.0, 10.0, 3),
        ];
        let config = SelectionConfig {
            num_stations: 2,
            min_dist_km: 50.0,
        };
        let stations = select_stations(&candidates, &config).unwrap();
        assert_eq!(coords(&stations), vec![(0.0, 0.0), (0.0, 1.0)]);
    }

    #[test]
    fn single_candidate() {
        let stations =
            select_stations(&[candidate(7, 51.5, -0.1, 1)], &SelectionConfig::default()).unwrap();
        assert_eq!(coords(&stations), vec![(51.5, -0.1)]);
        assert_eq!(stations[0].node_id, 7);
    }

    #[test]
    fn empty_input_gives_empty_selection() {
        let stations = select_stations(&[], &SelectionConfig::default()).unwrap();
        assert!(stations.is_empty());
    }

    #[test]
    fn ties_resolve_by_node_id() {
        let candidates = [
            candidate(30, 0.0, 0.0, 4),
            candidate(10, 0.0, 0.001, 4),
            candidate(20, 0.0, 0.002, 4),
        ];
        let config = SelectionConfig {
            num_stations: 1,
            min_dist_km: 0.0,
        };
        let stations = select_stations(&candidates, &config).unwrap();
        assert_eq!(stations[0].node_id, 10);

        let mut reversed = candidates.clone();
        reversed.reverse();
        let again = select_stations(&reversed, &config).unwrap();
        assert_eq!(stations, again);
    }

    #[test]
    fn coincident_candidates_are_kept_once() {
        let candidates = [
            candidate(1, 10.0, 10.0, 3),
            candidate(2, 10.0, 10.0, 2),
            candidate(3, 10.0, 10.001, 1),
        ];
        let config = SelectionConfig {
            num_stations: 10,
            min_dist_km: 0.0,
        };
        let stations = select_stations(&candidates, &config).unwrap();
        let ids: Vec<NodeId> = stations.iter().map(|s| s.node_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn kept_stations_respect_separation_and_count() {
        // 20 x 20 grid, ~0.11 km spacing, degree varies across the grid.
        let candidates: Vec<Candidate> = (0..400)
            .map(|i| {
                let (row, col) = (i / 20, i % 20);
                candidate(
                    i,
                    48.0 + row as f64 * 0.001,
                    2.0 + col as f64 * 0.001,
                    ((row * 7 + col * 3) % 11) as usize,
                )
            })
            .collect();

        for (num_stations, min_dist_km) in [(10, 0.5), (50, 0.3), (3, 5.0), (400, 0.0)] {
            let config = SelectionConfig {
                num_stations,
                min_dist_km,
            };
            let stations = select_stations(&candidates, &config).unwrap();
            assert!(!stations.is_empty());
            assert!(stations.len() <= num_stations);
            for (i, a) in stations.iter().enumerate() {
                for b in &stations[i + 1..] {
                    assert!(geo::distance_km(&a.point, &b.point) >= min_dist_km - 1e-9);
                }
            }
        }

        // A huge separation leaves room for the first pick only.
        let config = SelectionConfig {
            num_stations: 10,
            min_dist_km: 1_000.0,
        };
        assert_eq!(select_stations(&candidates, &config).unwrap().len(), 1);
    }
}
