use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use geo_types::Point;
use ordered_float::OrderedFloat;

use crate::geo;
use crate::graph::NodeId;
use crate::selector::Station;

#[derive(Debug, PartialEq)]
pub struct Summary {
    pub stations: usize,
    pub max_distance_km: f64,
    pub mean_distance_km: f64,
    /// Node id of the station farthest from the midpoint.
    pub farthest: Option<NodeId>,
}

pub fn summary(stations: &[Station], midpoint: &Point) -> Summary {
    let distances: Vec<(NodeId, f64)> = stations
        .iter()
        .map(|s| (s.node_id, geo::distance_km(&s.point, midpoint)))
        .collect();
    let farthest = distances
        .iter()
        .max_by_key(|(_, d)| OrderedFloat(*d))
        .copied();
    let mean_distance_km = if distances.is_empty() {
        0.0
    } else {
        distances.iter().map(|(_, d)| d).sum::<f64>() / distances.len() as f64
    };

    Summary {
        stations: stations.len(),
        max_distance_km: farthest.map(|(_, d)| d).unwrap_or(0.0),
        mean_distance_km,
        farthest: farthest.map(|(id, _)| id),
    }
}

pub fn write_stations_csv<P: AsRef<Path>>(
    path: P,
    stations: &[Station],
    midpoint: &Point,
) -> Result<()> {
    let path = path.as_ref();
    let wtr = Writer::from_path(path).with_context(|| format!("creating CSV {}", path.display()))?;
    write_stations(wtr, stations, midpoint)
}

fn write_stations<W: Write>(mut wtr: Writer<W>, stations: &[Station], midpoint: &Point) -> Result<()> {
    wtr.write_record([
        "rank",
        "node_id",
        "lat",
        "lon",
        "degree",
        "distance_to_midpoint_km",
    ])?;
    for (rank, s) in stations.iter().enumerate() {
        wtr.write_record(&[
            (rank + 1).to_string(),
            s.node_id.to_string(),
            format!("{:.7}", s.point.y()),
            format!("{:.7}", s.point.x()),
            s.degree.to_string(),
            format!("{:.6}", geo::distance_km(&s.point, midpoint)),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::lat_lon;

    fn stations() -> Vec<Station> {
        vec![
            Station {
                node_id: 1,
                point: lat_lon(0.0, 0.0),
                degree: 5,
            },
            Station {
                node_id: 3,
                point: lat_lon(0.0, 10.0),
                degree: 3,
            },
        ]
    }

    #[test]
    fn summarises_distances_to_midpoint() {
        let s = summary(&stations(), &lat_lon(0.0, 2.0));
        assert_eq!(s.stations, 2);
        assert_eq!(s.farthest, Some(3));
        assert!((s.max_distance_km - 8.0 * 111.195).abs() < 0.1);
        assert!((s.mean_distance_km - 5.0 * 111.195).abs() < 0.1);
    }

    #[test]
    fn empty_summary() {
        let s = summary(&[], &lat_lon(0.0, 0.0));
        assert_eq!(
            s,
            Summary {
                stations: 0,
                max_distance_km: 0.0,
                mean_distance_km: 0.0,
                farthest: None
            }
        );
    }

    #[test]
    fn writes_one_row_per_station() {
        let mut buf = Vec::new();
        write_stations(Writer::from_writer(&mut buf), &stations(), &lat_lon(0.0, 5.0)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "rank,node_id,lat,lon,degree,distance_to_midpoint_km");
        assert!(lines[1].starts_with("1,1,0.0000000,0.0000000,5,555.97"));
        assert!(lines[2].starts_with("2,3,0.0000000,10.0000000,3,555.97"));
    }
}
