//! Road graph acquisition: turns an OSM extract or a pair of CSV files into
//! candidate nodes carrying coordinates and a connectivity degree.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use fnv::FnvHashMap;
use geo_types::Point;
use hashbrown::HashSet;
use osmpbfreader::{OsmObj, OsmPbfReader, Tags};
use serde::Deserialize;

use crate::geo;

pub type NodeId = i64;

/// Highway classes a car can drive on.
const DRIVABLE_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
    "unclassified",
    "residential",
    "living_street",
    "service",
    "road",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub id: NodeId,
    pub point: Point,
    /// Incident directed edges, in + out.
    pub degree: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub from: NodeId,
    pub to: NodeId,
    /// Drivable in a single direction. Direction does not matter for degree.
    pub oneway: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

impl FromStr for BoundingBox {
    type Err = anyhow::Error;

    /// Parses `min_lat,min_lon,max_lat,max_lon`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("parsing bounding box {s:?}"))?;
        let [min_lat, min_lon, max_lat, max_lon] = parts[..] else {
            return Err(anyhow!(
                "bounding box needs 4 values (min_lat,min_lon,max_lat,max_lon), got {}",
                parts.len()
            ));
        };
        geo::validate_coords(min_lat, min_lon)?;
        geo::validate_coords(max_lat, max_lon)?;
        if min_lat > max_lat || min_lon > max_lon {
            return Err(anyhow!("bounding box minimum exceeds maximum: {s:?}"));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }
}

#[derive(Debug, Default)]
pub struct RoadGraph {
    /// Nodes touched by at least one edge, ordered by id.
    pub nodes: Vec<Candidate>,
    pub edge_count: usize,
}

impl RoadGraph {
    /// Builds the graph from node coordinates and street segments. Segments
    /// whose endpoints are unknown, identical, or at the same position are
    /// dropped.
    pub fn from_parts(coords: &FnvHashMap<NodeId, (f64, f64)>, segments: &[Segment]) -> Self {
        let mut degree: FnvHashMap<NodeId, usize> = FnvHashMap::default();
        let mut edge_count = 0;

        for s in segments {
            let (&(alat, alon), &(blat, blon)) = match (coords.get(&s.from), coords.get(&s.to)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            if s.from == s.to || geo::haversine_km(alat, alon, blat, blon) <= 0.0 {
                continue;
            }
            let directed = if s.oneway { 1 } else { 2 };
            *degree.entry(s.from).or_default() += directed;
            *degree.entry(s.to).or_default() += directed;
            edge_count += directed;
        }

        let mut nodes: Vec<Candidate> = degree
            .into_iter()
            .map(|(id, degree)| {
                let (lat, lon) = coords[&id];
                Candidate {
                    id,
                    point: geo::lat_lon(lat, lon),
                    degree,
                }
            })
            .collect();
        nodes.sort_by_key(|c| c.id);

        Self { nodes, edge_count }
    }

    /// Center of the bounding box spanned by the nodes.
    pub fn center(&self) -> Option<Point> {
        let first = self.nodes.first()?;
        let (mut min_lat, mut max_lat) = (first.point.y(), first.point.y());
        let (mut min_lon, mut max_lon) = (first.point.x(), first.point.x());
        for n in &self.nodes[1..] {
            min_lat = min_lat.min(n.point.y());
            max_lat = max_lat.max(n.point.y());
            min_lon = min_lon.min(n.point.x());
            max_lon = max_lon.max(n.point.x());
        }
        Some(geo::lat_lon((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0))
    }

    /// Reads drivable ways from an OSM `.pbf`, optionally clipped to `bbox`.
    pub fn from_pbf<P: AsRef<Path>>(path: P, bbox: Option<&BoundingBox>) -> Result<Self> {
        let path = path.as_ref();

        // Pass 1: collect drivable ways and the set of node ids they reference
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut pbf = OsmPbfReader::new(file);

        let mut needed_nodes: HashSet<NodeId> = HashSet::new();
        let mut segments: Vec<Segment> = Vec::new();
        let mut way_count = 0usize;

        for obj in pbf.iter() {
            let obj = obj.with_context(|| format!("reading ways from {}", path.display()))?;
            if let OsmObj::Way(w) = obj {
                if !is_way_drivable(&w.tags) {
                    continue;
                }
                way_count += 1;
                let oneway = is_oneway(&w.tags);
                for pair in w.nodes.windows(2) {
                    needed_nodes.insert(pair[0].0);
                    needed_nodes.insert(pair[1].0);
                    segments.push(Segment {
                        from: pair[0].0,
                        to: pair[1].0,
                        oneway,
                    });
                }
            }
        }

        log::info!(
            "Collected {} drivable ways; {} unique node refs",
            way_count,
            needed_nodes.len()
        );

        // Pass 2: read coordinates for needed nodes
        let file = File::open(path).with_context(|| format!("reopening {}", path.display()))?;
        let mut pbf = OsmPbfReader::new(file);

        let mut coords: FnvHashMap<NodeId, (f64, f64)> = FnvHashMap::default();
        for obj in pbf.iter() {
            let obj = obj.with_context(|| format!("reading nodes from {}", path.display()))?;
            if let OsmObj::Node(n) = obj {
                if !needed_nodes.contains(&n.id.0) {
                    continue;
                }
                let (lat, lon) = (n.lat(), n.lon());
                geo::validate_coords(lat, lon).with_context(|| format!("node {}", n.id.0))?;
                if bbox.map_or(true, |b| b.contains(lat, lon)) {
                    coords.insert(n.id.0, (lat, lon));
                }
            }
        }

        log::info!("Loaded coordinates for {} nodes", coords.len());

        let graph = Self::from_parts(&coords, &segments);
        log::info!(
            "Graph: {} nodes, {} directed edges",
            graph.nodes.len(),
            graph.edge_count
        );
        Ok(graph)
    }

    pub fn from_csv_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        nodes: P,
        edges: Q,
        bbox: Option<&BoundingBox>,
    ) -> Result<Self> {
        let (nodes, edges) = (nodes.as_ref(), edges.as_ref());
        let n = File::open(nodes).with_context(|| format!("opening {}", nodes.display()))?;
        let e = File::open(edges).with_context(|| format!("opening {}", edges.display()))?;
        Self::from_csv_readers(n, e, bbox)
    }

    /// Nodes: `node_id,lat,lon`. Edges: `from,to[,oneway]`.
    pub fn from_csv_readers<R: Read, S: Read>(
        nodes: R,
        edges: S,
        bbox: Option<&BoundingBox>,
    ) -> Result<Self> {
        let mut coords: FnvHashMap<NodeId, (f64, f64)> = FnvHashMap::default();
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(nodes);
        for (line, result) in rdr.deserialize::<NodeRecord>().enumerate() {
            let record = result.with_context(|| format!("nodes row {}", line + 1))?;
            geo::validate_coords(record.lat, record.lon)
                .with_context(|| format!("node {}", record.node_id))?;
            if bbox.map_or(true, |b| b.contains(record.lat, record.lon)) {
                coords.insert(record.node_id, (record.lat, record.lon));
            }
        }

        let mut segments = Vec::new();
        let mut skipped = 0usize;
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(edges);
        for (line, result) in rdr.deserialize::<EdgeRecord>().enumerate() {
            let record = result.with_context(|| format!("edges row {}", line + 1))?;
            if !coords.contains_key(&record.from) || !coords.contains_key(&record.to) {
                skipped += 1;
                continue;
            }
            let oneway = matches!(
                record.oneway.as_deref().map(str::trim),
                Some("true" | "1" | "yes" | "-1")
            );
            segments.push(Segment {
                from: record.from,
                to: record.to,
                oneway,
            });
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} edges referencing unknown or clipped nodes");
        }

        let graph = Self::from_parts(&coords, &segments);
        log::info!(
            "Graph: {} nodes, {} directed edges",
            graph.nodes.len(),
            graph.edge_count
        );
        Ok(graph)
    }
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    node_id: NodeId,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    from: NodeId,
    to: NodeId,
    oneway: Option<String>,
}

fn is_way_drivable(tags: &Tags) -> bool {
    let highway = match tags.get("highway") {
        Some(v) => v.as_str(),
        None => return false,
    };
    if !DRIVABLE_HIGHWAYS.contains(&highway) {
        return false;
    }
    // Exclude areas and closed roads
    if tags.get("area").map(|v| v == "yes").unwrap_or(false) {
        return false;
    }
    !matches!(
        tags.get("access").map(|v| v.as_str()),
        Some("no" | "private")
    )
}

fn is_oneway(tags: &Tags) -> bool {
    if let Some(v) = tags.get("oneway") {
        if matches!(v.as_str(), "yes" | "true" | "1" | "-1") {
            return true;
        }
    }
    if tags
        .get("junction")
        .map(|v| v == "roundabout")
        .unwrap_or(false)
    {
        return true;
    }
    false
}
