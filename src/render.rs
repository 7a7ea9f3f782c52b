//! Map document: GeoJSON of stations, midpoint and links, wrapped in a
//! Leaflet page.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo_types::{Geometry, LineString, Point};
use serde::Serialize;

use crate::geo;
use crate::graph::NodeId;
use crate::selector::Station;

pub const HTML_FILE: &str = "station_map.html";
pub const GEOJSON_FILE: &str = "stations.geojson";
pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum FeatureKind {
    Station,
    Midpoint,
    Link,
}

#[derive(Serialize)]
struct MapFeature {
    #[serde(serialize_with = "geojson::ser::serialize_geometry")]
    geometry: Geometry,
    kind: FeatureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    degree: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length_km: Option<f64>,
}

pub struct MapDocument<'a> {
    pub title: String,
    pub center: Point,
    pub stations: &'a [Station],
    pub midpoint: Point,
}

/// Rendered page and the GeoJSON it embeds.
#[derive(Clone, Debug)]
pub struct RenderedMap {
    pub html: String,
    pub geojson: String,
}

impl<'a> MapDocument<'a> {
    pub fn new(title: impl Into<String>, center: Point, stations: &'a [Station], midpoint: Point) -> Self {
        Self {
            title: title.into(),
            center,
            stations,
            midpoint,
        }
    }

    fn features(&self) -> Vec<MapFeature> {
        let mut features = Vec::with_capacity(self.stations.len() * 2 + 1);

        for (rank, s) in self.stations.iter().enumerate() {
            features.push(MapFeature {
                geometry: Geometry::Point(s.point),
                kind: FeatureKind::Station,
                rank: Some(rank + 1),
                node_id: Some(s.node_id),
                degree: Some(s.degree),
                distance_km: Some(geo::distance_km(&s.point, &self.midpoint)),
                length_km: None,
            });
        }

        features.push(MapFeature {
            geometry: Geometry::Point(self.midpoint),
            kind: FeatureKind::Midpoint,
            rank: None,
            node_id: None,
            degree: None,
            distance_km: None,
            length_km: None,
        });

        for (rank, s) in self.stations.iter().enumerate() {
            features.push(MapFeature {
                geometry: Geometry::LineString(LineString::from(vec![s.point, self.midpoint])),
                kind: FeatureKind::Link,
                rank: Some(rank + 1),
                node_id: Some(s.node_id),
                degree: None,
                distance_km: None,
                length_km: Some(geo::distance_km(&s.point, &self.midpoint)),
            });
        }

        features
    }

    pub fn to_geojson(&self) -> Result<String> {
        let features = self.features();
        geojson::ser::to_feature_collection_string(&features).context("Failed to serialize")
    }

    pub fn to_html(&self, geojson: &str) -> String {
        MAP_HTML
            .replace("{{TITLE}}", &escape_html(&self.title))
            .replace("{{CENTER_LAT}}", &self.center.y().to_string())
            .replace("{{CENTER_LON}}", &self.center.x().to_string())
            .replace("{{ZOOM}}", &DEFAULT_ZOOM.to_string())
            .replace("{{GEOJSON}}", geojson)
    }

    pub fn render(&self) -> Result<RenderedMap> {
        let geojson = self.to_geojson()?;
        let html = self.to_html(&geojson);
        Ok(RenderedMap { html, geojson })
    }
}

impl RenderedMap {
    /// Writes the page and the GeoJSON into `dir`, returning the page path.
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let html_path = dir.join(HTML_FILE);
        fs::write(&html_path, &self.html)
            .with_context(|| format!("writing {}", html_path.display()))?;
        let geojson_path = dir.join(GEOJSON_FILE);
        fs::write(&geojson_path, &self.geojson)
            .with_context(|| format!("writing {}", geojson_path.display()))?;

        Ok(html_path)
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const MAP_HTML: &str = r#"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous"
    referrerpolicy="no-referrer" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"
    referrerpolicy="no-referrer"></script>

  <style>
    html, body { height: 100%; margin: 0; }
    #map { position: absolute; inset: 0; }
    .map-title {
      position: absolute; top: 10px; left: 50px; z-index: 1000;
      padding: 4px 10px; background: rgba(255, 255, 255, 0.9);
      font: 600 14px system-ui, sans-serif; border-radius: 4px;
    }
  </style>
</head>

<body>
  <div id="map"></div>
  <div class="map-title">{{TITLE}}</div>
  <script>
    const data = {{GEOJSON}};

    const map = L.map('map').setView([{{CENTER_LAT}}, {{CENTER_LON}}], {{ZOOM}});
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: 19,
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);

    const layer = L.geoJSON(data, {
      filter: f => f.properties.kind !== 'link',
      pointToLayer: (f, latlng) => f.properties.kind === 'midpoint'
        ? L.circleMarker(latlng, {radius: 10, color: '#b91c1c', fillColor: '#ef4444', fillOpacity: 0.9})
        : L.marker(latlng),
      onEachFeature: (f, l) => {
        const p = f.properties;
        if (p.kind === 'midpoint') {
          l.bindPopup('Optimal Midpoint');
        } else {
          l.bindPopup(`Base Station #${p.rank}<br>node ${p.node_id}, degree ${p.degree}<br>${p.distance_km.toFixed(2)} km to midpoint`);
        }
      }
    });

    L.geoJSON(data, {
      filter: f => f.properties.kind === 'link',
      style: () => ({color: 'green', weight: 3})
    }).addTo(map);
    layer.addTo(map);
  </script>
</body>

</html>
"#;
