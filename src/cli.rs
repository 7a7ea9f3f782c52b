//! Command-line options shared by both binaries, and the pipeline they drive:
//! select, compute the midpoint, render, export, serve.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use geo_types::Point;

use crate::graph::{BoundingBox, RoadGraph};
use crate::midpoint::midpoint;
use crate::render::MapDocument;
use crate::report::{summary, write_stations_csv};
use crate::selector::{select_stations, SelectionConfig, DEFAULT_MIN_DIST_KM, DEFAULT_NUM_STATIONS};
use crate::server::{open_in_browser, spawn_map_server, ServeConfig};

#[derive(Args, Debug)]
pub struct SelectionArgs {
    /// Number of stations to place
    #[arg(short, long, default_value_t = DEFAULT_NUM_STATIONS)]
    pub num_stations: usize,

    /// Minimum distance between any two stations, in kilometers
    #[arg(short = 'd', long, default_value_t = DEFAULT_MIN_DIST_KM)]
    pub min_dist_km: f64,

    /// Only consider nodes inside min_lat,min_lon,max_lat,max_lon
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,
}

impl SelectionArgs {
    pub fn config(&self) -> SelectionConfig {
        SelectionConfig {
            num_stations: self.num_stations,
            min_dist_km: self.min_dist_km,
        }
    }
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Place name shown as the map title
    #[arg(long)]
    pub place: Option<String>,

    /// Directory for station_map.html and stations.geojson. Defaults to a
    /// fresh directory under the system temp dir.
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Also write the selected stations as CSV
    #[arg(long)]
    pub stations_csv: Option<PathBuf>,

    /// Write the files and exit without serving them
    #[arg(long, default_value_t = false)]
    pub no_serve: bool,

    #[arg(long, default_value_t = String::from("127.0.0.1"))]
    pub host: String,

    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Open the served map in the default browser
    #[arg(long, default_value_t = false)]
    pub open: bool,

    /// Milliseconds to wait for the server before announcing the URL
    #[arg(long, default_value_t = 1000)]
    pub open_delay_ms: u64,

    /// Stop serving after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub serve_secs: Option<u64>,
}

impl OutputArgs {
    pub fn serve_config(&self) -> ServeConfig {
        ServeConfig {
            host: self.host.clone(),
            port: self.port,
            open_delay: Duration::from_millis(self.open_delay_ms),
            open_browser: self.open,
            serve_for: self.serve_secs.map(Duration::from_secs),
        }
    }

    fn out_dir(&self) -> PathBuf {
        self.out_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("station-sites-{}", std::process::id()))
        })
    }
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

pub fn run(graph: RoadGraph, selection: &SelectionArgs, output: &OutputArgs) -> Result<()> {
    let config = selection.config();

    let now = Instant::now();
    let stations = select_stations(&graph.nodes, &config).context("selecting stations")?;
    log::info!(
        "Selected {} of {} requested stations from {} candidates in {:?}",
        stations.len(),
        config.num_stations,
        graph.nodes.len(),
        now.elapsed()
    );

    let points: Vec<Point> = stations.iter().map(|s| s.point).collect();
    let mid = midpoint(&points).with_context(|| {
        format!(
            "no candidate satisfies the {} km separation in a graph of {} nodes",
            config.min_dist_km,
            graph.nodes.len()
        )
    })?;

    for (rank, s) in stations.iter().enumerate() {
        println!(
            "Station {:>2}: node {} at ({:.6}, {:.6}), degree {}",
            rank + 1,
            s.node_id,
            s.point.y(),
            s.point.x(),
            s.degree
        );
    }
    println!("Midpoint: ({:.6}, {:.6})", mid.y(), mid.x());

    let stats = summary(&stations, &mid);
    if let Some(farthest) = stats.farthest {
        println!(
            "{} stations; farthest from midpoint is node {} at {:.3} km, mean {:.3} km",
            stats.stations, farthest, stats.max_distance_km, stats.mean_distance_km
        );
    }

    let title = match &output.place {
        Some(place) => format!("Base stations: {place}"),
        None => String::from("Base stations"),
    };
    let center = graph.center().unwrap_or(mid);
    let rendered = MapDocument::new(title, center, &stations, mid).render()?;

    let html_path = rendered.write_to(output.out_dir())?;
    println!("Wrote map to {}", html_path.display());

    if let Some(path) = &output.stations_csv {
        write_stations_csv(path, &stations, &mid)?;
        println!("Wrote {} stations to {}", stations.len(), path.display());
    }

    if output.no_serve {
        return Ok(());
    }

    let serve = output.serve_config();
    let server = spawn_map_server(rendered, &serve)?;
    std::thread::sleep(serve.open_delay);

    let url = server.url();
    if serve.open_browser {
        if let Err(err) = open_in_browser(&url) {
            log::warn!("{err:#}");
        }
    }
    log::debug!("Server bound to {}", server.addr());

    match serve.serve_for {
        Some(period) => {
            println!("Map is being served at {url} for {period:?}");
            std::thread::sleep(period);
            server.stop();
        }
        None => {
            println!("Map is being served at {url} (Ctrl-C to stop)");
            server.wait();
        }
    }
    Ok(())
}
