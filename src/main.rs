use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use station_sites::cli::{self, OutputArgs, SelectionArgs};
use station_sites::graph::RoadGraph;

#[derive(Parser, Debug)]
#[command(name = "osm")]
#[command(about = "Pick base-station sites from the drivable roads of an OSM .pbf and serve them on a map.", long_about = None)]
struct Cli {
    /// Path to the .osm.pbf file
    #[arg(short, long)]
    pbf: String,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    cli::init_logging();
    let args = Cli::parse();

    let now = Instant::now();
    let graph = RoadGraph::from_pbf(&args.pbf, args.selection.bbox.as_ref())?;
    log::info!("Built road graph in {:?}", now.elapsed());

    cli::run(graph, &args.selection, &args.output)
}
