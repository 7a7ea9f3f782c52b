use anyhow::Result;
use clap::Parser;

use station_sites::cli::{self, OutputArgs, SelectionArgs};
use station_sites::graph::RoadGraph;

#[derive(Parser, Debug)]
#[command(name = "csv")]
#[command(about = "Pick base-station sites from a road graph given as node and edge CSV files and serve them on a map.", long_about = None)]
struct Cli {
    /// Node CSV with header node_id,lat,lon
    #[arg(long)]
    nodes: String,

    /// Edge CSV with header from,to and an optional oneway column
    #[arg(long)]
    edges: String,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    cli::init_logging();
    let args = Cli::parse();

    let graph = RoadGraph::from_csv_paths(&args.nodes, &args.edges, args.selection.bbox.as_ref())?;

    cli::run(graph, &args.selection, &args.output)
}
