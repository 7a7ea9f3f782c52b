pub mod cli;
pub mod error;
pub mod geo;
pub mod graph;
pub mod midpoint;
pub mod render;
pub mod report;
pub mod selector;
pub mod server;
