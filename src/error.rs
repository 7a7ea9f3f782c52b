//! Errors raised by site selection and midpoint computation.
//!
//! Loaders and binaries wrap these in `anyhow::Error` with context; the core
//! functions return `PlacementError` directly so callers can match on it.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PlacementError {
    /// Midpoint requested over zero stations.
    #[error("no stations to compute a midpoint from")]
    EmptyInput,

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoords { lat: f64, lon: f64 },
}
