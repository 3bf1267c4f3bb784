use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Every variant is fatal for the run: they signal either a bad configuration
/// (caught before any sweep starts) or a caller writing an illegal spin.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("lattice dimensions must be > 0, got {rows}x{cols}")]
    InvalidShape { rows: usize, cols: usize },

    #[error("temperature must be finite and > 0, got {0}")]
    InvalidTemperature(f64),

    #[error("coupling J must be finite, got {0}")]
    InvalidCoupling(f64),

    #[error("spin value must be -1 or +1, got {0}")]
    InvalidSpin(i8),

    #[error("site ({i}, {j}) is outside the {rows}x{cols} lattice")]
    SiteOutOfBounds {
        i: usize,
        j: usize,
        rows: usize,
        cols: usize,
    },

    #[error("spin buffer of length {len} does not fit a {rows}x{cols} lattice")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },

    #[error(
        "empty temperature range: min_T = {min_t}, max_T = {max_t}, num_measurements = {num_measurements}"
    )]
    EmptyTemperatureRange {
        min_t: f64,
        max_t: f64,
        num_measurements: usize,
    },

    #[error("'{0}' must be > 0")]
    InvalidIterations(&'static str),
}

pub type SimResult<T> = std::result::Result<T, SimError>;
