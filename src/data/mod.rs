//! Intensity maps, slices, comparison, file formats and noise.

pub mod compare;
pub mod intensity;
pub mod io;
pub mod noise;

pub use compare::{check_against_reference, relative_difference, relative_difference_map, relative_difference_values};
pub use intensity::{Histogram1D, IntensityData};
pub use io::{read_intensity_data, write_intensity_data};
pub use noise::add_gaussian_noise;

use thiserror::Error;

use crate::instrument::InstrumentError;

/// Errors raised by intensity data handling.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("cannot reshape {reference} values into {data} bins")]
    SizeMismatch { data: usize, reference: usize },
    #[error("relative difference is NaN")]
    NanDifference,
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Axis(#[from] InstrumentError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
