//! GISAS simulation: instrument + sample → intensity map.

pub mod gisas;
pub mod options;
pub mod registry;

pub use gisas::GisasSimulation;
pub use options::SimulationOptions;
pub use registry::SimulationRegistry;

use thiserror::Error;

use crate::data::DataError;
use crate::instrument::InstrumentError;
use crate::param::ParameterError;
use crate::sample::SampleError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("scattering amplitude is NaN")]
    NanAmplitude,
    #[error("interference function {0} is not supported by the chosen approximation")]
    UnsupportedInterference(&'static str),
    #[error("no sample or sample builder set")]
    NoSample,
    #[error("batch {current} out of range for {total} batches")]
    InvalidBatch { current: usize, total: usize },
    #[error("unknown simulation: {0}")]
    UnknownSimulation(String),
    #[error("thread pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Data(#[from] DataError),
}
