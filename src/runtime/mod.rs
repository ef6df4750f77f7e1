//! Batch runtime for the functional test suite.

pub mod executor;
pub mod functional;
pub mod scheduler;

pub use executor::{Runtime, RuntimeConfig, RuntimeSummary};
pub use functional::{FunctionalTest, FunctionalTestRegistry, TestOutcome, TestStatus};
pub use scheduler::{PriorityScheduler, WorkItem};

use thiserror::Error;

use crate::data::DataError;
use crate::sample::SampleError;
use crate::simulation::SimulationError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown functional test '{0}'")]
    UnknownTest(String),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("worker pool: {0}")]
    ThreadPool(String),
}
