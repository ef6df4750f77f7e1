//! Parameter estimation: fit real intensity maps with simulations.
//!
//! A [`FitSuite`] owns one or more [`FitObject`]s (a simulation paired with
//! measured data), a set of [`FitParameter`]s addressed by glob patterns over
//! the simulations' parameter trees, and a [`Minimizer`]. Every objective call
//! applies the candidate values, reruns the simulations and reduces the
//! per-bin squared differences to a normalized chi².

pub mod chi2;
pub mod levenberg;
pub mod minimizer;
pub mod nelder_mead;
pub mod objects;
pub mod observer;
pub mod parameter;
pub mod strategy;
pub mod suite;

pub use chi2::{ChiSquaredModule, IntensityNormalizer, SquaredFunction};
pub use levenberg::LevenbergMarquardt;
pub use minimizer::{Minimizer, MinimizerFactory, MinimizerResult, Objective, TestMinimizer};
pub use nelder_mead::NelderMead;
pub use objects::{FitObject, FitObjects};
pub use observer::{FitObserver, FitProgress, PrintObserver, SliceObserver};
pub use parameter::{FitParameter, FitParameterSet, Limits};
pub use strategy::FitStrategy;
pub use suite::{FitResult, FitSuite};

use thiserror::Error;

use crate::param::ParameterError;
use crate::simulation::SimulationError;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("real data shape {actual:?} does not match detector shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("unknown minimizer: {0}")]
    UnknownMinimizer(String),
    #[error("unknown fit parameter: {0}")]
    UnknownParameter(String),
    #[error("fit parameter already defined: {0}")]
    DuplicateParameter(String),
    #[error("invalid limits for {name}: {reason}")]
    InvalidLimits { name: String, reason: String },
    #[error("no simulation/real-data pairs to fit")]
    NoFitObjects,
    #[error("fit object index {0} out of range")]
    ObjectIndex(usize),
    #[error("fit interrupted")]
    Interrupted,
    #[error("objective returned a non-finite value")]
    NonFinite,
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
