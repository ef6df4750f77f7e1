//! Multi-step fit strategies.

use serde::{Deserialize, Serialize};

use super::{FitError, FitParameterSet, MinimizerFactory, Minimizer};

/// One minimization step of a suite. Strategies run in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FitStrategy {
    /// Plain minimization with the current setup.
    Default,
    /// Fix/release parameters, minimize, and optionally restore the values
    /// the step started from.
    AdjustParameters {
        #[serde(default)]
        fix_all: bool,
        #[serde(default)]
        release_all: bool,
        #[serde(default)]
        fix: Vec<String>,
        #[serde(default)]
        release: Vec<String>,
        #[serde(default)]
        preserve_original: bool,
    },
    /// Switch the minimizer, then minimize.
    AdjustMinimizer {
        name: String,
        #[serde(default)]
        algorithm: String,
    },
}

impl FitStrategy {
    pub fn fix_only(names: &[&str]) -> Self {
        FitStrategy::AdjustParameters {
            fix_all: false,
            release_all: true,
            fix: names.iter().map(|s| s.to_string()).collect(),
            release: Vec::new(),
            preserve_original: false,
        }
    }

    pub fn release_all() -> Self {
        FitStrategy::AdjustParameters {
            fix_all: false,
            release_all: true,
            fix: Vec::new(),
            release: Vec::new(),
            preserve_original: false,
        }
    }

    /// Apply the parameter part of the step. Returns the values to restore
    /// afterwards when the step preserves originals.
    pub(crate) fn prepare(
        &self,
        parameters: &mut FitParameterSet,
        minimizer: &mut Box<dyn Minimizer>,
    ) -> Result<Option<Vec<f64>>, FitError> {
        match self {
            FitStrategy::Default => Ok(None),
            FitStrategy::AdjustParameters {
                fix_all,
                release_all,
                fix,
                release,
                preserve_original,
            } => {
                let original = preserve_original.then(|| parameters.values());
                if *fix_all {
                    parameters.fix_all();
                }
                if *release_all {
                    parameters.release_all();
                }
                for name in fix {
                    parameters.fix(name)?;
                }
                for name in release {
                    parameters.release(name)?;
                }
                Ok(original)
            }
            FitStrategy::AdjustMinimizer { name, algorithm } => {
                *minimizer = MinimizerFactory::create(name, algorithm)?;
                Ok(None)
            }
        }
    }
}
