//! Per-bin squared differences between simulated and real intensities.

use serde::{Deserialize, Serialize};

use crate::data::IntensityData;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SquaredFunction {
    /// `(s − r)² / max(r, 1)`.
    #[default]
    Default,
    /// `(s − r)² / max(s, 1)`.
    SimError,
    /// Variance from both real and simulated counts.
    MeanSquaredError,
    /// Poisson variance plus a relative systematic error.
    SystematicError(f64),
    /// Constant absolute error.
    GaussianError(f64),
}

impl SquaredFunction {
    pub fn calculate(&self, simulated: f64, real: f64) -> f64 {
        let diff = (simulated - real).powi(2);
        if diff < f64::EPSILON {
            return 0.0;
        }
        let variance = match *self {
            SquaredFunction::Default => real.max(1.0),
            SquaredFunction::SimError => simulated.max(1.0),
            SquaredFunction::MeanSquaredError => {
                let s1 = real.max(1.0);
                let s2 = simulated.max(1.0);
                s1 * s1 + s2 * s2
            }
            SquaredFunction::SystematicError(epsilon) => real.max(1.0) + (epsilon * real).powi(2),
            SquaredFunction::GaussianError(sigma) => sigma * sigma,
        };
        diff / variance
    }
}

/// Rescales simulated data before comparison: `scale · s / max(s) + shift`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntensityNormalizer {
    pub scale: f64,
    pub shift: f64,
}

impl Default for IntensityNormalizer {
    fn default() -> Self {
        Self {
            scale: 1.0,
            shift: 0.0,
        }
    }
}

impl IntensityNormalizer {
    pub fn apply(&self, data: &mut IntensityData) {
        let max = data.max();
        let factor = if max > 0.0 { self.scale / max } else { self.scale };
        data.array_mut()
            .mapv_inplace(|v| v * factor + self.shift);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChiSquaredModule {
    pub squared_function: SquaredFunction,
    pub normalizer: Option<IntensityNormalizer>,
}

impl ChiSquaredModule {
    pub fn new(squared_function: SquaredFunction) -> Self {
        Self {
            squared_function,
            normalizer: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: IntensityNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::FixedBinAxis;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_uses_real_counts() {
        let f = SquaredFunction::Default;
        assert_relative_eq!(f.calculate(12.0, 10.0), 0.4);
        assert_relative_eq!(f.calculate(0.5, 0.0), 0.25);
        assert_eq!(f.calculate(3.0, 3.0), 0.0);
    }

    #[test]
    fn test_other_variances() {
        assert_relative_eq!(SquaredFunction::SimError.calculate(20.0, 10.0), 5.0);
        assert_relative_eq!(SquaredFunction::GaussianError(0.5).calculate(2.0, 1.0), 4.0);
        assert_relative_eq!(
            SquaredFunction::SystematicError(0.1).calculate(12.0, 10.0),
            4.0 / 11.0
        );
        assert_relative_eq!(SquaredFunction::MeanSquaredError.calculate(2.0, 1.0), 1.0 / 5.0);
    }

    #[test]
    fn test_normalizer() {
        let axis = FixedBinAxis::new("x", 2, 0.0, 1.0).unwrap();
        let mut data = IntensityData::new(axis.clone(), axis);
        data.set_bin_content(0, 4.0);
        data.set_bin_content(3, 2.0);
        IntensityNormalizer {
            scale: 100.0,
            shift: 1.0,
        }
        .apply(&mut data);
        assert_eq!(data.raw_values(), vec![101.0, 1.0, 1.0, 51.0]);
    }
}
