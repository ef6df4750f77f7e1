//! Parameter distributions: averaging a simulation over a spread of values
//! of one parameter.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::ParameterError;

/// A one-dimensional probability distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Distribution1D {
    /// Uniform on `[min, max]`.
    Gate { min: f64, max: f64 },
    Gaussian { mean: f64, std_dev: f64 },
    Lorentz { mean: f64, hwhm: f64 },
}

impl Distribution1D {
    pub fn mean(&self) -> f64 {
        match *self {
            Distribution1D::Gate { min, max } => 0.5 * (min + max),
            Distribution1D::Gaussian { mean, .. } | Distribution1D::Lorentz { mean, .. } => mean,
        }
    }

    pub fn probability_density(&self, x: f64) -> f64 {
        match *self {
            Distribution1D::Gate { min, max } => {
                if max == min {
                    if x == min {
                        1.0
                    } else {
                        0.0
                    }
                } else if x >= min && x <= max {
                    1.0 / (max - min)
                } else {
                    0.0
                }
            }
            Distribution1D::Gaussian { mean, std_dev } => {
                if std_dev <= 0.0 {
                    return if x == mean { 1.0 } else { 0.0 };
                }
                let t = (x - mean) / std_dev;
                (-0.5 * t * t).exp() / (std_dev * (2.0 * PI).sqrt())
            }
            Distribution1D::Lorentz { mean, hwhm } => {
                if hwhm <= 0.0 {
                    return if x == mean { 1.0 } else { 0.0 };
                }
                let t = x - mean;
                hwhm / (PI * (t * t + hwhm * hwhm))
            }
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        match *self {
            Distribution1D::Gate { min, max } if max < min => Err(
                ParameterError::InvalidDistribution(format!("gate max {max} < min {min}")),
            ),
            Distribution1D::Gaussian { std_dev, .. } if std_dev < 0.0 => Err(
                ParameterError::InvalidDistribution(format!("negative std_dev {std_dev}")),
            ),
            Distribution1D::Lorentz { hwhm, .. } if hwhm < 0.0 => Err(
                ParameterError::InvalidDistribution(format!("negative hwhm {hwhm}")),
            ),
            _ => Ok(()),
        }
    }

    /// Equally spaced sample points with weights normalized to 1.
    ///
    /// Gaussian and Lorentz ranges span `mean ± sigma_factor·width`.
    pub fn sample_points(&self, samples: usize, sigma_factor: f64) -> Vec<(f64, f64)> {
        if samples <= 1 {
            return vec![(self.mean(), 1.0)];
        }
        let (lo, hi) = match *self {
            Distribution1D::Gate { min, max } => (min, max),
            Distribution1D::Gaussian { mean, std_dev } => {
                (mean - sigma_factor * std_dev, mean + sigma_factor * std_dev)
            }
            Distribution1D::Lorentz { mean, hwhm } => {
                (mean - sigma_factor * hwhm, mean + sigma_factor * hwhm)
            }
        };
        if hi <= lo {
            return vec![(self.mean(), 1.0)];
        }

        let step = (hi - lo) / (samples - 1) as f64;
        let values: Vec<f64> = (0..samples).map(|i| lo + step * i as f64).collect();
        let raw: Vec<f64> = match self {
            Distribution1D::Gate { .. } => vec![1.0; samples],
            _ => values.iter().map(|&x| self.probability_density(x)).collect(),
        };
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return vec![(self.mean(), 1.0)];
        }
        values
            .into_iter()
            .zip(raw)
            .map(|(v, w)| (v, w / total))
            .collect()
    }
}

/// A distribution applied to every parameter matching `pattern`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDistribution {
    pub pattern: String,
    pub distribution: Distribution1D,
    pub samples: usize,
    #[serde(default = "default_sigma_factor")]
    pub sigma_factor: f64,
}

fn default_sigma_factor() -> f64 {
    2.0
}

impl ParameterDistribution {
    pub fn new(
        pattern: impl Into<String>,
        distribution: Distribution1D,
        samples: usize,
        sigma_factor: f64,
    ) -> Result<Self, ParameterError> {
        distribution.validate()?;
        Ok(Self {
            pattern: pattern.into(),
            distribution,
            samples,
            sigma_factor,
        })
    }

    pub fn sample_points(&self) -> Vec<(f64, f64)> {
        self.distribution
            .sample_points(self.samples, self.sigma_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_sample_is_mean() {
        let d = Distribution1D::Gaussian {
            mean: 5.0,
            std_dev: 1.0,
        };
        assert_eq!(d.sample_points(1, 2.0), vec![(5.0, 1.0)]);
    }

    #[test]
    fn test_weights_normalized() {
        for d in [
            Distribution1D::Gate { min: 1.0, max: 3.0 },
            Distribution1D::Gaussian {
                mean: 5.0,
                std_dev: 0.5,
            },
            Distribution1D::Lorentz {
                mean: 2.0,
                hwhm: 0.1,
            },
        ] {
            let points = d.sample_points(7, 2.0);
            assert_eq!(points.len(), 7);
            let total: f64 = points.iter().map(|p| p.1).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
            let centre = points[3].0;
            assert_relative_eq!(centre, d.mean(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gaussian_symmetric_weights() {
        let d = Distribution1D::Gaussian {
            mean: 0.0,
            std_dev: 1.0,
        };
        let points = d.sample_points(5, 2.0);
        assert_relative_eq!(points[0].1, points[4].1, epsilon = 1e-12);
        assert!(points[2].1 > points[1].1);
    }

    #[test]
    fn test_invalid_distribution() {
        let err = ParameterDistribution::new(
            "*radius",
            Distribution1D::Gate { min: 2.0, max: 1.0 },
            3,
            2.0,
        )
        .unwrap_err();
        assert!(matches!(err, ParameterError::InvalidDistribution(_)));
    }
}
