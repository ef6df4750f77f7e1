//! Detector resolution.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::math::normal_cdf;
use crate::param::{child_path, Parameterized};

use super::FixedBinAxis;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolutionFunction2D {
    /// Separable Gaussian with widths in detector units (radians).
    Gaussian { sigma_x: f64, sigma_y: f64 },
}

/// Weight matrix `w[target][source]`: the share of a Gaussian centred on the
/// source bin that falls into the target bin.
fn bin_weights(axis: &FixedBinAxis, sigma: f64) -> Option<Array2<f64>> {
    if sigma <= 0.0 {
        return None;
    }
    let n = axis.size;
    let mut w = Array2::zeros((n, n));
    for source in 0..n {
        let centre = axis.bin_center(source);
        for target in 0..n {
            let (lo, hi) = axis.bin_bounds(target);
            w[[target, source]] = normal_cdf((hi - centre) / sigma) - normal_cdf((lo - centre) / sigma);
        }
    }
    Some(w)
}

impl ResolutionFunction2D {
    /// Convolve `values` (indexed `[ix, iy]`) in place.
    pub fn apply(&self, x_axis: &FixedBinAxis, y_axis: &FixedBinAxis, values: &mut Array2<f64>) {
        match *self {
            ResolutionFunction2D::Gaussian { sigma_x, sigma_y } => {
                if let Some(wx) = bin_weights(x_axis, sigma_x) {
                    *values = wx.dot(&*values);
                }
                if let Some(wy) = bin_weights(y_axis, sigma_y) {
                    let mut out = values.clone();
                    for (mut row_out, row) in out
                        .axis_iter_mut(Axis(0))
                        .zip(values.axis_iter(Axis(0)))
                    {
                        row_out.assign(&wy.dot(&row));
                    }
                    *values = out;
                }
            }
        }
    }
}

impl Parameterized for ResolutionFunction2D {
    fn node_name(&self) -> String {
        "ResolutionFunction2DGaussian".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        match self {
            ResolutionFunction2D::Gaussian { sigma_x, sigma_y } => {
                visitor(&child_path(path, "sigma_x"), sigma_x);
                visitor(&child_path(path, "sigma_y"), sigma_y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spreads_and_conserves_inner_peak() {
        let x = FixedBinAxis::new("x", 21, -10.5, 10.5).unwrap();
        let y = FixedBinAxis::new("y", 21, -10.5, 10.5).unwrap();
        let mut values = Array2::zeros((21, 21));
        values[[10, 10]] = 100.0;
        let resolution = ResolutionFunction2D::Gaussian {
            sigma_x: 1.0,
            sigma_y: 2.0,
        };
        resolution.apply(&x, &y, &mut values);
        assert!(values[[10, 10]] < 100.0);
        assert!(values[[11, 10]] > 0.0);
        assert_relative_eq!(values[[9, 10]], values[[11, 10]], epsilon = 1e-9);
        assert!(values[[10, 12]] > values[[12, 10]]);
        assert_relative_eq!(values.sum(), 100.0, max_relative = 1e-3);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let x = FixedBinAxis::new("x", 3, 0.0, 3.0).unwrap();
        let y = FixedBinAxis::new("y", 2, 0.0, 2.0).unwrap();
        let mut values = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let before = values.clone();
        ResolutionFunction2D::Gaussian {
            sigma_x: 0.0,
            sigma_y: 0.0,
        }
        .apply(&x, &y, &mut values);
        assert_eq!(values, before);
    }
}
