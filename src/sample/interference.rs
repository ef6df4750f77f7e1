//! Interference functions: the structure factor S(q) of particle positions.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::param::{child_path, Parameterized};

use super::SampleError;

/// Upper bound on reciprocal-lattice indices summed per direction.
const MAX_LATTICE_INDEX: i64 = 100;

/// Fourier transform of a 1D nearest-neighbour distance distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FTDistribution1D {
    Gauss { omega: f64 },
    Cauchy { omega: f64 },
}

impl FTDistribution1D {
    pub fn evaluate(&self, q: f64) -> f64 {
        match *self {
            FTDistribution1D::Gauss { omega } => (-q * q * omega * omega / 2.0).exp(),
            FTDistribution1D::Cauchy { omega } => 1.0 / (1.0 + q * q * omega * omega),
        }
    }

    pub fn omega(&self) -> f64 {
        match *self {
            FTDistribution1D::Gauss { omega } | FTDistribution1D::Cauchy { omega } => omega,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FTDistribution1D::Gauss { .. } => "FTDistribution1DGauss",
            FTDistribution1D::Cauchy { .. } => "FTDistribution1DCauchy",
        }
    }
}

/// Structure factor of the particle arrangement in a layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum InterferenceFunction {
    /// Dilute, uncorrelated particles.
    #[default]
    None,
    /// Radially symmetric paracrystal (also used for the 1D paracrystal).
    RadialParaCrystal {
        peak_distance: f64,
        damping_length: f64,
        /// Finite domain size; 0 means an infinite chain.
        #[serde(default)]
        domain_size: f64,
        pdf: FTDistribution1D,
    },
    /// 2D lattice with an isotropic Cauchy decay of positional order.
    Lattice2D {
        length_1: f64,
        length_2: f64,
        angle: f64,
        #[serde(default)]
        xi: f64,
        decay_length: f64,
    },
}

impl InterferenceFunction {
    pub fn name(&self) -> &'static str {
        match self {
            InterferenceFunction::None => "InterferenceFunctionNone",
            InterferenceFunction::RadialParaCrystal { .. } => {
                "InterferenceFunctionRadialParaCrystal"
            }
            InterferenceFunction::Lattice2D { .. } => "InterferenceFunction2DLattice",
        }
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        match *self {
            InterferenceFunction::None => Ok(()),
            InterferenceFunction::RadialParaCrystal {
                peak_distance,
                damping_length,
                domain_size,
                ref pdf,
            } => {
                if !(peak_distance > 0.0) || damping_length < 0.0 || domain_size < 0.0 {
                    return Err(SampleError::InvalidInterference(format!(
                        "paracrystal distance {peak_distance}, damping {damping_length}, domain {domain_size}"
                    )));
                }
                if pdf.omega() < 0.0 {
                    return Err(SampleError::InvalidInterference(format!(
                        "negative pdf width {}",
                        pdf.omega()
                    )));
                }
                Ok(())
            }
            InterferenceFunction::Lattice2D {
                length_1,
                length_2,
                angle,
                decay_length,
                ..
            } => {
                if !(length_1 > 0.0 && length_2 > 0.0 && decay_length > 0.0)
                    || angle.sin().abs() < 1e-6
                {
                    return Err(SampleError::InvalidInterference(format!(
                        "lattice lengths {length_1}, {length_2}, angle {angle}, decay {decay_length}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Evaluate S at the in-plane scattering vector `(qx, qy)`.
    pub fn evaluate(&self, qx: f64, qy: f64) -> f64 {
        match *self {
            InterferenceFunction::None => 1.0,
            InterferenceFunction::RadialParaCrystal { domain_size, .. } => {
                let qp = qx.hypot(qy);
                let p = self.ft_pdf(qp);
                let one = Complex64::new(1.0, 0.0);
                // a domain shorter than one peak distance uses the infinite chain
                let n = (domain_size / self.peak_distance()).floor() as i32;
                if n >= 1 {
                    let nd = f64::from(n);
                    let denominator = one - p;
                    if denominator.norm_sqr() < f64::EPSILON {
                        return nd;
                    }
                    let tail = p * (one - p.powi(n)) / (nd * denominator * denominator);
                    1.0 + 2.0 * (p / denominator - tail).re
                } else {
                    let denominator = (one - p).norm_sqr();
                    if denominator < f64::EPSILON {
                        return (one + p).norm() / f64::EPSILON;
                    }
                    ((one + p) * (one - p).conj()).re / denominator
                }
            }
            InterferenceFunction::Lattice2D {
                length_1,
                length_2,
                angle,
                xi,
                decay_length,
            } => lattice_2d(qx, qy, length_1, length_2, angle, xi, decay_length),
        }
    }

    /// Characteristic function `pdf(q)·e^{iqD}·e^{-D/Λ}` of a radial
    /// paracrystal; zero for other interference functions.
    pub fn ft_pdf(&self, qp: f64) -> Complex64 {
        match *self {
            InterferenceFunction::RadialParaCrystal {
                peak_distance,
                damping_length,
                ref pdf,
                ..
            } => {
                let damping = if damping_length > 0.0 {
                    (-peak_distance / damping_length).exp()
                } else {
                    1.0
                };
                pdf.evaluate(qp) * damping * Complex64::new(0.0, qp * peak_distance).exp()
            }
            _ => Complex64::new(0.0, 0.0),
        }
    }

    fn peak_distance(&self) -> f64 {
        match *self {
            InterferenceFunction::RadialParaCrystal { peak_distance, .. } => peak_distance,
            _ => 0.0,
        }
    }
}

fn lattice_2d(
    qx: f64,
    qy: f64,
    length_1: f64,
    length_2: f64,
    angle: f64,
    xi: f64,
    omega: f64,
) -> f64 {
    let (ax, ay) = (length_1 * xi.cos(), length_1 * xi.sin());
    let (bx, by) = (length_2 * (xi + angle).cos(), length_2 * (xi + angle).sin());
    let cross = ax * by - ay * bx;
    let area = cross.abs();

    let (asx, asy) = (2.0 * PI * by / cross, -2.0 * PI * bx / cross);
    let (bsx, bsy) = (-2.0 * PI * ay / cross, 2.0 * PI * ax / cross);

    // Coordinates of q in the reciprocal basis: q·a / 2π, q·b / 2π.
    let qa = (qx * ax + qy * ay) / (2.0 * PI);
    let qb = (qx * bx + qy * by) / (2.0 * PI);

    let cutoff = 10.0 / omega;
    let range_a = ((cutoff / asx.hypot(asy)).ceil() as i64).clamp(1, MAX_LATTICE_INDEX);
    let range_b = ((cutoff / bsx.hypot(bsy)).ceil() as i64).clamp(1, MAX_LATTICE_INDEX);
    let (ca, cb) = (qa.round() as i64, qb.round() as i64);

    let mut sum = 0.0;
    for i in (ca - range_a)..=(ca + range_a) {
        for j in (cb - range_b)..=(cb + range_b) {
            let gx = i as f64 * asx + j as f64 * bsx;
            let gy = i as f64 * asy + j as f64 * bsy;
            let dq2 = (qx - gx).powi(2) + (qy - gy).powi(2);
            sum += 2.0 * PI * omega * omega * (1.0 + dq2 * omega * omega).powf(-1.5);
        }
    }
    sum / area
}

impl Parameterized for InterferenceFunction {
    fn node_name(&self) -> String {
        self.name().to_string()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        match self {
            InterferenceFunction::None => {}
            InterferenceFunction::RadialParaCrystal {
                peak_distance,
                damping_length,
                domain_size,
                pdf,
            } => {
                visitor(&child_path(path, "peak_distance"), peak_distance);
                visitor(&child_path(path, "damping_length"), damping_length);
                visitor(&child_path(path, "domain_size"), domain_size);
                let pdf_path = child_path(path, pdf.name());
                match pdf {
                    FTDistribution1D::Gauss { omega } | FTDistribution1D::Cauchy { omega } => {
                        visitor(&child_path(&pdf_path, "omega"), omega);
                    }
                }
            }
            InterferenceFunction::Lattice2D {
                length_1,
                length_2,
                angle,
                xi,
                decay_length,
            } => {
                visitor(&child_path(path, "length_1"), length_1);
                visitor(&child_path(path, "length_2"), length_2);
                visitor(&child_path(path, "angle"), angle);
                visitor(&child_path(path, "xi"), xi);
                visitor(&child_path(path, "decay_length"), decay_length);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn paracrystal(domain_size: f64) -> InterferenceFunction {
        InterferenceFunction::RadialParaCrystal {
            peak_distance: 20.0,
            damping_length: 1000.0,
            domain_size,
            pdf: FTDistribution1D::Gauss { omega: 7.0 },
        }
    }

    #[test]
    fn test_none_is_unity() {
        assert_eq!(InterferenceFunction::None.evaluate(0.3, 0.1), 1.0);
    }

    #[test]
    fn test_paracrystal_peak_near_reciprocal_distance() {
        let itf = paracrystal(0.0);
        let q_peak = 2.0 * PI / 20.0;
        let at_peak = itf.evaluate(q_peak, 0.0);
        let off_peak = itf.evaluate(q_peak * 0.5, 0.0);
        assert!(at_peak > 1.0);
        assert!(at_peak > off_peak);
        // Far from the origin positional order is lost.
        assert_relative_eq!(itf.evaluate(5.0, 0.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_paracrystal_finite_domain_approaches_infinite() {
        let q = 0.2;
        let infinite = paracrystal(0.0).evaluate(q, 0.0);
        let finite = paracrystal(1.0e7).evaluate(q, 0.0);
        assert_relative_eq!(infinite, finite, max_relative = 1e-3);
    }

    #[test]
    fn test_paracrystal_short_domain_uses_infinite_chain() {
        let q = 2.0 * PI / 20.0;
        let infinite = paracrystal(0.0).evaluate(q, 0.0);
        assert!(infinite > 1.0);
        assert_relative_eq!(paracrystal(10.0).evaluate(q, 0.0), infinite, epsilon = 1e-12);
        // one full period is a real finite chain
        let one_period = paracrystal(20.0).evaluate(q, 0.0);
        assert_relative_eq!(one_period, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_paracrystal_zero_q_capped() {
        let itf = InterferenceFunction::RadialParaCrystal {
            peak_distance: 20.0,
            damping_length: 0.0,
            domain_size: 0.0,
            pdf: FTDistribution1D::Cauchy { omega: 1.0 },
        };
        let s = itf.evaluate(0.0, 0.0);
        assert!(s.is_finite());
        assert!(s > 1.0);
    }

    #[test]
    fn test_lattice_peaks_at_reciprocal_vectors() {
        let itf = InterferenceFunction::Lattice2D {
            length_1: 10.0,
            length_2: 10.0,
            angle: PI / 2.0,
            xi: 0.0,
            decay_length: 300.0,
        };
        itf.validate().unwrap();
        let g = 2.0 * PI / 10.0;
        assert!(itf.evaluate(g, 0.0) > 10.0 * itf.evaluate(g / 2.0, 0.0));
    }

    #[test]
    fn test_invalid_paracrystal() {
        let itf = InterferenceFunction::RadialParaCrystal {
            peak_distance: -1.0,
            damping_length: 0.0,
            domain_size: 0.0,
            pdf: FTDistribution1D::Gauss { omega: 1.0 },
        };
        assert!(itf.validate().is_err());
    }
}
