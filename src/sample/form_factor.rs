//! Particle form factors.
//!
//! Every shape has its origin at the bottom centre, so a particle resting on
//! an interface touches it at `z = 0`. `evaluate` takes the complex
//! scattering vector because inside a DWBA layer `q_z` is complex; the in-plane
//! components are real.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::math::{j1_over_x, simpson, sinc, CVector};
use crate::param::{child_path, Parameterized};

use super::SampleError;

/// Intervals used by the numerically integrated shapes.
const INTEGRATION_INTERVALS: usize = 64;

const I: Complex64 = Complex64 { re: 0.0, im: 1.0 };

/// Supported particle shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum FormFactor {
    Cylinder { radius: f64, height: f64 },
    FullSphere { radius: f64 },
    Box { length: f64, width: f64, height: f64 },
    FullSpheroid { radius: f64, height: f64 },
    /// Truncated cone; `alpha` is the angle between base and side wall.
    Cone { radius: f64, height: f64, alpha: f64 },
    Gauss { width: f64, height: f64 },
    Lorentz { width: f64, height: f64 },
    Dot { radius: f64 },
}

/// Magnitude of the in-plane part of `q`.
#[inline]
pub fn q_parallel(q: &CVector) -> f64 {
    q.x.re.hypot(q.y.re)
}

impl FormFactor {
    pub fn name(&self) -> &'static str {
        match self {
            FormFactor::Cylinder { .. } => "FormFactorCylinder",
            FormFactor::FullSphere { .. } => "FormFactorFullSphere",
            FormFactor::Box { .. } => "FormFactorBox",
            FormFactor::FullSpheroid { .. } => "FormFactorFullSpheroid",
            FormFactor::Cone { .. } => "FormFactorCone",
            FormFactor::Gauss { .. } => "FormFactorGauss",
            FormFactor::Lorentz { .. } => "FormFactorLorentz",
            FormFactor::Dot { .. } => "FormFactorDot",
        }
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        let dims: Vec<(&str, f64)> = match *self {
            FormFactor::Cylinder { radius, height } => vec![("radius", radius), ("height", height)],
            FormFactor::FullSphere { radius } => vec![("radius", radius)],
            FormFactor::Box {
                length,
                width,
                height,
            } => vec![("length", length), ("width", width), ("height", height)],
            FormFactor::FullSpheroid { radius, height } => {
                vec![("radius", radius), ("height", height)]
            }
            FormFactor::Cone {
                radius,
                height,
                alpha,
            } => {
                if !(alpha > 0.0 && alpha <= PI / 2.0) {
                    return Err(SampleError::InvalidShape {
                        shape: self.name(),
                        reason: format!("cone angle {alpha} outside (0, pi/2]"),
                    });
                }
                if height > radius * alpha.tan() * (1.0 + 1e-12) {
                    return Err(SampleError::InvalidShape {
                        shape: self.name(),
                        reason: format!("height {height} exceeds apex height"),
                    });
                }
                vec![("radius", radius), ("height", height)]
            }
            FormFactor::Gauss { width, height } | FormFactor::Lorentz { width, height } => {
                vec![("width", width), ("height", height)]
            }
            FormFactor::Dot { radius } => vec![("radius", radius)],
        };
        for (what, value) in dims {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SampleError::InvalidShape {
                    shape: self.name(),
                    reason: format!("{what} must be positive, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Largest in-plane distance from the particle axis.
    pub fn radial_extension(&self) -> f64 {
        match *self {
            FormFactor::Cylinder { radius, .. }
            | FormFactor::FullSphere { radius }
            | FormFactor::FullSpheroid { radius, .. }
            | FormFactor::Cone { radius, .. }
            | FormFactor::Dot { radius } => radius,
            FormFactor::Box { length, .. } => length / 2.0,
            FormFactor::Gauss { width, .. } | FormFactor::Lorentz { width, .. } => width / 2.0,
        }
    }

    pub fn volume(&self) -> f64 {
        match *self {
            FormFactor::Cylinder { radius, height } => PI * radius * radius * height,
            FormFactor::FullSphere { radius } | FormFactor::Dot { radius } => {
                4.0 / 3.0 * PI * radius.powi(3)
            }
            FormFactor::Box {
                length,
                width,
                height,
            } => length * width * height,
            FormFactor::FullSpheroid { radius, height } => 2.0 / 3.0 * PI * radius * radius * height,
            FormFactor::Cone {
                radius,
                height,
                alpha,
            } => {
                let top = radius - height / alpha.tan();
                PI * height / 3.0 * (radius * radius + radius * top + top * top)
            }
            FormFactor::Gauss { width, height } | FormFactor::Lorentz { width, height } => {
                width * width * height
            }
        }
    }

    pub fn evaluate(&self, q: &CVector) -> Complex64 {
        match *self {
            FormFactor::Cylinder { radius, height } => {
                let qp = q_parallel(q);
                let half = q.z * (height / 2.0);
                2.0 * PI * radius * radius * height * j1_over_x(qp * radius) * sinc(half)
                    * (I * half).exp()
            }
            FormFactor::FullSphere { radius } => {
                let q2 = q.x * q.x + q.y * q.y + q.z * q.z;
                let qr = q2.sqrt() * radius;
                let radial = if qr.norm() < 1e-3 {
                    4.0 * PI * radius.powi(3) * (1.0 / 3.0 - qr * qr / 30.0)
                } else {
                    4.0 * PI * radius.powi(3) * (qr.sin() - qr * qr.cos()) / (qr * qr * qr)
                };
                radial * (I * q.z * radius).exp()
            }
            FormFactor::Box {
                length,
                width,
                height,
            } => {
                let half = q.z * (height / 2.0);
                length * width * height
                    * sinc(q.x * (length / 2.0))
                    * sinc(q.y * (width / 2.0))
                    * sinc(half)
                    * (I * half).exp()
            }
            FormFactor::FullSpheroid { radius, height } => {
                if q.norm() <= f64::EPSILON {
                    return Complex64::new(self.volume(), 0.0);
                }
                let qp = q_parallel(q);
                let qz = q.z;
                let integral = simpson(
                    |z| {
                        let ratio = (1.0 - 4.0 * z * z / (height * height)).max(0.0);
                        let rz = radius * ratio.sqrt();
                        rz * rz * j1_over_x(qp * rz) * (qz * z).cos()
                    },
                    0.0,
                    height / 2.0,
                    INTEGRATION_INTERVALS,
                );
                4.0 * PI * (I * qz * (height / 2.0)).exp() * integral
            }
            FormFactor::Cone {
                radius,
                height,
                alpha,
            } => {
                if q.norm() <= f64::EPSILON {
                    return Complex64::new(self.volume(), 0.0);
                }
                let qp = q_parallel(q);
                let qz = q.z;
                let slope = 1.0 / alpha.tan();
                let integral = simpson(
                    |z| {
                        let rz = (radius - z * slope).max(0.0);
                        rz * rz * j1_over_x(qp * rz) * (I * qz * z).exp()
                    },
                    0.0,
                    height,
                    INTEGRATION_INTERVALS,
                );
                2.0 * PI * integral
            }
            FormFactor::Gauss { width, height } => {
                let norm = 4.0 * PI;
                let qp2 = q.x * q.x + q.y * q.y;
                let xy = (-qp2 * (width * width) / norm).exp();
                let z = (-q.z * q.z * (height * height) / norm).exp();
                width * width * height * xy * z * (I * q.z * (height / 2.0)).exp()
            }
            FormFactor::Lorentz { width, height } => {
                let sigma2 = 4.0 * PI.powf(2.0 / 3.0);
                let qp2 = q.x * q.x + q.y * q.y;
                let denominator =
                    1.0 + qp2 * (width * width) / sigma2 + q.z * q.z * (height * height) / sigma2;
                width * width * height / denominator * (I * q.z * (height / 2.0)).exp()
            }
            FormFactor::Dot { .. } => Complex64::new(self.volume(), 0.0),
        }
    }
}

impl Parameterized for FormFactor {
    fn node_name(&self) -> String {
        self.name().to_string()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        match self {
            FormFactor::Cylinder { radius, height }
            | FormFactor::FullSpheroid { radius, height } => {
                visitor(&child_path(path, "radius"), radius);
                visitor(&child_path(path, "height"), height);
            }
            FormFactor::FullSphere { radius } | FormFactor::Dot { radius } => {
                visitor(&child_path(path, "radius"), radius);
            }
            FormFactor::Box {
                length,
                width,
                height,
            } => {
                visitor(&child_path(path, "length"), length);
                visitor(&child_path(path, "width"), width);
                visitor(&child_path(path, "height"), height);
            }
            FormFactor::Cone {
                radius,
                height,
                alpha,
            } => {
                visitor(&child_path(path, "radius"), radius);
                visitor(&child_path(path, "height"), height);
                visitor(&child_path(path, "alpha"), alpha);
            }
            FormFactor::Gauss { width, height } | FormFactor::Lorentz { width, height } => {
                visitor(&child_path(path, "width"), width);
                visitor(&child_path(path, "height"), height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::DEGREE;
    use approx::assert_relative_eq;

    fn q(x: f64, y: f64, z: f64) -> CVector {
        CVector::new(
            Complex64::new(x, 0.0),
            Complex64::new(y, 0.0),
            Complex64::new(z, 0.0),
        )
    }

    fn all_shapes() -> Vec<FormFactor> {
        vec![
            FormFactor::Cylinder {
                radius: 5.0,
                height: 5.0,
            },
            FormFactor::FullSphere { radius: 4.0 },
            FormFactor::Box {
                length: 10.0,
                width: 6.0,
                height: 4.0,
            },
            FormFactor::FullSpheroid {
                radius: 5.0,
                height: 8.0,
            },
            FormFactor::Cone {
                radius: 5.0,
                height: 4.0,
                alpha: 60.0 * DEGREE,
            },
            FormFactor::Gauss {
                width: 5.0,
                height: 5.0,
            },
            FormFactor::Lorentz {
                width: 5.0,
                height: 5.0,
            },
            FormFactor::Dot { radius: 1.0 },
        ]
    }

    #[test]
    fn test_zero_q_equals_volume() {
        for ff in all_shapes() {
            ff.validate().unwrap();
            let f0 = ff.evaluate(&q(0.0, 0.0, 0.0));
            assert_relative_eq!(f0.re, ff.volume(), max_relative = 1e-6);
            assert!(f0.im.abs() < 1e-9 * ff.volume());
        }
    }

    #[test]
    fn test_small_q_continuity() {
        for ff in all_shapes() {
            let f = ff.evaluate(&q(1e-6, 1e-6, 1e-6));
            assert_relative_eq!(f.norm(), ff.volume(), max_relative = 1e-4);
        }
    }

    #[test]
    fn test_form_factor_decreases() {
        let ff = FormFactor::Cylinder {
            radius: 5.0,
            height: 5.0,
        };
        let small = ff.evaluate(&q(0.05, 0.0, 0.05)).norm();
        let large = ff.evaluate(&q(0.5, 0.0, 0.5)).norm();
        assert!(small > large);
    }

    #[test]
    fn test_sphere_matches_spheroid_with_equal_axes() {
        let sphere = FormFactor::FullSphere { radius: 5.0 };
        let spheroid = FormFactor::FullSpheroid {
            radius: 5.0,
            height: 10.0,
        };
        let qv = q(0.3, 0.1, 0.2);
        let a = sphere.evaluate(&qv);
        let b = spheroid.evaluate(&qv);
        assert_relative_eq!(a.re, b.re, epsilon = 1e-3 * sphere.volume());
        assert_relative_eq!(a.im, b.im, epsilon = 1e-3 * sphere.volume());
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(FormFactor::Cylinder {
            radius: -1.0,
            height: 1.0
        }
        .validate()
        .is_err());
        assert!(FormFactor::Cone {
            radius: 1.0,
            height: 10.0,
            alpha: 45.0 * DEGREE
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_radial_extension() {
        let b = FormFactor::Box {
            length: 12.0,
            width: 2.0,
            height: 2.0,
        };
        assert_eq!(b.radial_extension(), 6.0);
    }
}
