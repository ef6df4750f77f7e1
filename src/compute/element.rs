//! One detector pixel's worth of computation.

use crate::math::{wavevector, KVector};

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationElement {
    pub wavelength: f64,
    pub alpha_i: f64,
    pub phi_i: f64,
    /// Pixel centre.
    pub alpha_f: f64,
    pub phi_f: f64,
    pub solid_angle: f64,
    /// Global detector index `ix·ny + iy`.
    pub index: usize,
    pub intensity: f64,
}

impl SimulationElement {
    /// Incident wave vector, pointing into the sample.
    pub fn k_i(&self) -> KVector {
        wavevector(self.wavelength, -self.alpha_i, self.phi_i)
    }

    pub fn k_f(&self) -> KVector {
        wavevector(self.wavelength, self.alpha_f, self.phi_f)
    }

    /// Scattering vector `k_i - k_f`.
    pub fn q(&self) -> KVector {
        self.k_i() - self.k_f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ANGSTROM, DEGREE};
    use approx::assert_relative_eq;

    #[test]
    fn test_specular_q_is_vertical() {
        let el = SimulationElement {
            wavelength: 1.0 * ANGSTROM,
            alpha_i: 0.2 * DEGREE,
            phi_i: 0.0,
            alpha_f: 0.2 * DEGREE,
            phi_f: 0.0,
            solid_angle: 1.0,
            index: 0,
            intensity: 0.0,
        };
        let q = el.q();
        assert_relative_eq!(q.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 0.0, epsilon = 1e-12);
        let k0 = 2.0 * std::f64::consts::PI / el.wavelength;
        assert_relative_eq!(q.z, -2.0 * k0 * (0.2 * DEGREE).sin(), max_relative = 1e-12);
    }
}
