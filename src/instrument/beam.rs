//! Incident beam.

use serde::{Deserialize, Serialize};

use crate::math::{wavevector, KVector};
use crate::param::{child_path, Parameterized};

use super::InstrumentError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub wavelength: f64,
    pub alpha_i: f64,
    pub phi_i: f64,
    /// Zero disables normalization.
    #[serde(default)]
    pub intensity: f64,
}

impl Beam {
    pub fn new(wavelength: f64, alpha_i: f64, phi_i: f64) -> Self {
        Self {
            wavelength,
            alpha_i,
            phi_i,
            intensity: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.wavelength > 0.0) {
            return Err(InstrumentError::InvalidWavelength(self.wavelength));
        }
        if !(self.alpha_i >= 0.0) {
            return Err(InstrumentError::InvalidIncidence(self.alpha_i));
        }
        Ok(())
    }

    /// Incident wave vector, pointing into the sample.
    pub fn k_in(&self) -> KVector {
        wavevector(self.wavelength, -self.alpha_i, self.phi_i)
    }
}

impl Default for Beam {
    fn default() -> Self {
        Self::new(0.1, 0.0, 0.0)
    }
}

impl Parameterized for Beam {
    fn node_name(&self) -> String {
        "Beam".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visitor(&child_path(path, "wavelength"), &mut self.wavelength);
        visitor(&child_path(path, "alpha"), &mut self.alpha_i);
        visitor(&child_path(path, "phi"), &mut self.phi_i);
        visitor(&child_path(path, "intensity"), &mut self.intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ANGSTROM, DEGREE};

    #[test]
    fn test_validate() {
        assert!(Beam::new(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0).validate().is_ok());
        assert!(matches!(
            Beam::new(0.0, 0.2 * DEGREE, 0.0).validate(),
            Err(InstrumentError::InvalidWavelength(_))
        ));
        assert!(matches!(
            Beam::new(1.0, -0.1, 0.0).validate(),
            Err(InstrumentError::InvalidIncidence(_))
        ));
    }

    #[test]
    fn test_k_in_points_down() {
        let beam = Beam::new(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
        assert!(beam.k_in().z < 0.0);
    }
}
