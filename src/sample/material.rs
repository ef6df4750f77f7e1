//! Homogeneous materials.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A material with refractive index `n = 1 - delta + i*beta`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomogeneousMaterial {
    pub name: String,
    pub delta: f64,
    pub beta: f64,
}

impl HomogeneousMaterial {
    pub fn new(name: impl Into<String>, delta: f64, beta: f64) -> Self {
        Self {
            name: name.into(),
            delta,
            beta,
        }
    }

    /// Vacuum / air.
    pub fn air() -> Self {
        Self::new("Air", 0.0, 0.0)
    }

    #[inline]
    pub fn refractive_index(&self) -> Complex64 {
        Complex64::new(1.0 - self.delta, self.beta)
    }

    /// Square of the refractive index.
    #[inline]
    pub fn refractive_index2(&self) -> Complex64 {
        let n = self.refractive_index();
        n * n
    }
}

impl Default for HomogeneousMaterial {
    fn default() -> Self {
        Self::air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refractive_index() {
        let m = HomogeneousMaterial::new("Substrate", 6e-6, 2e-8);
        let n = m.refractive_index();
        assert_eq!(n.re, 1.0 - 6e-6);
        assert_eq!(n.im, 2e-8);
        assert_eq!(HomogeneousMaterial::air().refractive_index2(), Complex64::new(1.0, 0.0));
    }
}
