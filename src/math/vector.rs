//! Real and complex 3-vectors.

use nalgebra::Vector3;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Real wavevector / position.
pub type KVector = Vector3<f64>;

/// Complex wavevector, used once z-components pick up absorption.
pub type CVector = Vector3<Complex64>;

/// Wavevector of length 2π/λ pointing along (alpha, phi).
///
/// `alpha` is measured from the sample plane, `phi` in the plane from x.
pub fn wavevector(wavelength: f64, alpha: f64, phi: f64) -> KVector {
    let k = 2.0 * PI / wavelength;
    KVector::new(
        k * alpha.cos() * phi.cos(),
        k * alpha.cos() * phi.sin(),
        k * alpha.sin(),
    )
}

/// Promote a real vector to a complex one.
#[inline]
pub fn to_complex(v: &KVector) -> CVector {
    v.map(|x| Complex64::new(x, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wavevector_length() {
        let k = wavevector(0.1, 0.3, 1.2);
        assert!((k.norm() - 2.0 * PI / 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_wavevector_in_plane() {
        let k = wavevector(1.0, 0.0, 0.0);
        assert!((k.x - 2.0 * PI).abs() < 1e-12);
        assert!(k.y.abs() < 1e-12);
        assert!(k.z.abs() < 1e-12);
    }
}
