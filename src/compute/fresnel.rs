//! Scalar Fresnel coefficients of a layer stack.
//!
//! In layer `j` the field is `T_j e^{-i kz_j z} + R_j e^{i kz_j z}`, with `z`
//! measured upward from the layer's top interface (from the single interface
//! for the ambient). Coefficients are normalized so that `T_0 = 1`.

use num_complex::Complex64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FresnelCoefficients {
    pub kz: Complex64,
    pub t: Complex64,
    pub r: Complex64,
}

/// `k0·sqrt(n² − cos²α)` on the branch with non-negative imaginary part.
#[inline]
pub fn normal_wavevector(k0: f64, n2: Complex64, alpha: f64) -> Complex64 {
    let cos2 = alpha.cos().powi(2);
    let kz = k0 * (n2 - cos2).sqrt();
    if kz.im < 0.0 {
        -kz
    } else {
        kz
    }
}

/// Coefficients for every layer, given squared refractive indices and
/// thicknesses (outer layers' thicknesses are ignored).
pub fn compute_coefficients(
    n2: &[Complex64],
    thickness: &[f64],
    k0: f64,
    alpha: f64,
) -> Vec<FresnelCoefficients> {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let count = n2.len();
    if count == 0 {
        return Vec::new();
    }

    let mut coeffs: Vec<FresnelCoefficients> = n2
        .iter()
        .map(|&n| FresnelCoefficients {
            kz: normal_wavevector(k0, n, alpha),
            t: zero,
            r: zero,
        })
        .collect();

    if count == 1 {
        // Plain Born: the sign of kz follows the direction of travel.
        if alpha < 0.0 {
            coeffs[0].kz = -coeffs[0].kz;
        }
        coeffs[0].t = one;
        return coeffs;
    }

    if coeffs[0].kz.norm() < 1e-12 * k0 {
        // Grazing limit: total reflection, no field below the surface.
        coeffs[0].t = one;
        coeffs[0].r = -one;
        return coeffs;
    }

    coeffs[count - 1].t = one;
    for j in (0..count - 1).rev() {
        let below = coeffs[j + 1];
        let kz = coeffs[j].kz;
        let d = if j == 0 { 0.0 } else { thickness[j] };
        let a = below.t + below.r;
        let b = if kz.norm() > 0.0 {
            below.kz * (below.t - below.r) / kz
        } else {
            zero
        };
        let phase = Complex64::new(0.0, 1.0) * kz * d;
        coeffs[j].t = (a + b) / 2.0 * (-phase).exp();
        coeffs[j].r = (a - b) / 2.0 * phase.exp();
    }

    let t0 = coeffs[0].t;
    for c in coeffs.iter_mut() {
        c.t /= t0;
        c.r /= t0;
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::DEGREE;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn n2(delta: f64, beta: f64) -> Complex64 {
        let n = Complex64::new(1.0 - delta, beta);
        n * n
    }

    #[test]
    fn test_single_interface_matches_fresnel_formula() {
        let k0 = 2.0 * PI / 0.1;
        let alpha = 0.3 * DEGREE;
        let layers = [n2(0.0, 0.0), n2(6e-6, 2e-8)];
        let c = compute_coefficients(&layers, &[0.0, 0.0], k0, alpha);
        let k1 = c[0].kz;
        let k2 = c[1].kz;
        let r = (k1 - k2) / (k1 + k2);
        let t = 2.0 * k1 / (k1 + k2);
        assert_relative_eq!(c[0].t.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(c[0].r.re, r.re, epsilon = 1e-10);
        assert_relative_eq!(c[0].r.im, r.im, epsilon = 1e-10);
        assert_relative_eq!(c[1].t.re, t.re, epsilon = 1e-10);
        assert_relative_eq!(c[1].r.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matching_layers_are_transparent() {
        let k0 = 2.0 * PI / 0.1;
        let m = n2(6e-6, 0.0);
        let c = compute_coefficients(&[n2(0.0, 0.0), m, m], &[0.0, 25.0, 0.0], k0, 0.5 * DEGREE);
        // the buried layer has no reflection from the identical substrate
        assert_relative_eq!(c[1].r.norm(), 0.0, epsilon = 1e-10);
        assert_relative_eq!(c[1].t.norm(), c[2].t.norm(), max_relative = 1e-8);
    }

    #[test]
    fn test_total_reflection_below_critical_angle() {
        let k0 = 2.0 * PI / 0.1;
        let alpha = 0.05 * DEGREE;
        let c = compute_coefficients(&[n2(0.0, 0.0), n2(6e-6, 0.0)], &[0.0, 0.0], k0, alpha);
        assert_relative_eq!(c[0].r.norm(), 1.0, max_relative = 1e-9);
        assert!(c[1].kz.re.abs() < 1e-9 * k0);
        assert!(c[1].kz.im > 0.0);
    }

    #[test]
    fn test_single_layer_is_born() {
        let c = compute_coefficients(&[n2(0.0, 0.0)], &[0.0], 10.0, -0.1);
        assert_eq!(c[0].t, Complex64::new(1.0, 0.0));
        assert_eq!(c[0].r, Complex64::new(0.0, 0.0));
        assert_relative_eq!(c[0].kz.re, 10.0 * (-0.1f64).sin(), max_relative = 1e-9);
    }
}
