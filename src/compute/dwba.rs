//! Distorted-wave Born amplitude of a particle inside a layer.

use num_complex::Complex64;

use crate::math::CVector;
use crate::sample::ParticleSpecies;

use super::fresnel::FresnelCoefficients;

/// Everything about the scattering geometry shared by the particles of one
/// layer.
#[derive(Clone, Copy, Debug)]
pub struct LayerScattering {
    /// Squared refractive index of the embedding layer.
    pub n2: Complex64,
    pub wavelength: f64,
    /// In-plane components of `k_i - k_f`.
    pub qx: f64,
    pub qy: f64,
    pub incoming: FresnelCoefficients,
    pub outgoing: FresnelCoefficients,
}

impl LayerScattering {
    fn q(&self, qz: Complex64) -> CVector {
        CVector::new(Complex64::new(self.qx, 0.0), Complex64::new(self.qy, 0.0), qz)
    }

    /// Sum of the four DWBA terms for a particle whose bottom lies `depth`
    /// below the layer's reference plane.
    ///
    /// Incoming `T` travels down (`-kz_i`), `R` up (`+kz_i`); the outgoing
    /// wave contributes `-kz_f` for `T` and `+kz_f` for `R`.
    pub fn amplitude(&self, particle: &ParticleSpecies, depth: f64) -> Complex64 {
        let ki = self.incoming.kz;
        let kf = self.outgoing.kz;
        let terms = [
            (self.incoming.t * self.outgoing.t, -ki - kf),
            (self.incoming.r * self.outgoing.t, ki - kf),
            (self.incoming.t * self.outgoing.r, -ki + kf),
            (self.incoming.r * self.outgoing.r, ki + kf),
        ];
        let i = Complex64::new(0.0, 1.0);
        terms
            .iter()
            .filter(|(coefficient, _)| coefficient.norm_sqr() > 0.0)
            .map(|&(coefficient, qz)| {
                coefficient
                    * particle.amplitude(&self.q(qz), self.n2, self.wavelength)
                    * (-i * qz * depth).exp()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{FormFactor, HomogeneousMaterial, Particle};
    use approx::assert_relative_eq;

    fn born(qz: f64) -> LayerScattering {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        LayerScattering {
            n2: one,
            wavelength: 0.1,
            qx: 0.2,
            qy: 0.0,
            incoming: FresnelCoefficients {
                kz: Complex64::new(qz / 2.0, 0.0),
                t: one,
                r: zero,
            },
            outgoing: FresnelCoefficients {
                kz: Complex64::new(qz / 2.0, 0.0),
                t: one,
                r: zero,
            },
        }
    }

    #[test]
    fn test_born_limit_uses_single_term() {
        let particle: ParticleSpecies = Particle::new(
            HomogeneousMaterial::new("Particle", 6e-4, 2e-8),
            FormFactor::Cylinder {
                radius: 5.0,
                height: 5.0,
            },
        )
        .into();
        let geometry = born(0.3);
        let a = geometry.amplitude(&particle, 0.0);
        let direct = particle.amplitude(
            &CVector::new(
                Complex64::new(0.2, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(-0.3, 0.0),
            ),
            Complex64::new(1.0, 0.0),
            0.1,
        );
        assert_relative_eq!(a.re, direct.re, max_relative = 1e-12);
        assert_relative_eq!(a.im, direct.im, max_relative = 1e-12);
    }

    #[test]
    fn test_depth_only_changes_phase_in_born() {
        let particle: ParticleSpecies = Particle::new(
            HomogeneousMaterial::new("Particle", 6e-4, 2e-8),
            FormFactor::FullSphere { radius: 3.0 },
        )
        .into();
        let geometry = born(0.4);
        let a = geometry.amplitude(&particle, 0.0);
        let b = geometry.amplitude(&particle, 7.0);
        assert_relative_eq!(a.norm(), b.norm(), max_relative = 1e-12);
    }
}
