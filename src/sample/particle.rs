//! Particles: a form factor filled with a material, optionally wrapped
//! around a core.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::math::CVector;
use crate::param::{child_path, Parameterized};

use super::{FormFactor, HomogeneousMaterial, SampleError};

const I: Complex64 = Complex64 { re: 0.0, im: 1.0 };

/// `e^{i q·r}`.
#[inline]
fn position_phase(q: &CVector, r: &[f64; 3]) -> Complex64 {
    (I * (q.x * r[0] + q.y * r[1] + q.z * r[2])).exp()
}

/// A homogeneous particle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub material: HomogeneousMaterial,
    pub form_factor: FormFactor,
    /// Offset of the particle origin relative to its nominal position.
    #[serde(default)]
    pub position: [f64; 3],
}

impl Particle {
    pub fn new(material: HomogeneousMaterial, form_factor: FormFactor) -> Self {
        Self {
            material,
            form_factor,
            position: [0.0; 3],
        }
    }

    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }

    /// Born amplitude inside a medium with squared refractive index
    /// `ambient_n2`.
    pub fn amplitude(&self, q: &CVector, ambient_n2: Complex64, wavelength: f64) -> Complex64 {
        let contrast = ambient_n2 - self.material.refractive_index2();
        PI / (wavelength * wavelength)
            * contrast
            * self.form_factor.evaluate(q)
            * position_phase(q, &self.position)
    }
}

impl Parameterized for Particle {
    fn node_name(&self) -> String {
        "Particle".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        let ff_path = child_path(path, &self.form_factor.node_name());
        self.form_factor.visit_parameters(&ff_path, visitor);
    }
}

/// A shell particle with a core of a different material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleCoreShell {
    pub shell: Particle,
    pub core: Particle,
    /// Core origin relative to the shell origin.
    #[serde(default)]
    pub core_position: [f64; 3],
}

impl ParticleCoreShell {
    pub fn new(shell: Particle, core: Particle, core_position: [f64; 3]) -> Self {
        Self {
            shell,
            core,
            core_position,
        }
    }

    pub fn amplitude(&self, q: &CVector, ambient_n2: Complex64, wavelength: f64) -> Complex64 {
        let prefactor = PI / (wavelength * wavelength);
        let shell_n2 = self.shell.material.refractive_index2();
        let core_n2 = self.core.material.refractive_index2();
        let shell = (ambient_n2 - shell_n2) * self.shell.form_factor.evaluate(q);
        let core = (shell_n2 - core_n2)
            * self.core.form_factor.evaluate(q)
            * position_phase(q, &self.core_position);
        prefactor * (shell + core) * position_phase(q, &self.shell.position)
    }
}

/// Anything that can be placed in a particle layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ParticleSpecies {
    Single(Particle),
    CoreShell(ParticleCoreShell),
}

impl ParticleSpecies {
    pub fn amplitude(&self, q: &CVector, ambient_n2: Complex64, wavelength: f64) -> Complex64 {
        match self {
            ParticleSpecies::Single(p) => p.amplitude(q, ambient_n2, wavelength),
            ParticleSpecies::CoreShell(p) => p.amplitude(q, ambient_n2, wavelength),
        }
    }

    /// Radial extension of the outer shape.
    pub fn radial_extension(&self) -> f64 {
        match self {
            ParticleSpecies::Single(p) => p.form_factor.radial_extension(),
            ParticleSpecies::CoreShell(p) => p.shell.form_factor.radial_extension(),
        }
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        match self {
            ParticleSpecies::Single(p) => p.form_factor.validate(),
            ParticleSpecies::CoreShell(p) => {
                p.shell.form_factor.validate()?;
                p.core.form_factor.validate()?;
                if p.core.form_factor.volume() > p.shell.form_factor.volume() {
                    return Err(SampleError::InvalidShape {
                        shape: p.core.form_factor.name(),
                        reason: "core larger than shell".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

impl From<Particle> for ParticleSpecies {
    fn from(p: Particle) -> Self {
        ParticleSpecies::Single(p)
    }
}

impl From<ParticleCoreShell> for ParticleSpecies {
    fn from(p: ParticleCoreShell) -> Self {
        ParticleSpecies::CoreShell(p)
    }
}

impl Parameterized for ParticleSpecies {
    fn node_name(&self) -> String {
        match self {
            ParticleSpecies::Single(_) => "Particle".into(),
            ParticleSpecies::CoreShell(_) => "ParticleCoreShell".into(),
        }
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        match self {
            ParticleSpecies::Single(p) => p.visit_parameters(path, visitor),
            ParticleSpecies::CoreShell(p) => {
                p.shell
                    .visit_parameters(&child_path(path, "Shell"), visitor);
                p.core.visit_parameters(&child_path(path, "Core"), visitor);
            }
        }
    }
}
