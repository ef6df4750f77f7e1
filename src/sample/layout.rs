//! Particle layouts: which particles sit in a layer, how many of each, and how
//! their positions correlate.

use serde::{Deserialize, Serialize};

use crate::param::{child_path, indexed_segment, Parameterized};

use super::{InterferenceFunction, ParticleSpecies, SampleError};

/// A particle species together with its placement in the layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleInfo {
    pub particle: ParticleSpecies,
    /// Distance of the particle bottom below the layer top (below the
    /// interface for the ambient layer).
    #[serde(default)]
    pub depth: f64,
    pub abundance: f64,
}

/// How the intensity of several particle species is combined.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum Approximation {
    #[default]
    Decoupling,
    /// Size-spacing correlation approximation with coupling parameter kappa.
    Ssca { kappa: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ParticleLayout {
    pub particles: Vec<ParticleInfo>,
    #[serde(default)]
    pub interference: InterferenceFunction,
    #[serde(default)]
    pub approximation: Approximation,
}

impl ParticleLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_particle(
        &mut self,
        particle: impl Into<ParticleSpecies>,
        depth: f64,
        abundance: f64,
    ) -> &mut Self {
        self.particles.push(ParticleInfo {
            particle: particle.into(),
            depth,
            abundance,
        });
        self
    }

    pub fn set_interference_function(&mut self, interference: InterferenceFunction) -> &mut Self {
        self.interference = interference;
        self
    }

    pub fn set_approximation(&mut self, approximation: Approximation) -> &mut Self {
        self.approximation = approximation;
        self
    }

    pub fn total_abundance(&self) -> f64 {
        self.particles.iter().map(|p| p.abundance).sum()
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        for info in &self.particles {
            if info.abundance < 0.0 || !info.abundance.is_finite() {
                return Err(SampleError::InvalidAbundance(info.abundance));
            }
            info.particle.validate()?;
        }
        self.interference.validate()?;
        if let Approximation::Ssca { .. } = self.approximation {
            if !matches!(
                self.interference,
                InterferenceFunction::RadialParaCrystal { .. }
            ) {
                return Err(SampleError::InvalidInterference(format!(
                    "SSCA requires a radial paracrystal, got {}",
                    self.interference.name()
                )));
            }
        }
        Ok(())
    }
}

impl Parameterized for ParticleLayout {
    fn node_name(&self) -> String {
        "ParticleLayout".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        let count = self.particles.len();
        for (i, info) in self.particles.iter_mut().enumerate() {
            let segment = indexed_segment(&info.particle.node_name(), i, count);
            let particle_path = child_path(path, &segment);
            visitor(&child_path(&particle_path, "depth"), &mut info.depth);
            visitor(&child_path(&particle_path, "abundance"), &mut info.abundance);
            info.particle.visit_parameters(&particle_path, visitor);
        }
        let itf_path = child_path(path, self.interference.name());
        self.interference.visit_parameters(&itf_path, visitor);
        if let Approximation::Ssca { kappa } = &mut self.approximation {
            visitor(&child_path(path, "kappa"), kappa);
        }
    }
}
