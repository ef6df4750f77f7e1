//! Parallel evaluation of simulation elements.

use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::sample::{MultiLayer, ParticleSpecies};
use crate::simulation::SimulationError;

use super::dwba::LayerScattering;
use super::fresnel::compute_coefficients;
use super::strategy::LayoutStrategy;
use super::SimulationElement;

struct LayoutComputation {
    layer: usize,
    strategy: LayoutStrategy,
    particles: Vec<(ParticleSpecies, f64)>,
}

/// Sample prepared for per-pixel evaluation.
pub struct DwbaComputation {
    n2: Vec<Complex64>,
    thickness: Vec<f64>,
    has_substrate: bool,
    layouts: Vec<LayoutComputation>,
}

impl DwbaComputation {
    pub fn new(sample: &MultiLayer) -> Result<Self, SimulationError> {
        sample.validate()?;
        let n2 = sample
            .layers
            .iter()
            .map(|l| l.material.refractive_index2())
            .collect();
        let thickness = (0..sample.len()).map(|i| sample.layer_thickness(i)).collect();
        let mut layouts = Vec::new();
        for (index, layer) in sample.layers.iter().enumerate() {
            for layout in &layer.layouts {
                if layout.particles.is_empty() {
                    continue;
                }
                layouts.push(LayoutComputation {
                    layer: index,
                    strategy: LayoutStrategy::new(layout)?,
                    particles: layout
                        .particles
                        .iter()
                        .map(|info| (info.particle.clone(), info.depth))
                        .collect(),
                });
            }
        }
        Ok(Self {
            n2,
            thickness,
            has_substrate: sample.has_substrate(),
            layouts,
        })
    }

    /// Diffuse intensity scattered into one element's direction.
    pub fn compute(&self, element: &SimulationElement) -> Result<f64, SimulationError> {
        if self.layouts.is_empty() || (self.has_substrate && element.alpha_f < 0.0) {
            return Ok(0.0);
        }
        let k0 = 2.0 * PI / element.wavelength;
        let incoming = compute_coefficients(&self.n2, &self.thickness, k0, element.alpha_i);
        let outgoing = compute_coefficients(&self.n2, &self.thickness, k0, element.alpha_f);
        let q = element.q();

        let mut intensity = 0.0;
        for layout in &self.layouts {
            let geometry = LayerScattering {
                n2: self.n2[layout.layer],
                wavelength: element.wavelength,
                qx: q.x,
                qy: q.y,
                incoming: incoming[layout.layer],
                outgoing: outgoing[layout.layer],
            };
            let amplitudes: Vec<Complex64> = layout
                .particles
                .iter()
                .map(|(particle, depth)| geometry.amplitude(particle, *depth))
                .collect();
            intensity += layout.strategy.evaluate(&amplitudes, q.x, q.y)?;
        }
        Ok(intensity)
    }
}

/// Fill `intensity` of every element. `threads == 0` uses the global rayon
/// pool; any other value runs on a dedicated pool of that size.
pub fn run_elements(
    sample: &MultiLayer,
    elements: &mut [SimulationElement],
    threads: usize,
) -> Result<(), SimulationError> {
    let computation = DwbaComputation::new(sample)?;
    tracing::debug!(
        elements = elements.len(),
        layouts = computation.layouts.len(),
        threads,
        "computing elements"
    );
    if threads == 0 {
        compute_all(&computation, elements)
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;
        pool.install(|| compute_all(&computation, elements))
    }
}

fn compute_all(
    computation: &DwbaComputation,
    elements: &mut [SimulationElement],
) -> Result<(), SimulationError> {
    elements.par_iter_mut().try_for_each(|element| {
        element.intensity = computation.compute(element)?;
        Ok(())
    })
}
