//! Combining particle amplitudes of one layout into an intensity.

use num_complex::Complex64;

use crate::sample::{Approximation, InterferenceFunction, ParticleLayout};
use crate::simulation::SimulationError;

/// Per-layout data precomputed once per run.
#[derive(Clone, Debug)]
pub struct LayoutStrategy {
    abundances: Vec<f64>,
    total_abundance: f64,
    interference: InterferenceFunction,
    kind: StrategyKind,
}

#[derive(Clone, Debug)]
enum StrategyKind {
    Decoupling,
    Ssca {
        kappa: f64,
        radii: Vec<f64>,
        mean_radius: f64,
    },
}

impl LayoutStrategy {
    pub fn new(layout: &ParticleLayout) -> Result<Self, SimulationError> {
        let abundances: Vec<f64> = layout.particles.iter().map(|p| p.abundance).collect();
        let total_abundance: f64 = abundances.iter().sum();
        let kind = match layout.approximation {
            Approximation::Decoupling => StrategyKind::Decoupling,
            Approximation::Ssca { kappa } => {
                if !matches!(
                    layout.interference,
                    InterferenceFunction::RadialParaCrystal { .. }
                ) {
                    return Err(SimulationError::UnsupportedInterference(
                        layout.interference.name(),
                    ));
                }
                let radii: Vec<f64> = layout
                    .particles
                    .iter()
                    .map(|p| p.particle.radial_extension())
                    .collect();
                let mean_radius = if total_abundance > 0.0 {
                    radii
                        .iter()
                        .zip(&abundances)
                        .map(|(r, a)| r * a)
                        .sum::<f64>()
                        / total_abundance
                } else {
                    0.0
                };
                StrategyKind::Ssca {
                    kappa,
                    radii,
                    mean_radius,
                }
            }
        };
        Ok(Self {
            abundances,
            total_abundance,
            interference: layout.interference.clone(),
            kind,
        })
    }

    /// Intensity from the amplitudes of the layout's particles, in order.
    pub fn evaluate(&self, amplitudes: &[Complex64], qx: f64, qy: f64) -> Result<f64, SimulationError> {
        if self.total_abundance <= 0.0 {
            return Ok(0.0);
        }
        if amplitudes.iter().any(|a| a.re.is_nan() || a.im.is_nan()) {
            return Err(SimulationError::NanAmplitude);
        }
        let fractions = self.abundances.iter().map(|a| a / self.total_abundance);
        let diffuse: f64 = fractions
            .clone()
            .zip(amplitudes)
            .map(|(f, a)| f * a.norm_sqr())
            .sum();

        match &self.kind {
            StrategyKind::Decoupling => {
                let mean: Complex64 = fractions.zip(amplitudes).map(|(f, a)| f * *a).sum();
                let s = self.interference.evaluate(qx, qy);
                Ok(self.total_abundance * (diffuse + mean.norm_sqr() * (s - 1.0)))
            }
            StrategyKind::Ssca {
                kappa,
                radii,
                mean_radius,
            } => {
                let qp = qx.hypot(qy);
                let offset = |k: f64, r: f64| Complex64::new(0.0, k * qp * (r - mean_radius)).exp();
                let mut mcff = Complex64::new(0.0, 0.0);
                let mut mcffc = Complex64::new(0.0, 0.0);
                let mut p2kappa = Complex64::new(0.0, 0.0);
                for ((f, a), &r) in fractions.zip(amplitudes).zip(radii) {
                    let phase = offset(*kappa, r);
                    mcff += f * *a * phase;
                    mcffc += f * a.conj() * phase;
                    p2kappa += f * offset(2.0 * kappa, r);
                }
                let omega = self.interference.ft_pdf(qp);
                let one = Complex64::new(1.0, 0.0);
                let interference = 2.0 * (mcff * mcffc * omega / (one - p2kappa * omega)).re;
                Ok(self.total_abundance * (diffuse + interference))
            }
        }
    }
}
