//! Named instrument setups.

use std::collections::HashMap;

use crate::instrument::{MaskShape, ResolutionFunction2D};
use crate::units::{ANGSTROM, DEGREE};

use super::{GisasSimulation, SimulationError};

type SimulationFactory = fn() -> Result<GisasSimulation, SimulationError>;

/// Registry of standard simulations, created without a sample.
pub struct SimulationRegistry {
    factories: HashMap<String, (SimulationFactory, &'static str)>,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("MiniGISAS", mini_gisas, "25x25 detector, phi in [-2, 2] deg, alpha in [0, 2] deg");
        registry.register("BasicGISAS", basic_gisas, "100x100 detector, phi and alpha in [0, 2] deg");
        registry.register(
            "MiniGISASMasked",
            mini_gisas_masked,
            "MiniGISAS with a rectangle and an ellipse masked",
        );
        registry.register(
            "MiniGISASResolution",
            mini_gisas_resolution,
            "MiniGISAS with Gaussian detector resolution",
        );
        registry
    }

    pub fn register(&mut self, name: &str, factory: SimulationFactory, description: &'static str) {
        self.factories
            .insert(name.to_string(), (factory, description));
    }

    pub fn create(&self, name: &str) -> Result<GisasSimulation, SimulationError> {
        let (factory, _) = self
            .factories
            .get(name)
            .ok_or_else(|| SimulationError::UnknownSimulation(name.to_string()))?;
        factory()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.factories.get(name).map(|(_, d)| *d)
    }

    /// Names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SimulationRegistry {
    fn default() -> Self {
        Self::new_with_defaults()
    }
}

pub fn mini_gisas() -> Result<GisasSimulation, SimulationError> {
    let mut simulation = GisasSimulation::new();
    simulation.set_detector_parameters(25, -2.0 * DEGREE, 2.0 * DEGREE, 25, 0.0, 2.0 * DEGREE)?;
    simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
    Ok(simulation)
}

pub fn basic_gisas() -> Result<GisasSimulation, SimulationError> {
    let mut simulation = GisasSimulation::new();
    simulation.set_detector_parameters(100, 0.0, 2.0 * DEGREE, 100, 0.0, 2.0 * DEGREE)?;
    simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
    Ok(simulation)
}

pub fn mini_gisas_masked() -> Result<GisasSimulation, SimulationError> {
    let mut simulation = mini_gisas()?;
    simulation.add_mask(
        MaskShape::Rectangle {
            xlow: -2.0 * DEGREE,
            ylow: 0.0,
            xup: -1.0 * DEGREE,
            yup: 1.0 * DEGREE,
        },
        true,
    );
    simulation.add_mask(
        MaskShape::Ellipse {
            xc: 1.0 * DEGREE,
            yc: 1.2 * DEGREE,
            rx: 0.5 * DEGREE,
            ry: 0.3 * DEGREE,
            theta: 0.0,
        },
        true,
    );
    Ok(simulation)
}

pub fn mini_gisas_resolution() -> Result<GisasSimulation, SimulationError> {
    let mut simulation = mini_gisas()?;
    simulation.set_detector_resolution_function(ResolutionFunction2D::Gaussian {
        sigma_x: 0.0025,
        sigma_y: 0.0025,
    });
    Ok(simulation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = SimulationRegistry::new_with_defaults();
        assert_eq!(
            registry.names(),
            vec!["BasicGISAS", "MiniGISAS", "MiniGISASMasked", "MiniGISASResolution"]
        );
        let mini = registry.create("MiniGISAS").unwrap();
        assert_eq!(mini.detector().shape(), (25, 25));
        assert!(mini.sample().is_none());
    }

    #[test]
    fn test_masked_has_masked_pixels() {
        let simulation = SimulationRegistry::new_with_defaults()
            .create("MiniGISASMasked")
            .unwrap();
        let masked = simulation.detector().masked_count();
        assert!(masked > 0 && masked < 625);
    }

    #[test]
    fn test_unknown() {
        assert!(matches!(
            SimulationRegistry::new().create("Nope"),
            Err(SimulationError::UnknownSimulation(_))
        ));
    }
}
