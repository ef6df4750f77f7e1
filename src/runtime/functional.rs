//! Functional tests: a standard sample on a standard instrument, compared
//! against a stored reference map.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::data::{read_intensity_data, relative_difference, write_intensity_data, IntensityData};
use crate::sample::SampleBuilderRegistry;
use crate::simulation::SimulationRegistry;

use super::RuntimeError;

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionalTest {
    pub name: String,
    pub description: String,
    pub sample_builder: String,
    pub simulation: String,
    pub threshold: f64,
}

/// Outcome of one comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum TestStatus {
    /// Relative difference within threshold.
    Success(f64),
    /// Relative difference above threshold.
    Failed(f64),
    NoReference,
    /// The test could not be simulated.
    Error(String),
}

impl TestStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Failed(_) | TestStatus::Error(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
    pub elapsed: Duration,
}

impl FunctionalTest {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sample_builder: impl Into<String>,
        simulation: impl Into<String>,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sample_builder: sample_builder.into(),
            simulation: simulation.into(),
            threshold,
        }
    }

    pub fn reference_path(&self, reference_dir: &Path) -> PathBuf {
        reference_dir.join(format!("{}.int", self.name))
    }

    pub fn simulate(
        &self,
        builders: &SampleBuilderRegistry,
        simulations: &SimulationRegistry,
    ) -> Result<IntensityData, RuntimeError> {
        let mut simulation = simulations.create(&self.simulation)?;
        simulation.set_sample_builder(builders.create(&self.sample_builder)?);
        simulation.run_simulation()?;
        Ok(simulation.intensity_data())
    }

    /// Detector pixels × particle species; used to run cheap tests first.
    pub fn estimated_cost(
        &self,
        builders: &SampleBuilderRegistry,
        simulations: &SimulationRegistry,
    ) -> Result<usize, RuntimeError> {
        let simulation = simulations.create(&self.simulation)?;
        let sample = builders.create(&self.sample_builder)?.build_sample()?;
        Ok(simulation.detector().total_size() * sample.particle_species_count().max(1))
    }

    pub fn run(
        &self,
        builders: &SampleBuilderRegistry,
        simulations: &SimulationRegistry,
        reference_dir: &Path,
    ) -> Result<TestStatus, RuntimeError> {
        let path = self.reference_path(reference_dir);
        if !path.exists() {
            tracing::warn!(test = %self.name, path = %path.display(), "no reference");
            return Ok(TestStatus::NoReference);
        }
        let result = self.simulate(builders, simulations)?;
        let reference = read_intensity_data(&path)?;
        let diff = relative_difference(&result, &reference)?;
        Ok(if diff <= self.threshold {
            TestStatus::Success(diff)
        } else {
            TestStatus::Failed(diff)
        })
    }

    /// Run and turn every error into [`TestStatus::Error`].
    pub fn execute(
        &self,
        builders: &SampleBuilderRegistry,
        simulations: &SimulationRegistry,
        reference_dir: &Path,
    ) -> TestOutcome {
        let start = Instant::now();
        let status = self
            .run(builders, simulations, reference_dir)
            .unwrap_or_else(|e| TestStatus::Error(e.to_string()));
        match &status {
            TestStatus::Success(diff) => tracing::info!(test = %self.name, diff, "OK"),
            TestStatus::Failed(diff) => {
                tracing::warn!(test = %self.name, diff, threshold = self.threshold, "FAILED")
            }
            TestStatus::NoReference => {}
            TestStatus::Error(e) => tracing::warn!(test = %self.name, error = %e, "ERROR"),
        }
        TestOutcome {
            name: self.name.clone(),
            status,
            elapsed: start.elapsed(),
        }
    }

    /// Simulate and store the result as the new reference.
    pub fn update_reference(
        &self,
        builders: &SampleBuilderRegistry,
        simulations: &SimulationRegistry,
        reference_dir: &Path,
    ) -> Result<PathBuf, RuntimeError> {
        let data = self.simulate(builders, simulations)?;
        let path = self.reference_path(reference_dir);
        write_intensity_data(&data, &path)?;
        tracing::info!(test = %self.name, path = %path.display(), "reference updated");
        Ok(path)
    }
}

/// Standard functional tests.
#[derive(Clone, Debug, Default)]
pub struct FunctionalTestRegistry {
    tests: Vec<FunctionalTest>,
}

impl FunctionalTestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            ("CylindersInDWBA", "Cylinders on a substrate in DWBA", "CylindersInDWBA", "MiniGISAS"),
            ("CylindersInBA", "Cylinders in vacuum in BA", "CylindersInBA", "MiniGISAS"),
            ("RadialParaCrystal", "Radial paracrystal of cylinders", "RadialParaCrystal", "MiniGISAS"),
            ("ApproximationDA", "Two cylinder types, decoupling approximation", "TwoTypesCylindersDA", "MiniGISAS"),
            ("ApproximationLMA", "Two cylinder types, local monodisperse approximation", "CylindersLMA", "MiniGISAS"),
            ("CylindersInSSCA", "Size-spacing correlation approximation", "CylindersSSCA", "MiniGISAS"),
            ("BuriedSpheres", "Spheres buried in an intermediate layer", "BuriedSpheres", "MiniGISAS"),
            ("CoreShellParticle", "Core-shell boxes", "CoreShellBoxes", "MiniGISAS"),
            ("SquareLattice", "Cylinders on a 2D square lattice", "SquareLattice2D", "MiniGISAS"),
            ("SpheresInBA", "Spheres in vacuum", "SpheresInBA", "MiniGISAS"),
            ("DetectorResolution", "Cylinders with detector resolution", "CylindersInBA", "MiniGISASResolution"),
            ("MaskedDetector", "Cylinders on a partly masked detector", "CylindersInDWBA", "MiniGISASMasked"),
        ];
        for (name, description, builder, simulation) in defaults {
            registry.add(FunctionalTest::new(name, description, builder, simulation, 2e-10));
        }
        registry
    }

    pub fn add(&mut self, test: FunctionalTest) {
        self.tests.push(test);
    }

    pub fn get(&self, name: &str) -> Result<&FunctionalTest, RuntimeError> {
        self.tests
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| RuntimeError::UnknownTest(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionalTest> {
        self.tests.iter()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
