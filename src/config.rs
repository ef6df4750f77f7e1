//! JSON-described simulations.
//!
//! ```json
//! {
//!   "simulation": "MiniGISAS",
//!   "sample": { "builder": { "name": "CylindersInBA", "parameters": { "radius": 4.0 } } },
//!   "options": { "threads": 2 }
//! }
//! ```
//!
//! Either `simulation` (a standard simulation name) or a full `instrument`
//! must be given. The sample is a named builder or an inline multilayer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::Instrument;
use crate::param::ParameterDistribution;
use crate::sample::{MultiLayer, SampleBuilderRegistry, SampleError};
use crate::simulation::{GisasSimulation, SimulationError, SimulationOptions, SimulationRegistry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Sample(#[from] SampleError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    Builder {
        name: String,
        #[serde(default)]
        parameters: BTreeMap<String, f64>,
    },
    Inline(MultiLayer),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    pub sample: SampleSource,
    #[serde(default)]
    pub options: SimulationOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distributions: Vec<ParameterDistribution>,
    /// Where drivers write the result; the extension picks the format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl SimulationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded simulation config");
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Assemble the simulation described by this config.
    pub fn build(&self) -> Result<GisasSimulation, ConfigError> {
        let mut simulation = match (&self.simulation, &self.instrument) {
            (Some(name), None) => SimulationRegistry::new_with_defaults().create(name)?,
            (None, Some(instrument)) => GisasSimulation::with_instrument(instrument.clone()),
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "give either 'simulation' or 'instrument', not both".into(),
                ))
            }
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "one of 'simulation' or 'instrument' is required".into(),
                ))
            }
        };

        match &self.sample {
            SampleSource::Builder { name, parameters } => {
                let mut builder = SampleBuilderRegistry::new_with_defaults().create(name)?;
                for (parameter, value) in parameters {
                    builder.set_parameter(parameter, *value)?;
                }
                simulation.set_sample_builder(builder);
            }
            SampleSource::Inline(sample) => simulation.set_sample(sample.clone()),
        }

        simulation.set_options(self.options);
        for distribution in &self.distributions {
            simulation.add_parameter_distribution(distribution.clone());
        }
        Ok(simulation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleBuilder;

    #[test]
    fn test_builder_config() {
        let config = SimulationConfig::from_json(
            r#"{
                "simulation": "MiniGISAS",
                "sample": { "builder": { "name": "CylindersInBA", "parameters": { "radius": 4.0 } } },
                "options": { "threads": 1 }
            }"#,
        )
        .unwrap();
        let simulation = config.build().unwrap();
        assert_eq!(simulation.options().threads, 1);
        let params = simulation.sample_builder().unwrap().parameters();
        assert!(params.contains(&("radius".to_string(), 4.0)));
    }

    #[test]
    fn test_unknown_builder_parameter() {
        let config = SimulationConfig::from_json(
            r#"{"simulation": "MiniGISAS", "sample": {"builder": {"name": "CylindersInBA", "parameters": {"width": 1.0}}}}"#,
        )
        .unwrap();
        assert!(matches!(config.build(), Err(ConfigError::Sample(_))));
    }

    #[test]
    fn test_requires_exactly_one_instrument_source() {
        let config = SimulationConfig::from_json(
            r#"{"sample": {"builder": {"name": "CylindersInBA"}}}"#,
        )
        .unwrap();
        assert!(matches!(config.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inline_sample_file_roundtrip() {
        let sample = SampleBuilderRegistry::new_with_defaults()
            .create("CylindersInDWBA")
            .unwrap()
            .build_sample()
            .unwrap();
        let instrument = SimulationRegistry::new_with_defaults()
            .create("MiniGISAS")
            .unwrap()
            .instrument()
            .clone();
        let config = SimulationConfig {
            simulation: None,
            instrument: Some(instrument),
            sample: SampleSource::Inline(sample),
            options: SimulationOptions::default(),
            distributions: Vec::new(),
            output: None,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        fs::write(&path, config.to_json().unwrap()).unwrap();
        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        let mut simulation = loaded.build().unwrap();
        simulation.run_simulation().unwrap();
        assert!(simulation.intensity_data().sum() > 0.0);
    }
}
