//! Instrument: beam, detector, masks and resolution.

pub mod axis;
pub mod beam;
pub mod detector;
pub mod mask;
pub mod resolution;

pub use axis::FixedBinAxis;
pub use beam::Beam;
pub use detector::{Detector, DetectorGeometry};
pub use mask::{DetectorMask, MaskEntry, MaskShape};
pub use resolution::ResolutionFunction2D;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::param::{child_path, Parameterized};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InstrumentError {
    #[error("invalid axis: {size} bins over [{min}, {max}]")]
    InvalidAxis { size: usize, min: f64, max: f64 },
    #[error("wavelength must be positive, got {0}")]
    InvalidWavelength(f64),
    #[error("incidence angle must be non-negative, got {0}")]
    InvalidIncidence(f64),
    #[error("detector distance must be positive, got {0}")]
    InvalidDistance(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub beam: Beam,
    pub detector: Detector,
    #[serde(default)]
    pub resolution: Option<ResolutionFunction2D>,
}

impl Instrument {
    pub fn validate(&self) -> Result<(), InstrumentError> {
        self.detector.validate()?;
        self.beam.validate()
    }
}

impl Parameterized for Instrument {
    fn node_name(&self) -> String {
        "Instrument".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        let beam_path = child_path(path, &self.beam.node_name());
        self.beam.visit_parameters(&beam_path, visitor);
        if let Some(resolution) = &mut self.resolution {
            let detector_path = child_path(path, "Detector");
            let resolution_path = child_path(&detector_path, &resolution.node_name());
            resolution.visit_parameters(&resolution_path, visitor);
        }
    }
}
