//! Sample model: materials, particles, interference functions and the
//! multilayer they live in.

pub mod builder;
pub mod form_factor;
pub mod interference;
pub mod layout;
pub mod material;
pub mod multilayer;
pub mod particle;
pub mod standard;

pub use builder::{SampleBuilder, SampleBuilderRegistry};
pub use form_factor::{q_parallel, FormFactor};
pub use interference::{FTDistribution1D, InterferenceFunction};
pub use layout::{Approximation, ParticleInfo, ParticleLayout};
pub use material::HomogeneousMaterial;
pub use multilayer::{Layer, MultiLayer};
pub use particle::{Particle, ParticleCoreShell, ParticleSpecies};

use thiserror::Error;

/// Errors raised while building or validating a sample.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("multilayer has no layers")]
    NoLayers,
    #[error("layer {layer}: invalid thickness {thickness}")]
    InvalidThickness { layer: usize, thickness: f64 },
    #[error("layer {layer}: particle depth {depth} outside the layer")]
    InvalidDepth { layer: usize, depth: f64 },
    #[error("invalid abundance {0}")]
    InvalidAbundance(f64),
    #[error("{shape}: {reason}")]
    InvalidShape { shape: &'static str, reason: String },
    #[error("invalid interference function: {0}")]
    InvalidInterference(String),
    #[error("unknown sample builder '{0}'")]
    UnknownBuilder(String),
    #[error("sample builder '{builder}' has no parameter '{name}'")]
    UnknownParameter { builder: String, name: String },
}
