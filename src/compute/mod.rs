//! Scattering computation: Fresnel coefficients, DWBA amplitudes,
//! interference strategies and the parallel element loop.

pub mod dwba;
pub mod element;
pub mod engine;
pub mod fresnel;
pub mod strategy;

pub use element::SimulationElement;
pub use engine::{run_elements, DwbaComputation};
pub use fresnel::{compute_coefficients, FresnelCoefficients};
pub use strategy::LayoutStrategy;
