//! GISAS Rust Runtime - grazing-incidence small-angle scattering simulation
//! and fitting.
//!
//! This crate provides:
//!
//! - A layered sample model (materials, particles, layouts, interference)
//! - A DWBA scattering engine parallelized over detector pixels with rayon
//! - Instrument description with detector masks and resolution
//! - A fit suite with parameter limits, strategies and observers
//! - A functional test runtime comparing standard simulations to references
//! - FFI layer for Python (cffi) and other language bindings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     FFI Layer (gisasrs.h)           │
//! │  C-compatible functions & types     │
//! └─────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────┐
//! │  ┌───────────┐  ┌───────────────┐  │
//! │  │  Fit      │  │  Functional   │  │
//! │  │  Suite    │  │  Test Runtime │  │
//! │  └───────────┘  └───────────────┘  │
//! │          │              │           │
//! │          ▼              ▼           │
//! │  ┌───────────────────────────────┐  │
//! │  │  GisasSimulation              │  │
//! │  │  sample × instrument → I(φ,α) │  │
//! │  └───────────────────────────────┘  │
//! │  ┌───────────┐  ┌───────────────┐  │
//! │  │ Sample    │  │  DWBA engine  │  │
//! │  │ model     │  │  (rayon)      │  │
//! │  └───────────┘  └───────────────┘  │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gisasrs::sample::SampleBuilderRegistry;
//! use gisasrs::simulation::SimulationRegistry;
//!
//! let mut simulation = SimulationRegistry::new_with_defaults().create("MiniGISAS")?;
//! simulation.set_sample_builder(SampleBuilderRegistry::new_with_defaults().create("CylindersInDWBA")?);
//! simulation.run_simulation()?;
//! let intensity = simulation.intensity_data();
//! println!("total intensity {}", intensity.sum());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # FFI Usage
//!
//! ```c
//! SimulationHandle sim;
//! gisas_simulation_create_standard("CylindersInDWBA", "MiniGISAS", &sim);
//! gisas_simulation_run(sim);
//! CArrayView view; size_t nx, ny;
//! gisas_simulation_get_intensity(sim, &view, &nx, &ny);
//! gisas_simulation_free(sim);
//! ```

pub mod compute;
pub mod config;
pub mod data;
pub mod ffi;
pub mod fit;
pub mod instrument;
pub mod logging;
pub mod math;
pub mod param;
pub mod plot;
pub mod runtime;
pub mod sample;
pub mod simulation;
pub mod units;

// Re-export commonly used items
pub use config::{ConfigError, SimulationConfig};
pub use data::{DataError, Histogram1D, IntensityData};
pub use fit::{FitError, FitParameter, FitSuite, Limits};
pub use instrument::{Beam, Detector, DetectorGeometry, Instrument, InstrumentError, MaskShape};
pub use runtime::{FunctionalTest, Runtime, RuntimeConfig, RuntimeError, TestStatus};
pub use sample::{MultiLayer, SampleBuilder, SampleBuilderRegistry, SampleError};
pub use simulation::{GisasSimulation, SimulationError, SimulationOptions, SimulationRegistry};

// Re-export FFI types for cbindgen
pub use ffi::runtime::*;
pub use ffi::simulation::*;
pub use ffi::types::*;
