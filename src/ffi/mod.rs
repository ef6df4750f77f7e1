//! FFI (Foreign Function Interface) layer for C bindings.
//!
//! Exposes standard simulations and the functional test runtime to C and
//! to Python via cffi.

pub mod runtime;
pub mod simulation;
pub mod types;

pub use runtime::*;
pub use simulation::*;
pub use types::*;
