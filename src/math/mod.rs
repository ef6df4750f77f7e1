//! Vector algebra and special functions used by the scattering engine.

pub mod special;
pub mod vector;

pub use special::{bessel_j1, erf, j1_over_x, normal_cdf, simpson, sinc};
pub use vector::{to_complex, wavevector, CVector, KVector};
