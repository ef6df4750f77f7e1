//! Length and angle units.
//!
//! Lengths are expressed in nanometers and angles in radians throughout the
//! crate; multiply by these constants when building samples and instruments.

use std::f64::consts::PI;

pub const NANOMETER: f64 = 1.0;
pub const ANGSTROM: f64 = 0.1;
pub const MICROMETER: f64 = 1000.0;

pub const RADIAN: f64 = 1.0;
pub const DEGREE: f64 = PI / 180.0;
pub const DEG: f64 = DEGREE;

/// Convert degrees to radians.
#[inline]
pub fn deg2rad(angle: f64) -> f64 {
    angle * DEGREE
}

/// Convert radians to degrees.
#[inline]
pub fn rad2deg(angle: f64) -> f64 {
    angle / DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_conversion() {
        assert!((deg2rad(180.0) - PI).abs() < 1e-15);
        assert!((rad2deg(deg2rad(0.2)) - 0.2).abs() < 1e-15);
        assert!((10.0 * ANGSTROM - NANOMETER).abs() < 1e-15);
    }
}
