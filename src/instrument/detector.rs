//! Area detectors: pixels binned along two axes, either in exit angles
//! (spherical) or in positions on a flat plate (rectangular).

use serde::{Deserialize, Serialize};

use super::{DetectorMask, FixedBinAxis, InstrumentError, MaskShape};

/// How pixel coordinates map to exit angles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DetectorGeometry {
    /// Axes are `phi_f` and `alpha_f` in radians.
    #[default]
    Spherical,
    /// Flat plate perpendicular to the sample surface at `distance` from the
    /// sample. Axes are positions `u` (horizontal) and `v` (vertical) on the
    /// plate; `(u0, v0)` is where the plate normal through the sample hits it.
    /// Lengths share one unit.
    Rectangular { distance: f64, u0: f64, v0: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    pub x_axis: FixedBinAxis,
    pub y_axis: FixedBinAxis,
    #[serde(default)]
    pub geometry: DetectorGeometry,
    #[serde(default)]
    pub mask: DetectorMask,
}

impl Default for Detector {
    /// Detector without bins; fails validation until axes are set.
    fn default() -> Self {
        let empty = |name: &str| FixedBinAxis {
            name: name.to_string(),
            size: 0,
            min: 0.0,
            max: 0.0,
        };
        Self {
            x_axis: empty("phi_f"),
            y_axis: empty("alpha_f"),
            geometry: DetectorGeometry::Spherical,
            mask: DetectorMask::new(),
        }
    }
}

impl Detector {
    /// Spherical detector binned in `phi_f` × `alpha_f`.
    pub fn new(
        n_phi: usize,
        phi_min: f64,
        phi_max: f64,
        n_alpha: usize,
        alpha_min: f64,
        alpha_max: f64,
    ) -> Result<Self, InstrumentError> {
        let mut detector = Self {
            x_axis: FixedBinAxis::new("phi_f", n_phi, phi_min, phi_max)?,
            y_axis: FixedBinAxis::new("alpha_f", n_alpha, alpha_min, alpha_max)?,
            geometry: DetectorGeometry::Spherical,
            mask: DetectorMask::new(),
        };
        detector.update_mask();
        Ok(detector)
    }

    /// Rectangular plate of `width` × `height` split into `nx` × `ny` pixels.
    /// The plate spans `u ∈ [0, width]`, `v ∈ [0, height]`.
    pub fn rectangular(
        nx: usize,
        width: f64,
        ny: usize,
        height: f64,
        distance: f64,
        u0: f64,
        v0: f64,
    ) -> Result<Self, InstrumentError> {
        if !(distance > 0.0) {
            return Err(InstrumentError::InvalidDistance(distance));
        }
        let mut detector = Self {
            x_axis: FixedBinAxis::new("u", nx, 0.0, width)?,
            y_axis: FixedBinAxis::new("v", ny, 0.0, height)?,
            geometry: DetectorGeometry::Rectangular { distance, u0, v0 },
            mask: DetectorMask::new(),
        };
        detector.update_mask();
        Ok(detector)
    }

    /// `(alpha_f, phi_f)` of the centre of pixel `(ix, iy)`.
    pub fn pixel_direction(&self, ix: usize, iy: usize) -> (f64, f64) {
        let (x, y) = (self.x_axis.bin_center(ix), self.y_axis.bin_center(iy));
        match self.geometry {
            DetectorGeometry::Spherical => (y, x),
            DetectorGeometry::Rectangular { distance, u0, v0 } => {
                let (u, v) = (x - u0, y - v0);
                (v.atan2(distance.hypot(u)), u.atan2(distance))
            }
        }
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if let DetectorGeometry::Rectangular { distance, .. } = self.geometry {
            if !(distance > 0.0) {
                return Err(InstrumentError::InvalidDistance(distance));
            }
        }
        for axis in [&self.x_axis, &self.y_axis] {
            if axis.size == 0 || !(axis.max > axis.min) {
                return Err(InstrumentError::InvalidAxis {
                    size: axis.size,
                    min: axis.min,
                    max: axis.max,
                });
            }
        }
        Ok(())
    }

    /// Number of pixels, masked or not.
    pub fn total_size(&self) -> usize {
        self.x_axis.size * self.y_axis.size
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.x_axis.size, self.y_axis.size)
    }

    /// `Δφ · (sin α_max − sin α_min)` for a spherical detector;
    /// `Δu·Δv·D / r³` at the pixel centre for a rectangular one.
    pub fn pixel_solid_angle(&self, ix: usize, iy: usize) -> f64 {
        match self.geometry {
            DetectorGeometry::Spherical => {
                let (a_lo, a_hi) = self.y_axis.bin_bounds(iy);
                self.x_axis.bin_width() * (a_hi.sin() - a_lo.sin())
            }
            DetectorGeometry::Rectangular { distance, u0, v0 } => {
                let u = self.x_axis.bin_center(ix) - u0;
                let v = self.y_axis.bin_center(iy) - v0;
                let r = (distance * distance + u * u + v * v).sqrt();
                self.x_axis.bin_width() * self.y_axis.bin_width() * distance / r.powi(3)
            }
        }
    }

    pub fn add_mask(&mut self, shape: MaskShape, mask_value: bool) {
        self.mask.add_mask(shape, mask_value);
        self.update_mask();
    }

    pub fn mask_all(&mut self) {
        self.mask.mask_all();
        self.update_mask();
    }

    pub fn remove_masks(&mut self) {
        self.mask.clear();
    }

    /// Recompute the per-pixel mask after axes or shapes changed.
    pub fn update_mask(&mut self) {
        self.mask.init(&self.x_axis, &self.y_axis);
    }

    pub fn is_masked(&self, ix: usize, iy: usize) -> bool {
        self.mask.is_masked(ix, iy)
    }

    pub fn masked_count(&self) -> usize {
        self.mask.masked_count()
    }

    /// Global indices `ix·ny + iy` of every unmasked pixel, in order.
    pub fn active_indices(&self) -> Vec<usize> {
        let ny = self.y_axis.size;
        (0..self.total_size())
            .filter(|&index| !self.is_masked(index / ny, index % ny))
            .collect()
    }
}
