//! Detector masks.
//!
//! Shapes live in detector coordinates: x is `phi_f`, y is `alpha_f`, both in
//! radians. Area shapes test the pixel centre; lines test whether they cross
//! the pixel's bin.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::FixedBinAxis;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum MaskShape {
    Rectangle {
        xlow: f64,
        ylow: f64,
        xup: f64,
        yup: f64,
    },
    Ellipse {
        xc: f64,
        yc: f64,
        rx: f64,
        ry: f64,
        #[serde(default)]
        theta: f64,
    },
    Polygon {
        points: Vec<(f64, f64)>,
    },
    HorizontalLine {
        y: f64,
    },
    VerticalLine {
        x: f64,
    },
    InfinitePlane,
}

impl MaskShape {
    /// Whether the shape covers the pixel spanning `x_bin` × `y_bin`.
    pub fn contains(&self, x_bin: (f64, f64), y_bin: (f64, f64)) -> bool {
        let x = 0.5 * (x_bin.0 + x_bin.1);
        let y = 0.5 * (y_bin.0 + y_bin.1);
        match self {
            MaskShape::Rectangle {
                xlow,
                ylow,
                xup,
                yup,
            } => x >= *xlow && x <= *xup && y >= *ylow && y <= *yup,
            MaskShape::Ellipse {
                xc,
                yc,
                rx,
                ry,
                theta,
            } => {
                let (s, c) = theta.sin_cos();
                let dx = x - xc;
                let dy = y - yc;
                let u = dx * c + dy * s;
                let v = -dx * s + dy * c;
                (u / rx).powi(2) + (v / ry).powi(2) <= 1.0
            }
            MaskShape::Polygon { points } => point_in_polygon(points, x, y),
            MaskShape::HorizontalLine { y } => *y >= y_bin.0 && *y <= y_bin.1,
            MaskShape::VerticalLine { x } => *x >= x_bin.0 && *x <= x_bin.1,
            MaskShape::InfinitePlane => true,
        }
    }
}

fn point_in_polygon(points: &[(f64, f64)], x: f64, y: f64) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub shape: MaskShape,
    /// `true` masks the covered pixels, `false` unmasks them.
    pub mask_value: bool,
}

/// Ordered list of mask shapes and the per-pixel mask they produce.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DetectorMask {
    entries: Vec<MaskEntry>,
    #[serde(skip)]
    data: Option<Array2<bool>>,
}

// The pixel mask is a cache of the entries.
impl PartialEq for DetectorMask {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl DetectorMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MaskEntry] {
        &self.entries
    }

    /// Append a shape; later shapes override earlier ones.
    pub fn add_mask(&mut self, shape: MaskShape, mask_value: bool) {
        self.entries.push(MaskEntry { shape, mask_value });
        self.data = None;
    }

    pub fn mask_all(&mut self) {
        self.add_mask(MaskShape::InfinitePlane, true);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.data = None;
    }

    pub fn has_masks(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Recompute the per-pixel mask for the given axes.
    pub fn init(&mut self, x_axis: &FixedBinAxis, y_axis: &FixedBinAxis) {
        if self.entries.is_empty() {
            self.data = None;
            return;
        }
        let mut data = Array2::from_elem((x_axis.size, y_axis.size), false);
        for ((ix, iy), masked) in data.indexed_iter_mut() {
            let x_bin = x_axis.bin_bounds(ix);
            let y_bin = y_axis.bin_bounds(iy);
            *masked = self
                .entries
                .iter()
                .rev()
                .find(|entry| entry.shape.contains(x_bin, y_bin))
                .map(|entry| entry.mask_value)
                .unwrap_or(false);
        }
        self.data = Some(data);
    }

    pub fn is_initialized(&self) -> bool {
        self.entries.is_empty() || self.data.is_some()
    }

    pub fn is_masked(&self, ix: usize, iy: usize) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get((ix, iy)).copied())
            .unwrap_or(false)
    }

    pub fn masked_count(&self) -> usize {
        self.data
            .as_ref()
            .map(|d| d.iter().filter(|m| **m).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> (FixedBinAxis, FixedBinAxis) {
        (
            FixedBinAxis::new("x", 10, 0.0, 10.0).unwrap(),
            FixedBinAxis::new("y", 10, 0.0, 10.0).unwrap(),
        )
    }

    #[test]
    fn test_rectangle() {
        let (x, y) = axes();
        let mut mask = DetectorMask::new();
        mask.add_mask(
            MaskShape::Rectangle {
                xlow: 0.0,
                ylow: 0.0,
                xup: 2.0,
                yup: 10.0,
            },
            true,
        );
        mask.init(&x, &y);
        assert_eq!(mask.masked_count(), 20);
        assert!(mask.is_masked(1, 5));
        assert!(!mask.is_masked(2, 5));
    }

    #[test]
    fn test_later_shapes_override() {
        let (x, y) = axes();
        let mut mask = DetectorMask::new();
        mask.mask_all();
        mask.add_mask(MaskShape::HorizontalLine { y: 3.5 }, false);
        mask.add_mask(MaskShape::VerticalLine { x: 7.5 }, false);
        mask.init(&x, &y);
        assert_eq!(mask.masked_count(), 100 - 19);
        assert!(!mask.is_masked(0, 3));
        assert!(!mask.is_masked(7, 0));
        assert!(mask.is_masked(0, 0));
    }

    #[test]
    fn test_ellipse_and_polygon() {
        let (x, y) = axes();
        let mut mask = DetectorMask::new();
        mask.add_mask(
            MaskShape::Ellipse {
                xc: 5.0,
                yc: 5.0,
                rx: 1.0,
                ry: 1.0,
                theta: 0.0,
            },
            true,
        );
        mask.init(&x, &y);
        assert_eq!(mask.masked_count(), 4);

        let mut mask = DetectorMask::new();
        mask.add_mask(
            MaskShape::Polygon {
                points: vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)],
            },
            true,
        );
        mask.init(&x, &y);
        assert_eq!(mask.masked_count(), 16);
    }

    #[test]
    fn test_empty_mask() {
        let (x, y) = axes();
        let mut mask = DetectorMask::new();
        mask.init(&x, &y);
        assert!(!mask.is_masked(0, 0));
        assert_eq!(mask.masked_count(), 0);
    }
}
