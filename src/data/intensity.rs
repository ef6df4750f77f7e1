//! Two-dimensional intensity maps and one-dimensional slices.

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::instrument::FixedBinAxis;

use super::DataError;

/// Intensity over a detector, indexed `[ix, iy]` with `ix` along `x_axis`.
///
/// The global bin index is `ix·ny + iy`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntensityFields")]
pub struct IntensityData {
    pub x_axis: FixedBinAxis,
    pub y_axis: FixedBinAxis,
    values: Array2<f64>,
}

#[derive(Deserialize)]
struct IntensityFields {
    x_axis: FixedBinAxis,
    y_axis: FixedBinAxis,
    values: Array2<f64>,
}

impl TryFrom<IntensityFields> for IntensityData {
    type Error = DataError;

    fn try_from(fields: IntensityFields) -> Result<Self, Self::Error> {
        Self::from_array(fields.x_axis, fields.y_axis, fields.values)
    }
}

impl IntensityData {
    /// Zero-filled map.
    pub fn new(x_axis: FixedBinAxis, y_axis: FixedBinAxis) -> Self {
        let values = Array2::zeros((x_axis.size, y_axis.size));
        Self {
            x_axis,
            y_axis,
            values,
        }
    }

    pub fn from_array(
        x_axis: FixedBinAxis,
        y_axis: FixedBinAxis,
        values: Array2<f64>,
    ) -> Result<Self, DataError> {
        let expected = (x_axis.size, y_axis.size);
        if values.dim() != expected {
            return Err(DataError::ShapeMismatch {
                expected,
                actual: values.dim(),
            });
        }
        Ok(Self {
            x_axis,
            y_axis,
            values,
        })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    #[inline]
    pub fn total_bins(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn split_index(&self, index: usize) -> (usize, usize) {
        let ny = self.y_axis.size;
        (index / ny, index % ny)
    }

    pub fn bin_content(&self, index: usize) -> Option<f64> {
        if index >= self.total_bins() {
            return None;
        }
        let (ix, iy) = self.split_index(index);
        Some(self.values[[ix, iy]])
    }

    pub fn set_bin_content(&mut self, index: usize, value: f64) -> bool {
        if index >= self.total_bins() {
            return false;
        }
        let (ix, iy) = self.split_index(index);
        self.values[[ix, iy]] = value;
        true
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    pub fn scale(&mut self, factor: f64) {
        self.values *= factor;
    }

    pub fn array(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    /// Values in global index order.
    pub fn raw_values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn same_shape(&self, other: &IntensityData) -> bool {
        self.shape() == other.shape()
    }

    pub fn add_assign(&mut self, other: &IntensityData) -> Result<(), DataError> {
        if !self.same_shape(other) {
            return Err(DataError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        self.values += &other.values;
        Ok(())
    }

    /// Slice along x at the y bin closest to `y`.
    pub fn projection_x(&self, y: f64) -> Histogram1D {
        let iy = self.y_axis.find_closest_index(y);
        Histogram1D {
            axis: self.x_axis.clone(),
            values: self.values.column(iy).to_vec(),
        }
    }

    /// Slice along y at the x bin closest to `x`.
    pub fn projection_y(&self, x: f64) -> Histogram1D {
        let ix = self.x_axis.find_closest_index(x);
        Histogram1D {
            axis: self.y_axis.clone(),
            values: self.values.row(ix).to_vec(),
        }
    }

    /// Sub-map covering the bins that contain the given corners.
    pub fn clipped(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, DataError> {
        let (x_axis, x0) = self.x_axis.clip(x1, x2)?;
        let (y_axis, y0) = self.y_axis.clip(y1, y2)?;
        let values = self
            .values
            .slice(s![x0..x0 + x_axis.size, y0..y0 + y_axis.size])
            .to_owned();
        Ok(Self {
            x_axis,
            y_axis,
            values,
        })
    }
}

/// One-dimensional slice of an intensity map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    pub axis: FixedBinAxis,
    pub values: Vec<f64>,
}

impl Histogram1D {
    pub fn bin_centers(&self) -> Vec<f64> {
        self.axis.bin_centers()
    }

    pub fn bin_values(&self) -> &[f64] {
        &self.values
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn x_min(&self) -> f64 {
        self.axis.min
    }

    pub fn x_max(&self) -> f64 {
        self.axis.max
    }
}
