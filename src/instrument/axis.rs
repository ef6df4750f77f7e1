//! Fixed-width binned axis.

use serde::{Deserialize, Serialize};

use super::InstrumentError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AxisFields")]
pub struct FixedBinAxis {
    pub name: String,
    pub size: usize,
    pub min: f64,
    pub max: f64,
}

/// Unchecked serde form; deserialized axes go through [`FixedBinAxis::new`].
#[derive(Deserialize)]
struct AxisFields {
    name: String,
    size: usize,
    min: f64,
    max: f64,
}

impl TryFrom<AxisFields> for FixedBinAxis {
    type Error = InstrumentError;

    fn try_from(fields: AxisFields) -> Result<Self, Self::Error> {
        Self::new(fields.name, fields.size, fields.min, fields.max)
    }
}

impl FixedBinAxis {
    pub fn new(name: impl Into<String>, size: usize, min: f64, max: f64) -> Result<Self, InstrumentError> {
        if size == 0 || !(max > min) {
            return Err(InstrumentError::InvalidAxis {
                size,
                min,
                max,
            });
        }
        Ok(Self {
            name: name.into(),
            size,
            min,
            max,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.size as f64
    }

    pub fn bin_bounds(&self, index: usize) -> (f64, f64) {
        let w = self.bin_width();
        let lo = self.min + index as f64 * w;
        (lo, lo + w)
    }

    pub fn bin_center(&self, index: usize) -> f64 {
        self.min + (index as f64 + 0.5) * self.bin_width()
    }

    pub fn bin_centers(&self) -> Vec<f64> {
        (0..self.size).map(|i| self.bin_center(i)).collect()
    }

    /// Index of the bin containing `value`, clamped to the axis.
    pub fn find_closest_index(&self, value: f64) -> usize {
        if value <= self.min {
            return 0;
        }
        let index = ((value - self.min) / self.bin_width()).floor() as usize;
        index.min(self.size.saturating_sub(1))
    }

    /// Sub-axis covering the bins that contain `lo` and `hi`.
    pub fn clip(&self, lo: f64, hi: f64) -> Result<(Self, usize), InstrumentError> {
        if hi < lo {
            return Err(InstrumentError::InvalidAxis {
                size: self.size,
                min: lo,
                max: hi,
            });
        }
        let first = self.find_closest_index(lo);
        let last = self.find_closest_index(hi);
        let (min, _) = self.bin_bounds(first);
        let (_, max) = self.bin_bounds(last);
        Ok((
            Self {
                name: self.name.clone(),
                size: last - first + 1,
                min,
                max,
            },
            first,
        ))
    }
}
