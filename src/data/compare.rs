//! Epsilon-guarded relative difference between a result and its reference.

use ndarray::Array2;

use super::{DataError, IntensityData};

/// Contribution of one bin.
///
/// `v1` keeps its sign: a negative difference counts as "below epsilon".
#[inline]
fn bin_difference(value: f64, reference: f64) -> f64 {
    let epsilon = f64::EPSILON;
    let v1 = value - reference;
    let v2 = reference;
    if v1 <= epsilon && v2 <= epsilon {
        0.0
    } else if v2 <= epsilon {
        (v1 / epsilon).abs()
    } else {
        (v1 / v2).abs()
    }
}

/// Mean relative difference of two flat value sets of equal length.
pub fn relative_difference_values(data: &[f64], reference: &[f64]) -> Result<f64, DataError> {
    if data.len() != reference.len() {
        return Err(DataError::SizeMismatch {
            data: data.len(),
            reference: reference.len(),
        });
    }
    let total: f64 = data
        .iter()
        .zip(reference)
        .map(|(&v, &r)| bin_difference(v, r))
        .sum();
    let diff = total / data.len() as f64;
    if diff.is_nan() {
        return Err(DataError::NanDifference);
    }
    Ok(diff)
}

/// Mean relative difference between `data` and `reference`.
///
/// The reference is read in global bin order and reshaped to the data's
/// shape, so only the element counts have to agree.
pub fn relative_difference(data: &IntensityData, reference: &IntensityData) -> Result<f64, DataError> {
    relative_difference_values(&data.raw_values(), &reference.raw_values())
}

/// Per-bin relative differences with the data's axes.
pub fn relative_difference_map(
    data: &IntensityData,
    reference: &IntensityData,
) -> Result<IntensityData, DataError> {
    if data.total_bins() != reference.total_bins() {
        return Err(DataError::SizeMismatch {
            data: data.total_bins(),
            reference: reference.total_bins(),
        });
    }
    let values: Vec<f64> = data
        .array()
        .iter()
        .zip(reference.array().iter())
        .map(|(&v, &r)| bin_difference(v, r))
        .collect();
    let values = Array2::from_shape_vec(data.shape(), values).map_err(|_| DataError::SizeMismatch {
        data: data.total_bins(),
        reference: reference.total_bins(),
    })?;
    IntensityData::from_array(data.x_axis.clone(), data.y_axis.clone(), values)
}

/// True if the mean relative difference is within `threshold`.
pub fn check_against_reference(
    data: &IntensityData,
    reference: &IntensityData,
    threshold: f64,
) -> Result<bool, DataError> {
    let diff = relative_difference(data, reference)?;
    tracing::debug!(diff, threshold, "compared against reference");
    Ok(diff <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::FixedBinAxis;

    fn map(nx: usize, ny: usize, values: Vec<f64>) -> IntensityData {
        IntensityData::from_array(
            FixedBinAxis::new("x", nx, 0.0, 1.0).unwrap(),
            FixedBinAxis::new("y", ny, 0.0, 1.0).unwrap(),
            Array2::from_shape_vec((nx, ny), values).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_is_zero() {
        let a = map(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(relative_difference(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_relative() {
        let a = map(1, 2, vec![2.0, 4.0]);
        let b = map(1, 2, vec![1.0, 4.0]);
        assert_eq!(relative_difference(&a, &b).unwrap(), 0.5);
    }

    #[test]
    fn test_signed_difference_quirk() {
        // data below a zero reference gives a negative v1 and counts as equal
        assert_eq!(relative_difference_values(&[-1.0], &[0.0]).unwrap(), 0.0);
        // data above a zero reference is divided by epsilon
        let d = relative_difference_values(&[1.0], &[0.0]).unwrap();
        assert_eq!(d, 1.0 / f64::EPSILON);
    }

    #[test]
    fn test_reshape_only_counts_matter() {
        let a = map(2, 3, vec![1.0; 6]);
        let b = map(3, 2, vec![1.0; 6]);
        assert_eq!(relative_difference(&a, &b).unwrap(), 0.0);
        let c = map(1, 2, vec![1.0; 2]);
        assert!(matches!(
            relative_difference(&a, &c),
            Err(DataError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_nan_fails() {
        assert!(matches!(
            relative_difference_values(&[f64::NAN], &[1.0]),
            Err(DataError::NanDifference)
        ));
        assert!(matches!(
            relative_difference_values(&[], &[]),
            Err(DataError::NanDifference)
        ));
    }

    #[test]
    fn test_check_against_reference() {
        let a = map(1, 2, vec![1.0, 1.0]);
        let b = map(1, 2, vec![1.0, 1.0 + 1e-12]);
        assert!(check_against_reference(&a, &b, 1e-10).unwrap());
        let map = relative_difference_map(&a, &b).unwrap();
        assert_eq!(map.shape(), (1, 2));
    }
}
