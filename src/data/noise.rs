//! Synthetic "measured" data.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::IntensityData;

/// Replace every bin `a` with `max(0, N(a, factor·√a))`.
pub fn add_gaussian_noise<R: Rng + ?Sized>(data: &mut IntensityData, factor: f64, rng: &mut R) {
    for value in data.array_mut().iter_mut() {
        let amplitude = *value;
        let sigma = factor * amplitude.max(0.0).sqrt();
        let noisy = match Normal::new(amplitude, sigma) {
            Ok(normal) if sigma > 0.0 => normal.sample(rng),
            _ => amplitude,
        };
        *value = noisy.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::FixedBinAxis;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_noise_is_non_negative_and_seeded() {
        let x = FixedBinAxis::new("x", 10, 0.0, 1.0).unwrap();
        let y = FixedBinAxis::new("y", 10, 0.0, 1.0).unwrap();
        let mut a = IntensityData::new(x, y);
        a.array_mut().fill(4.0);
        let mut b = a.clone();

        add_gaussian_noise(&mut a, 1.0, &mut StdRng::seed_from_u64(7));
        add_gaussian_noise(&mut b, 1.0, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.min() >= 0.0);
        assert!(a.array().iter().any(|v| *v != 4.0));
    }

    #[test]
    fn test_zero_factor_keeps_values() {
        let x = FixedBinAxis::new("x", 2, 0.0, 1.0).unwrap();
        let y = FixedBinAxis::new("y", 2, 0.0, 1.0).unwrap();
        let mut a = IntensityData::new(x, y);
        a.array_mut().fill(9.0);
        add_gaussian_noise(&mut a, 0.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.sum(), 36.0);
    }
}
