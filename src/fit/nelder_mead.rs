//! Downhill simplex minimizer.

use super::minimizer::{Minimizer, MinimizerResult, Objective};
use super::FitError;

#[derive(Clone, Debug)]
pub struct NelderMead {
    max_iter: usize,
    tolerance: f64,
    alpha: f64,
    gamma: f64,
    rho: f64,
    sigma: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-6,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
        }
    }
}

impl NelderMead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Stop when the spread of simplex values falls below
    /// `tolerance · (|f_best| + 1)`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

fn lerp(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + t * (y - x)).collect()
}

impl Minimizer for NelderMead {
    fn name(&self) -> &'static str {
        "NelderMead"
    }

    fn algorithm(&self) -> &'static str {
        "Simplex"
    }

    fn minimize(
        &mut self,
        objective: &mut dyn Objective,
        start: &[f64],
        steps: &[f64],
    ) -> Result<MinimizerResult, FitError> {
        let n = start.len();
        let mut calls = 0usize;
        let mut eval = |x: &[f64], calls: &mut usize| -> Result<f64, FitError> {
            *calls += 1;
            let v = objective.value(x)?;
            Ok(if v.is_finite() { v } else { f64::INFINITY })
        };

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), eval(start, &mut calls)?));
        for i in 0..n {
            let mut x = start.to_vec();
            let step = steps.get(i).copied().filter(|s| *s != 0.0).unwrap_or(0.05);
            x[i] += step;
            let f = eval(&x, &mut calls)?;
            simplex.push((x, f));
        }

        let mut converged = false;
        for _ in 0..self.max_iter {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            let best = simplex[0].1;
            let worst = simplex[n].1;
            if n == 0 || (worst - best).abs() <= self.tolerance * (best.abs() + 1.0) {
                converged = true;
                break;
            }

            let mut centroid = vec![0.0; n];
            for (x, _) in &simplex[..n] {
                for (c, v) in centroid.iter_mut().zip(x) {
                    *c += v / n as f64;
                }
            }

            let reflected = lerp(&centroid, &simplex[n].0, -self.alpha);
            let f_r = eval(&reflected, &mut calls)?;

            if f_r < best {
                let expanded = lerp(&centroid, &simplex[n].0, -self.gamma);
                let f_e = eval(&expanded, &mut calls)?;
                simplex[n] = if f_e < f_r { (expanded, f_e) } else { (reflected, f_r) };
                continue;
            }
            if f_r < simplex[n - 1].1 {
                simplex[n] = (reflected, f_r);
                continue;
            }

            let (contracted, f_c) = if f_r < worst {
                let x = lerp(&centroid, &reflected, self.rho);
                let f = eval(&x, &mut calls)?;
                (x, f)
            } else {
                let x = lerp(&centroid, &simplex[n].0, self.rho);
                let f = eval(&x, &mut calls)?;
                (x, f)
            };
            if f_c < worst.min(f_r) {
                simplex[n] = (contracted, f_c);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                let x = lerp(&anchor, &vertex.0, self.sigma);
                let f = eval(&x, &mut calls)?;
                *vertex = (x, f);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (parameters, value) = simplex.swap_remove(0);
        tracing::debug!(calls, value, converged, "simplex finished");
        Ok(MinimizerResult {
            parameters,
            value,
            function_calls: calls,
            converged,
            covariance: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Rosenbrock;

    impl Objective for Rosenbrock {
        fn value(&mut self, x: &[f64]) -> Result<f64, FitError> {
            Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2))
        }

        fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>, FitError> {
            Ok(vec![1.0 - x[0], 10.0 * (x[1] - x[0] * x[0])])
        }
    }

    #[test]
    fn test_rosenbrock() {
        let mut nm = NelderMead::new().with_max_iter(5000).with_tolerance(1e-12);
        let result = nm.minimize(&mut Rosenbrock, &[-1.2, 1.0], &[0.1, 0.1]).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.parameters[1], 1.0, epsilon = 1e-3);
    }

    struct Failing;

    impl Objective for Failing {
        fn value(&mut self, _x: &[f64]) -> Result<f64, FitError> {
            Err(FitError::Interrupted)
        }

        fn residuals(&mut self, _x: &[f64]) -> Result<Vec<f64>, FitError> {
            Err(FitError::Interrupted)
        }
    }

    #[test]
    fn test_error_propagates() {
        assert!(matches!(
            NelderMead::new().minimize(&mut Failing, &[0.0], &[0.1]),
            Err(FitError::Interrupted)
        ));
    }
}
