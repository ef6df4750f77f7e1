//! Levenberg–Marquardt least squares over the residual vector.

use nalgebra::{DMatrix, DVector};

use super::minimizer::{Minimizer, MinimizerResult, Objective};
use super::FitError;

#[derive(Clone, Debug)]
pub struct LevenbergMarquardt {
    max_iter: usize,
    tolerance: f64,
    initial_lambda: f64,
    lambda_factor: f64,
    max_lambda: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-8,
            initial_lambda: 1e-3,
            lambda_factor: 10.0,
            max_lambda: 1e10,
        }
    }
}

impl LevenbergMarquardt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Forward-difference Jacobian, one residual row per data point.
    fn jacobian(
        objective: &mut dyn Objective,
        x: &[f64],
        r: &DVector<f64>,
        steps: &[f64],
        calls: &mut usize,
    ) -> Result<DMatrix<f64>, FitError> {
        let mut jac = DMatrix::zeros(r.len(), x.len());
        for j in 0..x.len() {
            let h = (steps.get(j).copied().unwrap_or(0.0).abs() * 1e-2).max(1e-8 * x[j].abs().max(1.0));
            let mut shifted = x.to_vec();
            shifted[j] += h;
            *calls += 1;
            let r_shifted = DVector::from_vec(objective.residuals(&shifted)?);
            if r_shifted.len() != r.len() {
                return Err(FitError::NonFinite);
            }
            jac.set_column(j, &((r_shifted - r) / h));
        }
        Ok(jac)
    }
}

fn finite_sum_squares(r: &DVector<f64>) -> Result<f64, FitError> {
    let chi = r.norm_squared();
    if chi.is_finite() {
        Ok(chi)
    } else {
        Err(FitError::NonFinite)
    }
}

impl Minimizer for LevenbergMarquardt {
    fn name(&self) -> &'static str {
        "LevenbergMarquardt"
    }

    fn algorithm(&self) -> &'static str {
        "Default"
    }

    fn minimize(
        &mut self,
        objective: &mut dyn Objective,
        start: &[f64],
        steps: &[f64],
    ) -> Result<MinimizerResult, FitError> {
        let n = start.len();
        let mut x = start.to_vec();
        let mut calls = 1usize;
        let mut r = DVector::from_vec(objective.residuals(&x)?);
        let mut chi = finite_sum_squares(&r)?;
        let mut lambda = self.initial_lambda;
        let mut converged = n == 0;
        let mut jac = DMatrix::zeros(r.len(), n);

        'outer: for _ in 0..self.max_iter {
            if converged {
                break;
            }
            jac = Self::jacobian(objective, &x, &r, steps, &mut calls)?;
            let jt = jac.transpose();
            let a = &jt * &jac;
            let g = &jt * &r;

            loop {
                let mut m = a.clone();
                for i in 0..n {
                    m[(i, i)] += lambda * a[(i, i)].max(1e-12);
                }
                let Some(delta) = m.lu().solve(&(-&g)) else {
                    lambda *= self.lambda_factor;
                    if lambda > self.max_lambda {
                        break 'outer;
                    }
                    continue;
                };
                let candidate: Vec<f64> = x.iter().zip(delta.iter()).map(|(xi, di)| xi + di).collect();
                calls += 1;
                let r_new = DVector::from_vec(objective.residuals(&candidate)?);
                let chi_new = r_new.norm_squared();
                if chi_new.is_finite() && chi_new < chi {
                    let improvement = chi - chi_new;
                    x = candidate;
                    r = r_new;
                    chi = chi_new;
                    lambda = (lambda / self.lambda_factor).max(1e-12);
                    if improvement <= self.tolerance * chi.max(self.tolerance)
                        || delta.norm() <= self.tolerance * (1.0 + x.iter().map(|v| v * v).sum::<f64>().sqrt())
                    {
                        converged = true;
                    }
                    break;
                }
                lambda *= self.lambda_factor;
                if lambda > self.max_lambda {
                    // no downhill step left at any damping
                    converged = true;
                    break 'outer;
                }
            }
        }

        let dof = r.len().saturating_sub(n).max(1) as f64;
        let covariance = (jac.transpose() * &jac)
            .try_inverse()
            .map(|inv| inv * (chi / dof));
        tracing::debug!(calls, chi, converged, "levenberg-marquardt finished");
        Ok(MinimizerResult {
            parameters: x,
            value: chi,
            function_calls: calls,
            converged,
            covariance,
        })
    }
}
