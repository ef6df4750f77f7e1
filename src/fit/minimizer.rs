//! Minimizer interface, bounded-parameter transforms and the factory.

use nalgebra::DMatrix;

use super::{FitError, LevenbergMarquardt, Limits, NelderMead};

/// Function to minimize.
pub trait Objective {
    /// Scalar chi².
    fn value(&mut self, x: &[f64]) -> Result<f64, FitError>;

    /// Residual vector whose squared sum is proportional to [`Objective::value`].
    fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>, FitError>;
}

#[derive(Clone, Debug)]
pub struct MinimizerResult {
    /// Minimizer-space coordinates of the best point.
    pub parameters: Vec<f64>,
    pub value: f64,
    pub function_calls: usize,
    pub converged: bool,
    /// Covariance in minimizer space, when the algorithm estimates one.
    pub covariance: Option<DMatrix<f64>>,
}

pub trait Minimizer: Send {
    fn name(&self) -> &'static str;

    fn algorithm(&self) -> &'static str {
        ""
    }

    fn minimize(
        &mut self,
        objective: &mut dyn Objective,
        start: &[f64],
        steps: &[f64],
    ) -> Result<MinimizerResult, FitError>;
}

/// Maps a bounded external parameter onto an unbounded internal one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParameterTransform {
    Identity,
    /// Two limits: `ext = lo + (hi − lo)(sin(int) + 1)/2`.
    Sine { lo: f64, hi: f64 },
    /// Lower limit: `ext = lo − 1 + sqrt(int² + 1)`.
    Lower(f64),
    /// Upper limit: `ext = hi + 1 − sqrt(int² + 1)`.
    Upper(f64),
}

impl ParameterTransform {
    pub fn from_limits(limits: &Limits) -> Self {
        match (limits.lower(), limits.upper()) {
            (Some(lo), Some(hi)) => ParameterTransform::Sine { lo, hi },
            (Some(lo), None) => ParameterTransform::Lower(lo),
            (None, Some(hi)) => ParameterTransform::Upper(hi),
            (None, None) => ParameterTransform::Identity,
        }
    }

    pub fn to_external(&self, internal: f64) -> f64 {
        match *self {
            ParameterTransform::Identity => internal,
            ParameterTransform::Sine { lo, hi } => lo + 0.5 * (hi - lo) * (internal.sin() + 1.0),
            ParameterTransform::Lower(lo) => lo - 1.0 + (internal * internal + 1.0).sqrt(),
            ParameterTransform::Upper(hi) => hi + 1.0 - (internal * internal + 1.0).sqrt(),
        }
    }

    pub fn to_internal(&self, external: f64) -> f64 {
        match *self {
            ParameterTransform::Identity => external,
            ParameterTransform::Sine { lo, hi } => {
                let s = (2.0 * (external - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0);
                s.asin()
            }
            ParameterTransform::Lower(lo) => {
                let d = (external - lo + 1.0).max(1.0);
                (d * d - 1.0).sqrt()
            }
            ParameterTransform::Upper(hi) => {
                let d = (hi - external + 1.0).max(1.0);
                (d * d - 1.0).sqrt()
            }
        }
    }

    /// `d ext / d int`.
    pub fn derivative(&self, internal: f64) -> f64 {
        match *self {
            ParameterTransform::Identity => 1.0,
            ParameterTransform::Sine { lo, hi } => 0.5 * (hi - lo) * internal.cos(),
            ParameterTransform::Lower(_) => internal / (internal * internal + 1.0).sqrt(),
            ParameterTransform::Upper(_) => -internal / (internal * internal + 1.0).sqrt(),
        }
    }

    /// Internal step corresponding to an external step at `external`.
    pub fn internal_step(&self, external: f64, step: f64) -> f64 {
        let internal = self.to_internal(external);
        let d = self.derivative(internal).abs();
        if d > 1e-3 {
            step / d
        } else {
            // near a limit or a turning point the mapping is flat
            0.1
        }
    }
}

/// Presents an objective over external (bounded) coordinates as one over
/// internal (unbounded) coordinates.
pub struct BoundedObjective<'a> {
    inner: &'a mut dyn Objective,
    transforms: Vec<ParameterTransform>,
}

impl<'a> BoundedObjective<'a> {
    pub fn new(inner: &'a mut dyn Objective, transforms: Vec<ParameterTransform>) -> Self {
        Self { inner, transforms }
    }

    pub fn external(&self, internal: &[f64]) -> Vec<f64> {
        self.transforms
            .iter()
            .zip(internal)
            .map(|(t, x)| t.to_external(*x))
            .collect()
    }
}

impl Objective for BoundedObjective<'_> {
    fn value(&mut self, x: &[f64]) -> Result<f64, FitError> {
        let external = self.external(x);
        self.inner.value(&external)
    }

    fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>, FitError> {
        let external = self.external(x);
        self.inner.residuals(&external)
    }
}

/// Evaluates the objective once at the start point.
#[derive(Clone, Debug, Default)]
pub struct TestMinimizer;

impl Minimizer for TestMinimizer {
    fn name(&self) -> &'static str {
        "Test"
    }

    fn minimize(
        &mut self,
        objective: &mut dyn Objective,
        start: &[f64],
        _steps: &[f64],
    ) -> Result<MinimizerResult, FitError> {
        let value = objective.value(start)?;
        Ok(MinimizerResult {
            parameters: start.to_vec(),
            value,
            function_calls: 1,
            converged: true,
            covariance: None,
        })
    }
}

pub struct MinimizerFactory;

impl MinimizerFactory {
    /// `(name, algorithm)` pairs accepted by [`MinimizerFactory::create`].
    pub fn catalogue() -> Vec<(&'static str, &'static str)> {
        vec![
            ("NelderMead", "Simplex"),
            ("LevenbergMarquardt", "Default"),
            ("Test", "Default"),
        ]
    }

    pub fn create(name: &str, algorithm: &str) -> Result<Box<dyn Minimizer>, FitError> {
        let algorithm_ok = |expected: &str| algorithm.is_empty() || algorithm.eq_ignore_ascii_case(expected);
        match name {
            "NelderMead" if algorithm_ok("Simplex") => Ok(Box::new(NelderMead::new())),
            "LevenbergMarquardt" if algorithm_ok("Default") => Ok(Box::new(LevenbergMarquardt::new())),
            "Test" => Ok(Box::new(TestMinimizer)),
            _ => Err(FitError::UnknownMinimizer(if algorithm.is_empty() {
                name.to_string()
            } else {
                format!("{name}/{algorithm}")
            })),
        }
    }
}
