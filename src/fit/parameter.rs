//! Fit parameters and their limits.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::FitError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Limits {
    #[default]
    Unlimited,
    Limited(f64, f64),
    LowerLimited(f64),
    UpperLimited(f64),
    Positive,
    Fixed,
}

impl Limits {
    pub fn lower(&self) -> Option<f64> {
        match *self {
            Limits::Limited(lo, _) | Limits::LowerLimited(lo) => Some(lo),
            Limits::Positive => Some(0.0),
            _ => None,
        }
    }

    pub fn upper(&self) -> Option<f64> {
        match *self {
            Limits::Limited(_, hi) | Limits::UpperLimited(hi) => Some(hi),
            _ => None,
        }
    }

    pub fn is_in_range(&self, value: f64) -> bool {
        match *self {
            Limits::Positive => value > 0.0,
            _ => {
                self.lower().map_or(true, |lo| value >= lo)
                    && self.upper().map_or(true, |hi| value <= hi)
            }
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.lower().map_or(value, |lo| value.max(lo));
        self.upper().map_or(value, |hi| value.min(hi))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    /// Glob pattern over simulation parameter paths.
    pub name: String,
    pub value: f64,
    pub step: f64,
    pub error: f64,
    pub limits: Limits,
    pub fixed: bool,
}

impl FitParameter {
    /// `step` defaults to 1% of |value| (0.01 for zero).
    pub fn new(
        name: impl Into<String>,
        value: f64,
        limits: Limits,
        step: Option<f64>,
    ) -> Result<Self, FitError> {
        let name = name.into();
        if let Limits::Limited(lo, hi) = limits {
            if !(lo < hi) {
                return Err(FitError::InvalidLimits {
                    name,
                    reason: format!("lower {lo} not below upper {hi}"),
                });
            }
        }
        if !matches!(limits, Limits::Fixed) && !limits.is_in_range(value) {
            return Err(FitError::InvalidLimits {
                reason: format!("start value {value} outside {limits:?}"),
                name,
            });
        }
        let step = step.unwrap_or(if value == 0.0 { 0.01 } else { 0.01 * value.abs() });
        Ok(Self {
            name,
            value,
            step,
            error: 0.0,
            limits,
            fixed: matches!(limits, Limits::Fixed),
        })
    }

    pub fn is_free(&self) -> bool {
        !self.fixed
    }
}

/// Ordered set of fit parameters with unique names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitParameterSet {
    parameters: Vec<FitParameter>,
}

impl FitParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameter: FitParameter) -> Result<(), FitError> {
        if self.get(&parameter.name).is_some() {
            return Err(FitError::DuplicateParameter(parameter.name));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FitParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FitParameter> {
        self.parameters.iter_mut().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FitParameter> {
        self.parameters.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.value).collect()
    }

    pub fn set_values(&mut self, values: &[f64]) {
        for (p, v) in self.parameters.iter_mut().zip(values) {
            p.value = *v;
        }
    }

    /// Indices of parameters the minimizer may move.
    pub fn free_indices(&self) -> Vec<usize> {
        self.parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_free())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn free_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_free()).count()
    }

    pub fn free_parameters(&self) -> impl Iterator<Item = &FitParameter> {
        self.parameters.iter().filter(|p| p.is_free())
    }

    /// Write `values` into the free parameters, in order.
    pub fn set_free_values(&mut self, values: &[f64]) {
        for (p, v) in self.parameters.iter_mut().filter(|p| p.is_free()).zip(values) {
            p.value = *v;
        }
    }

    pub fn set_free_errors(&mut self, errors: &[f64]) {
        for (p, e) in self.parameters.iter_mut().filter(|p| p.is_free()).zip(errors) {
            p.error = *e;
        }
    }

    pub fn fix_all(&mut self) {
        for p in &mut self.parameters {
            p.fixed = true;
        }
    }

    /// Release everything except parameters with `Limits::Fixed`.
    pub fn release_all(&mut self) {
        for p in &mut self.parameters {
            p.fixed = matches!(p.limits, Limits::Fixed);
        }
    }

    pub fn fix(&mut self, name: &str) -> Result<(), FitError> {
        let p = self
            .get_mut(name)
            .ok_or_else(|| FitError::UnknownParameter(name.to_string()))?;
        p.fixed = true;
        Ok(())
    }

    pub fn release(&mut self, name: &str) -> Result<(), FitError> {
        let p = self
            .get_mut(name)
            .ok_or_else(|| FitError::UnknownParameter(name.to_string()))?;
        p.fixed = matches!(p.limits, Limits::Fixed);
        Ok(())
    }

    /// Table of names, values, errors and limits.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<50} {:>14} {:>12}  limits", "parameter", "value", "error");
        for p in &self.parameters {
            let _ = writeln!(
                out,
                "{:<50} {:>14.6e} {:>12.4e}  {:?}{}",
                p.name,
                p.value,
                p.error,
                p.limits,
                if p.fixed { " (fixed)" } else { "" }
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step() {
        let p = FitParameter::new("*radius", 6.0, Limits::Unlimited, None).unwrap();
        assert!((p.step - 0.06).abs() < 1e-12);
        let zero = FitParameter::new("*x", 0.0, Limits::Unlimited, None).unwrap();
        assert_eq!(zero.step, 0.01);
    }

    #[test]
    fn test_limits() {
        let l = Limits::Limited(4.0, 8.0);
        assert!(l.is_in_range(4.0) && l.is_in_range(8.0));
        assert!(!l.is_in_range(8.5));
        assert_eq!(l.clamp(10.0), 8.0);
        assert!(!Limits::Positive.is_in_range(0.0));
        assert_eq!(Limits::LowerLimited(1.0).clamp(-3.0), 1.0);
        assert!(FitParameter::new("a", 9.0, l, None).is_err());
        assert!(FitParameter::new("a", 5.0, Limits::Limited(3.0, 3.0), None).is_err());
    }

    #[test]
    fn test_fix_release() {
        let mut set = FitParameterSet::new();
        set.add(FitParameter::new("a", 1.0, Limits::Unlimited, None).unwrap()).unwrap();
        set.add(FitParameter::new("b", 2.0, Limits::Fixed, None).unwrap()).unwrap();
        set.add(FitParameter::new("c", 3.0, Limits::Unlimited, None).unwrap()).unwrap();
        assert!(matches!(
            set.add(FitParameter::new("a", 1.0, Limits::Unlimited, None).unwrap()),
            Err(FitError::DuplicateParameter(_))
        ));
        assert_eq!(set.free_indices(), vec![0, 2]);

        set.fix("a").unwrap();
        assert_eq!(set.free_count(), 1);
        set.set_free_values(&[30.0]);
        assert_eq!(set.values(), vec![1.0, 2.0, 30.0]);

        set.release_all();
        assert_eq!(set.free_count(), 2);
        set.fix_all();
        assert_eq!(set.free_count(), 0);
        assert!(set.release("zzz").is_err());
        assert!(set.report().contains("(fixed)"));
    }
}
