//! The fit driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::data::IntensityData;
use crate::param::ParameterError;
use crate::simulation::GisasSimulation;

use super::minimizer::{BoundedObjective, ParameterTransform};
use super::observer::wants_update;
use super::{
    ChiSquaredModule, FitError, FitObject, FitObjects, FitObserver, FitParameter, FitParameterSet,
    FitProgress, FitStrategy, Limits, Minimizer, MinimizerFactory, NelderMead, Objective,
    PrintObserver,
};

#[derive(Clone, Debug)]
pub struct FitResult {
    pub chi2: f64,
    pub iterations: usize,
    pub parameters: Vec<FitParameter>,
    pub converged: bool,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl FitResult {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }
}

pub struct FitSuite {
    objects: FitObjects,
    parameters: FitParameterSet,
    minimizer: Box<dyn Minimizer>,
    strategies: Vec<FitStrategy>,
    observers: Vec<Box<dyn FitObserver>>,
    interrupt: Arc<AtomicBool>,
    iteration: usize,
    chi2: f64,
}

impl Default for FitSuite {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_parameters(objects: &mut FitObjects, parameters: &FitParameterSet) -> Result<(), FitError> {
    for p in parameters.iter() {
        objects.set_parameter_value(&p.name, p.value)?;
    }
    Ok(())
}

fn notify(observers: &mut [Box<dyn FitObserver>], progress: &FitProgress<'_>) {
    for observer in observers.iter_mut() {
        if wants_update(observer.as_ref(), progress) {
            observer.update(progress);
        }
    }
}

/// Objective over the free parameters' external values.
struct SuiteObjective<'s> {
    objects: &'s mut FitObjects,
    parameters: &'s mut FitParameterSet,
    observers: &'s mut [Box<dyn FitObserver>],
    interrupt: &'s AtomicBool,
    iteration: &'s mut usize,
    minimizer: &'static str,
    strategy_index: Option<usize>,
    start: Instant,
    best: Option<(Vec<f64>, f64)>,
}

impl SuiteObjective<'_> {
    fn evaluate(&mut self, x: &[f64]) -> Result<f64, FitError> {
        if self.interrupt.load(Ordering::Relaxed) {
            return Err(FitError::Interrupted);
        }
        self.parameters.set_free_values(x);
        apply_parameters(self.objects, &*self.parameters)?;
        self.objects.run_simulations()?;
        let chi2 = self.objects.chi_squared();
        *self.iteration += 1;
        if self.best.as_ref().map_or(true, |(_, best)| chi2 < *best) {
            self.best = Some((x.to_vec(), chi2));
        }
        let progress = FitProgress {
            iteration: *self.iteration,
            chi2,
            is_last: false,
            elapsed: self.start.elapsed(),
            minimizer: self.minimizer,
            strategy_index: self.strategy_index,
            parameters: &*self.parameters,
            objects: &*self.objects,
        };
        notify(self.observers, &progress);
        Ok(chi2)
    }
}

impl Objective for SuiteObjective<'_> {
    fn value(&mut self, x: &[f64]) -> Result<f64, FitError> {
        self.evaluate(x)
    }

    fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>, FitError> {
        self.evaluate(x)?;
        Ok(self.objects.residuals())
    }
}

struct StepOutcome {
    converged: bool,
    interrupted: bool,
}

impl FitSuite {
    pub fn new() -> Self {
        Self {
            objects: FitObjects::new(),
            parameters: FitParameterSet::new(),
            minimizer: Box::new(NelderMead::new()),
            strategies: Vec::new(),
            observers: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            iteration: 0,
            chi2: 0.0,
        }
    }

    pub fn add_simulation_and_real_data(
        &mut self,
        simulation: GisasSimulation,
        real_data: IntensityData,
        weight: f64,
    ) -> Result<(), FitError> {
        self.objects
            .add(FitObject::new(simulation, real_data, weight)?);
        Ok(())
    }

    /// Add a parameter addressed by a glob pattern, e.g.
    /// `*/FormFactorCylinder/radius`.
    pub fn add_fit_parameter(
        &mut self,
        pattern: &str,
        value: f64,
        limits: Limits,
        step: Option<f64>,
    ) -> Result<(), FitError> {
        self.parameters
            .add(FitParameter::new(pattern, value, limits, step)?)
    }

    pub fn set_minimizer(&mut self, minimizer: Box<dyn Minimizer>) {
        self.minimizer = minimizer;
    }

    pub fn set_minimizer_by_name(&mut self, name: &str, algorithm: &str) -> Result<(), FitError> {
        self.minimizer = MinimizerFactory::create(name, algorithm)?;
        Ok(())
    }

    pub fn minimizer_name(&self) -> &'static str {
        self.minimizer.name()
    }

    pub fn set_chi_squared_module(&mut self, module: ChiSquaredModule) {
        self.objects.set_chi_squared_module(module);
    }

    pub fn add_fit_strategy(&mut self, strategy: FitStrategy) {
        self.strategies.push(strategy);
    }

    pub fn attach_observer(&mut self, observer: Box<dyn FitObserver>) {
        self.observers.push(observer);
    }

    /// Log progress every `every` iterations.
    pub fn init_print(&mut self, every: usize) {
        self.attach_observer(Box::new(PrintObserver::new(every)));
    }

    /// Setting the flag ends the fit at the next objective call; the best
    /// point seen so far is kept.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn chi2(&self) -> f64 {
        self.chi2
    }

    pub fn number_of_iterations(&self) -> usize {
        self.iteration
    }

    pub fn fit_parameters(&self) -> &FitParameterSet {
        &self.parameters
    }

    pub fn fit_objects(&self) -> &FitObjects {
        &self.objects
    }

    pub fn real_data(&self, index: usize) -> Result<&IntensityData, FitError> {
        Ok(self.objects.get(index)?.real_data())
    }

    pub fn simulation_data(&self, index: usize) -> Result<IntensityData, FitError> {
        Ok(self.objects.get(index)?.simulation_data())
    }

    pub fn chi_squared_map(&self, index: usize) -> Result<IntensityData, FitError> {
        self.objects.chi_squared_map(index)
    }

    pub fn report_results(&self) -> String {
        format!(
            "minimizer: {}\niterations: {}\nchi2: {:.6e}\n{}",
            self.minimizer.name(),
            self.iteration,
            self.chi2,
            self.parameters.report()
        )
    }

    pub fn run_fit(&mut self) -> Result<FitResult, FitError> {
        let start = Instant::now();
        if self.objects.is_empty() {
            return Err(FitError::NoFitObjects);
        }
        for p in self.parameters.iter() {
            if self.objects.count_matches(&p.name) == 0 {
                return Err(ParameterError::NoMatch {
                    pattern: p.name.clone(),
                }
                .into());
            }
        }
        self.iteration = 0;

        let steps: Vec<(Option<usize>, FitStrategy)> = if self.strategies.is_empty() {
            vec![(None, FitStrategy::Default)]
        } else {
            self.strategies
                .iter()
                .cloned()
                .enumerate()
                .map(|(i, s)| (Some(i), s))
                .collect()
        };

        let mut converged = true;
        let mut interrupted = false;
        for (index, strategy) in steps {
            let restore = strategy.prepare(&mut self.parameters, &mut self.minimizer)?;
            tracing::debug!(strategy = ?index, minimizer = self.minimizer.name(), "fit step");
            let outcome = self.minimize(index, start)?;
            converged &= outcome.converged;
            if let Some(values) = restore {
                self.parameters.set_values(&values);
            }
            if outcome.interrupted {
                interrupted = true;
                break;
            }
        }

        apply_parameters(&mut self.objects, &self.parameters)?;
        self.objects
            .set_free_parameter_count(self.parameters.free_count());
        self.objects.run_simulations()?;
        self.chi2 = self.objects.chi_squared();

        let progress = FitProgress {
            iteration: self.iteration,
            chi2: self.chi2,
            is_last: true,
            elapsed: start.elapsed(),
            minimizer: self.minimizer.name(),
            strategy_index: None,
            parameters: &self.parameters,
            objects: &self.objects,
        };
        notify(&mut self.observers, &progress);
        self.interrupt.store(false, Ordering::Relaxed);

        tracing::info!(
            iterations = self.iteration,
            chi2 = self.chi2,
            converged,
            interrupted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fit done"
        );
        Ok(FitResult {
            chi2: self.chi2,
            iterations: self.iteration,
            parameters: self.parameters.iter().cloned().collect(),
            converged,
            interrupted,
            elapsed: start.elapsed(),
        })
    }

    fn minimize(&mut self, strategy_index: Option<usize>, start: Instant) -> Result<StepOutcome, FitError> {
        let free: Vec<FitParameter> = self.parameters.free_parameters().cloned().collect();
        let transforms: Vec<ParameterTransform> = free
            .iter()
            .map(|p| ParameterTransform::from_limits(&p.limits))
            .collect();
        let internal_start: Vec<f64> = free
            .iter()
            .zip(&transforms)
            .map(|(p, t)| t.to_internal(p.value))
            .collect();
        let internal_steps: Vec<f64> = free
            .iter()
            .zip(&transforms)
            .map(|(p, t)| t.internal_step(p.value, p.step))
            .collect();
        self.objects.set_free_parameter_count(free.len());

        let mut objective = SuiteObjective {
            objects: &mut self.objects,
            parameters: &mut self.parameters,
            observers: &mut self.observers,
            interrupt: &self.interrupt,
            iteration: &mut self.iteration,
            minimizer: self.minimizer.name(),
            strategy_index,
            start,
            best: None,
        };

        if free.is_empty() {
            return match objective.evaluate(&[]) {
                Ok(_) => Ok(StepOutcome {
                    converged: true,
                    interrupted: false,
                }),
                Err(FitError::Interrupted) => Ok(StepOutcome {
                    converged: false,
                    interrupted: true,
                }),
                Err(e) => Err(e),
            };
        }

        let result = {
            let mut bounded = BoundedObjective::new(&mut objective, transforms.clone());
            self.minimizer
                .minimize(&mut bounded, &internal_start, &internal_steps)
        };
        let best = objective.best.take();

        match result {
            Ok(result) => {
                let values: Vec<f64> = transforms
                    .iter()
                    .zip(&result.parameters)
                    .map(|(t, x)| t.to_external(*x))
                    .collect();
                self.parameters.set_free_values(&values);
                if let Some(covariance) = &result.covariance {
                    let errors: Vec<f64> = transforms
                        .iter()
                        .zip(&result.parameters)
                        .enumerate()
                        .map(|(i, (t, x))| covariance[(i, i)].max(0.0).sqrt() * t.derivative(*x).abs())
                        .collect();
                    self.parameters.set_free_errors(&errors);
                }
                Ok(StepOutcome {
                    converged: result.converged,
                    interrupted: false,
                })
            }
            Err(FitError::Interrupted) => {
                if let Some((values, chi2)) = best {
                    tracing::warn!(chi2, "fit interrupted, keeping best point");
                    self.parameters.set_free_values(&values);
                }
                Ok(StepOutcome {
                    converged: false,
                    interrupted: true,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::TestMinimizer;
    use crate::sample::standard::CylindersInBaBuilder;
    use crate::sample::SampleBuilder;
    use crate::units::{ANGSTROM, DEGREE};
    use std::sync::Mutex;

    fn simulation(radius: f64) -> GisasSimulation {
        let mut simulation = GisasSimulation::new();
        simulation
            .set_detector_parameters(6, -1.0 * DEGREE, 1.0 * DEGREE, 6, 0.0, 2.0 * DEGREE)
            .unwrap();
        simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
        let builder = CylindersInBaBuilder {
            radius,
            ..CylindersInBaBuilder::default()
        };
        simulation.set_sample(builder.build_sample().unwrap());
        simulation
    }

    fn real_data(radius: f64) -> IntensityData {
        let mut s = simulation(radius);
        s.run_simulation().unwrap();
        s.intensity_data()
    }

    struct Recorder(Arc<Mutex<Vec<(usize, bool)>>>);

    impl FitObserver for Recorder {
        fn update_every(&self) -> usize {
            3
        }

        fn update(&mut self, progress: &FitProgress<'_>) {
            self.0.lock().unwrap().push((progress.iteration, progress.is_last));
        }
    }

    #[test]
    fn test_unmatched_pattern_is_error() {
        let mut suite = FitSuite::new();
        suite
            .add_simulation_and_real_data(simulation(5.0), real_data(5.0), 1.0)
            .unwrap();
        suite
            .add_fit_parameter("*/FormFactorSphere/radius", 5.0, Limits::Unlimited, None)
            .unwrap();
        assert!(matches!(
            suite.run_fit(),
            Err(FitError::Parameter(ParameterError::NoMatch { .. }))
        ));
    }

    #[test]
    fn test_no_objects() {
        assert!(matches!(FitSuite::new().run_fit(), Err(FitError::NoFitObjects)));
    }

    #[test]
    fn test_test_minimizer_single_iteration() {
        let mut suite = FitSuite::new();
        suite.set_minimizer(Box::new(TestMinimizer));
        suite
            .add_simulation_and_real_data(simulation(5.0), real_data(5.0), 1.0)
            .unwrap();
        suite
            .add_fit_parameter("*/FormFactorCylinder/radius", 5.0, Limits::Limited(4.0, 6.0), None)
            .unwrap();
        let result = suite.run_fit().unwrap();
        assert_eq!(result.iterations, 1);
        assert!(result.chi2 < 1e-20);
    }

    #[test]
    fn test_recovers_radius() {
        let mut suite = FitSuite::new();
        suite.set_minimizer(Box::new(NelderMead::new().with_tolerance(1e-10)));
        suite
            .add_simulation_and_real_data(simulation(5.0), real_data(5.0), 1.0)
            .unwrap();
        suite
            .add_fit_parameter("*/FormFactorCylinder/radius", 5.6, Limits::Limited(4.0, 7.0), Some(0.1))
            .unwrap();
        let result = suite.run_fit().unwrap();
        let radius = result.value("*/FormFactorCylinder/radius").unwrap();
        assert!((radius - 5.0).abs() < 1e-2, "radius {radius}");
        assert!(suite.chi2() < 1e-3);
    }

    #[test]
    fn test_observer_cadence_and_interrupt() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut suite = FitSuite::new();
        suite
            .add_simulation_and_real_data(simulation(5.0), real_data(5.0), 1.0)
            .unwrap();
        suite
            .add_fit_parameter("*/FormFactorCylinder/radius", 6.0, Limits::Limited(4.0, 8.0), None)
            .unwrap();
        suite.attach_observer(Box::new(Recorder(Arc::clone(&calls))));

        struct Stopper(Arc<AtomicBool>);
        impl FitObserver for Stopper {
            fn update(&mut self, progress: &FitProgress<'_>) {
                if progress.iteration >= 7 {
                    self.0.store(true, Ordering::Relaxed);
                }
            }
        }
        suite.attach_observer(Box::new(Stopper(suite.interrupt_handle())));

        let result = suite.run_fit().unwrap();
        assert!(result.interrupted);
        assert_eq!(result.iterations, 7);
        let seen = calls.lock().unwrap().clone();
        assert_eq!(seen, vec![(1, false), (3, false), (6, false), (7, true)]);
    }

    #[test]
    fn test_strategies_run_in_order() {
        let mut suite = FitSuite::new();
        suite.set_minimizer(Box::new(TestMinimizer));
        suite
            .add_simulation_and_real_data(simulation(5.0), real_data(5.0), 1.0)
            .unwrap();
        suite
            .add_fit_parameter("*/FormFactorCylinder/radius", 5.5, Limits::Unlimited, None)
            .unwrap();
        suite
            .add_fit_parameter("*/FormFactorCylinder/height", 5.0, Limits::Unlimited, None)
            .unwrap();
        suite.add_fit_strategy(FitStrategy::fix_only(&["*/FormFactorCylinder/height"]));
        suite.add_fit_strategy(FitStrategy::AdjustMinimizer {
            name: "Test".into(),
            algorithm: String::new(),
        });
        let result = suite.run_fit().unwrap();
        assert_eq!(result.iterations, 2);
        assert!(suite.report_results().contains("FormFactorCylinder/height"));
        assert_eq!(suite.fit_parameters().free_count(), 1);
    }
}
