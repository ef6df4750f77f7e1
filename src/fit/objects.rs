//! Simulation/real-data pairs and the chi² reduction over them.

use crate::data::IntensityData;
use crate::param::count_matches;
use crate::simulation::GisasSimulation;

use super::{ChiSquaredModule, FitError};

/// One simulation fitted against one measured map.
#[derive(Clone, Debug)]
pub struct FitObject {
    simulation: GisasSimulation,
    real_data: IntensityData,
    weight: f64,
    simulated: Option<IntensityData>,
}

impl FitObject {
    pub fn new(simulation: GisasSimulation, real_data: IntensityData, weight: f64) -> Result<Self, FitError> {
        let expected = simulation.detector().shape();
        if real_data.shape() != expected {
            return Err(FitError::ShapeMismatch {
                expected,
                actual: real_data.shape(),
            });
        }
        Ok(Self {
            simulation,
            real_data,
            weight,
            simulated: None,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn simulation(&self) -> &GisasSimulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut GisasSimulation {
        &mut self.simulation
    }

    pub fn real_data(&self) -> &IntensityData {
        &self.real_data
    }

    /// Simulated map of the last run, normalized as compared. Zero before
    /// the first run.
    pub fn simulation_data(&self) -> IntensityData {
        self.simulated
            .clone()
            .unwrap_or_else(|| self.simulation.intensity_data())
    }

    /// Number of unmasked bins.
    pub fn fit_element_count(&self) -> usize {
        self.simulation.active_pixel_count()
    }

    fn run(&mut self, module: &ChiSquaredModule) -> Result<(), FitError> {
        self.simulation.run_simulation()?;
        let mut data = self.simulation.intensity_data();
        if let Some(normalizer) = &module.normalizer {
            normalizer.apply(&mut data);
        }
        self.simulated = Some(data);
        Ok(())
    }

    /// Squared difference of every unmasked bin, in global index order, with
    /// the signed difference alongside.
    fn squared_differences(&self, module: &ChiSquaredModule) -> Vec<(usize, f64, f64)> {
        let detector = self.simulation.detector();
        let ny = detector.y_axis.size;
        let simulated = self.simulation_data();
        let sim = simulated.array();
        let real = self.real_data.array();
        (0..detector.total_size())
            .filter(|&i| !detector.is_masked(i / ny, i % ny))
            .map(|i| {
                let idx = [i / ny, i % ny];
                let (s, r) = (sim[idx], real[idx]);
                (i, module.squared_function.calculate(s, r), s - r)
            })
            .collect()
    }
}

/// All fit objects of a suite plus the chi² configuration.
#[derive(Clone, Debug, Default)]
pub struct FitObjects {
    objects: Vec<FitObject>,
    module: ChiSquaredModule,
    free_parameters: usize,
}

impl FitObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: FitObject) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&FitObject, FitError> {
        self.objects.get(index).ok_or(FitError::ObjectIndex(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FitObject> {
        self.objects.iter()
    }

    pub fn chi_squared_module(&self) -> &ChiSquaredModule {
        &self.module
    }

    pub fn set_chi_squared_module(&mut self, module: ChiSquaredModule) {
        self.module = module;
    }

    pub fn set_free_parameter_count(&mut self, count: usize) {
        self.free_parameters = count;
    }

    fn total_weight(&self) -> f64 {
        self.objects.iter().map(|o| o.weight).sum()
    }

    /// Unmasked bins over every object.
    pub fn fit_element_count(&self) -> usize {
        self.objects.iter().map(FitObject::fit_element_count).sum()
    }

    fn degrees_of_freedom(&self) -> f64 {
        self.fit_element_count().saturating_sub(self.free_parameters).max(1) as f64
    }

    /// Set a pattern in every simulation that has it; errors when no
    /// simulation matches.
    pub fn set_parameter_value(&mut self, pattern: &str, value: f64) -> Result<usize, FitError> {
        let mut total = 0;
        for object in &mut self.objects {
            if count_matches(&mut object.simulation, pattern) > 0 {
                total += object.simulation.set_parameter_value(pattern, value)?;
            }
        }
        if total == 0 {
            return Err(FitError::UnknownParameter(pattern.to_string()));
        }
        Ok(total)
    }

    /// Number of matches of `pattern` over every simulation.
    pub fn count_matches(&mut self, pattern: &str) -> usize {
        self.objects
            .iter_mut()
            .map(|o| count_matches(&mut o.simulation, pattern))
            .sum()
    }

    pub fn run_simulations(&mut self) -> Result<(), FitError> {
        if self.objects.is_empty() {
            return Err(FitError::NoFitObjects);
        }
        let module = self.module;
        for object in &mut self.objects {
            object.run(&module)?;
        }
        Ok(())
    }

    /// `Σ_k (w_k/W)² Σ_bins sq / ndf`.
    pub fn chi_squared(&self) -> f64 {
        self.residuals().iter().map(|r| r * r).sum::<f64>() / self.degrees_of_freedom()
    }

    /// Signed `(w_k/W)·sqrt(sq)` per unmasked bin, objects concatenated.
    pub fn residuals(&self) -> Vec<f64> {
        let total_weight = self.total_weight();
        let mut out = Vec::with_capacity(self.fit_element_count());
        for object in &self.objects {
            let w = if total_weight > 0.0 {
                object.weight / total_weight
            } else {
                1.0
            };
            out.extend(
                object
                    .squared_differences(&self.module)
                    .into_iter()
                    .map(|(_, sq, diff)| w * sq.sqrt() * diff.signum()),
            );
        }
        out
    }

    /// Per-bin squared difference of one object; masked bins are zero.
    pub fn chi_squared_map(&self, index: usize) -> Result<IntensityData, FitError> {
        let object = self.get(index)?;
        let mut map = IntensityData::new(object.real_data.x_axis.clone(), object.real_data.y_axis.clone());
        for (i, sq, _) in object.squared_differences(&self.module) {
            map.set_bin_content(i, sq);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::MaskShape;
    use crate::sample::standard::CylindersInBaBuilder;
    use crate::sample::SampleBuilder;
    use crate::units::{ANGSTROM, DEGREE};

    fn simulation() -> GisasSimulation {
        let mut simulation = GisasSimulation::new();
        simulation
            .set_detector_parameters(4, -1.0 * DEGREE, 1.0 * DEGREE, 3, 0.0, 2.0 * DEGREE)
            .unwrap();
        simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
        simulation.set_sample(CylindersInBaBuilder::default().build_sample().unwrap());
        simulation
    }

    fn real_data(sim: &GisasSimulation) -> IntensityData {
        let mut s = sim.clone();
        s.run_simulation().unwrap();
        s.intensity_data()
    }

    #[test]
    fn test_shape_mismatch() {
        let sim = simulation();
        let mut other = simulation();
        other
            .set_detector_parameters(5, -1.0 * DEGREE, 1.0 * DEGREE, 3, 0.0, 2.0 * DEGREE)
            .unwrap();
        let real = real_data(&other);
        assert!(matches!(
            FitObject::new(sim, real, 1.0),
            Err(FitError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_perfect_match_is_zero() {
        let sim = simulation();
        let real = real_data(&sim);
        let mut objects = FitObjects::new();
        objects.add(FitObject::new(sim, real, 1.0).unwrap());
        objects.run_simulations().unwrap();
        assert_eq!(objects.chi_squared(), 0.0);
        assert_eq!(objects.residuals().len(), 12);
    }

    #[test]
    fn test_chi2_matches_residuals_and_map() {
        let sim = simulation();
        let mut real = real_data(&sim);
        real.scale(1.5);
        let mut objects = FitObjects::new();
        objects.add(FitObject::new(sim, real, 1.0).unwrap());
        objects.set_free_parameter_count(2);
        objects.run_simulations().unwrap();

        let map_sum = objects.chi_squared_map(0).unwrap().sum();
        assert!(map_sum > 0.0);
        assert!((objects.chi_squared() - map_sum / 10.0).abs() <= 1e-9 * map_sum);
        assert!(objects.residuals().iter().all(|r| *r <= 0.0));
        assert!(objects.chi_squared_map(3).is_err());
    }

    #[test]
    fn test_masked_bins_are_skipped() {
        let mut sim = simulation();
        sim.mask_all();
        sim.add_mask(MaskShape::HorizontalLine { y: 1.0 * DEGREE }, false);
        let real = real_data(&simulation());
        let mut objects = FitObjects::new();
        objects.add(FitObject::new(sim, real, 1.0).unwrap());
        objects.run_simulations().unwrap();
        assert_eq!(objects.fit_element_count(), 4);
        assert_eq!(objects.residuals().len(), 4);
    }

    #[test]
    fn test_parameter_patterns() {
        let sim = simulation();
        let real = real_data(&sim);
        let mut objects = FitObjects::new();
        objects.add(FitObject::new(sim, real, 1.0).unwrap());
        assert_eq!(objects.count_matches("*/FormFactorCylinder/radius"), 1);
        assert_eq!(objects.set_parameter_value("*/FormFactorCylinder/radius", 6.0).unwrap(), 1);
        assert!(matches!(
            objects.set_parameter_value("*/FormFactorBox/length", 6.0),
            Err(FitError::UnknownParameter(_))
        ));
    }
}
