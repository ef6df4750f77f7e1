//! Grazing-incidence small-angle scattering simulation.

use std::time::Instant;

use crate::compute::{run_elements, SimulationElement};
use crate::data::IntensityData;
use crate::instrument::{
    Beam, Detector, Instrument, MaskShape, ResolutionFunction2D,
};
use crate::param::{child_path, set_parameter_value, ParameterDistribution, Parameterized};
use crate::sample::{MultiLayer, SampleBuilder};

use super::{SimulationError, SimulationOptions};

/// A detector, a beam and a sample (or a builder producing one).
///
/// ```no_run
/// use gisasrs::sample::{MultiLayer, SampleBuilder, standard::CylindersInDwbaBuilder};
/// use gisasrs::simulation::GisasSimulation;
/// use gisasrs::units::{ANGSTROM, DEGREE};
///
/// let mut simulation = GisasSimulation::new();
/// simulation.set_detector_parameters(25, -2.0 * DEGREE, 2.0 * DEGREE, 25, 0.0, 2.0 * DEGREE)?;
/// simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
/// simulation.set_sample(CylindersInDwbaBuilder::default().build_sample()?);
/// simulation.run_simulation()?;
/// let map = simulation.intensity_data();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct GisasSimulation {
    instrument: Instrument,
    sample: Option<MultiLayer>,
    sample_builder: Option<Box<dyn SampleBuilder>>,
    distributions: Vec<ParameterDistribution>,
    options: SimulationOptions,
    intensity: Option<IntensityData>,
}

impl Default for GisasSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl GisasSimulation {
    pub fn new() -> Self {
        Self {
            instrument: Instrument {
                beam: Beam::default(),
                detector: Detector::default(),
                resolution: None,
            },
            sample: None,
            sample_builder: None,
            distributions: Vec::new(),
            options: SimulationOptions::default(),
            intensity: None,
        }
    }

    pub fn with_instrument(instrument: Instrument) -> Self {
        let mut simulation = Self::new();
        simulation.instrument = instrument;
        simulation.instrument.detector.update_mask();
        simulation
    }

    /// Replace the detector axes. Mask shapes are kept and re-evaluated.
    pub fn set_detector_parameters(
        &mut self,
        n_phi: usize,
        phi_min: f64,
        phi_max: f64,
        n_alpha: usize,
        alpha_min: f64,
        alpha_max: f64,
    ) -> Result<(), SimulationError> {
        let mut detector = Detector::new(n_phi, phi_min, phi_max, n_alpha, alpha_min, alpha_max)?;
        detector.mask = std::mem::take(&mut self.instrument.detector.mask);
        detector.update_mask();
        self.instrument.detector = detector;
        self.intensity = None;
        Ok(())
    }

    /// Switch to a rectangular plate detector perpendicular to the sample.
    /// Mask shapes are kept and re-evaluated in plate coordinates.
    #[allow(clippy::too_many_arguments)]
    pub fn set_rectangular_detector(
        &mut self,
        nx: usize,
        width: f64,
        ny: usize,
        height: f64,
        distance: f64,
        u0: f64,
        v0: f64,
    ) -> Result<(), SimulationError> {
        let mut detector = Detector::rectangular(nx, width, ny, height, distance, u0, v0)?;
        detector.mask = std::mem::take(&mut self.instrument.detector.mask);
        detector.update_mask();
        self.instrument.detector = detector;
        self.intensity = None;
        Ok(())
    }

    /// Wavelength and incidence angles; the beam intensity is kept.
    pub fn set_beam_parameters(&mut self, wavelength: f64, alpha_i: f64, phi_i: f64) {
        let intensity = self.instrument.beam.intensity;
        self.instrument.beam = Beam {
            intensity,
            ..Beam::new(wavelength, alpha_i, phi_i)
        };
    }

    pub fn set_beam_intensity(&mut self, intensity: f64) {
        self.instrument.beam.intensity = intensity;
    }

    pub fn set_sample(&mut self, sample: MultiLayer) {
        self.sample = Some(sample);
        self.sample_builder = None;
    }

    /// The sample is rebuilt from `builder` on every run.
    pub fn set_sample_builder(&mut self, builder: Box<dyn SampleBuilder>) {
        self.sample_builder = Some(builder);
        self.sample = None;
    }

    pub fn add_mask(&mut self, shape: MaskShape, mask_value: bool) {
        self.instrument.detector.add_mask(shape, mask_value);
    }

    pub fn mask_all(&mut self) {
        self.instrument.detector.mask_all();
    }

    pub fn remove_masks(&mut self) {
        self.instrument.detector.remove_masks();
    }

    pub fn set_detector_resolution_function(&mut self, resolution: ResolutionFunction2D) {
        self.instrument.resolution = Some(resolution);
    }

    pub fn remove_detector_resolution_function(&mut self) {
        self.instrument.resolution = None;
    }

    pub fn add_parameter_distribution(&mut self, distribution: ParameterDistribution) {
        self.distributions.push(distribution);
    }

    pub fn set_options(&mut self, options: SimulationOptions) {
        self.options = options;
    }

    pub fn options(&self) -> SimulationOptions {
        self.options
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn detector(&self) -> &Detector {
        &self.instrument.detector
    }

    pub fn beam(&self) -> &Beam {
        &self.instrument.beam
    }

    pub fn sample(&self) -> Option<&MultiLayer> {
        self.sample.as_ref()
    }

    pub fn sample_builder(&self) -> Option<&dyn SampleBuilder> {
        self.sample_builder.as_deref()
    }

    pub fn parameter_distributions(&self) -> &[ParameterDistribution] {
        &self.distributions
    }

    /// Sample for the next run: built fresh when a builder is set.
    pub fn build_sample(&self) -> Result<MultiLayer, SimulationError> {
        match (&self.sample_builder, &self.sample) {
            (Some(builder), _) => Ok(builder.build_sample()?),
            (None, Some(sample)) => Ok(sample.clone()),
            (None, None) => Err(SimulationError::NoSample),
        }
    }

    /// Set every parameter matching `pattern`; returns the match count.
    pub fn set_parameter_value(&mut self, pattern: &str, value: f64) -> Result<usize, SimulationError> {
        Ok(set_parameter_value(self, pattern, value)?)
    }

    /// Number of unmasked pixels.
    pub fn active_pixel_count(&self) -> usize {
        let detector = &self.instrument.detector;
        detector.total_size() - detector.masked_count()
    }

    fn elements(&self, indices: &[usize]) -> Vec<SimulationElement> {
        let beam = &self.instrument.beam;
        let detector = &self.instrument.detector;
        let ny = detector.y_axis.size;
        indices
            .iter()
            .map(|&index| {
                let (ix, iy) = (index / ny, index % ny);
                let (alpha_f, phi_f) = detector.pixel_direction(ix, iy);
                SimulationElement {
                    wavelength: beam.wavelength,
                    alpha_i: beam.alpha_i,
                    phi_i: beam.phi_i,
                    alpha_f,
                    phi_f,
                    solid_angle: detector.pixel_solid_angle(ix, iy),
                    index,
                    intensity: 0.0,
                }
            })
            .collect()
    }

    /// Run over the unmasked pixels of the current batch.
    pub fn run_simulation(&mut self) -> Result<(), SimulationError> {
        let start = Instant::now();
        self.instrument.validate()?;
        if !self.instrument.detector.mask.is_initialized() {
            self.instrument.detector.update_mask();
        }
        let active = self.instrument.detector.active_indices();
        let (begin, end) = self.options.batch_range(active.len())?;
        let indices = &active[begin..end];

        let mut elements = if self.distributions.is_empty() {
            let sample = self.build_sample()?;
            let mut elements = self.elements(indices);
            run_elements(&sample, &mut elements, self.options.threads)?;
            elements
        } else {
            self.run_distributed(indices)?
        };

        self.normalize(&mut elements);

        let detector = &self.instrument.detector;
        let mut map = IntensityData::new(detector.x_axis.clone(), detector.y_axis.clone());
        for element in &elements {
            map.set_bin_content(element.index, element.intensity);
        }
        self.intensity = Some(map);

        tracing::debug!(
            elements = elements.len(),
            batch = self.options.current_batch,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "simulation finished"
        );
        Ok(())
    }

    /// Weighted average over every combination of distribution sample points.
    fn run_distributed(&self, indices: &[usize]) -> Result<Vec<SimulationElement>, SimulationError> {
        let mut combinations: Vec<(Vec<f64>, f64)> = vec![(Vec::new(), 1.0)];
        for distribution in &self.distributions {
            let points = distribution.sample_points();
            combinations = combinations
                .iter()
                .flat_map(|(values, weight)| {
                    points.iter().map(move |&(value, w)| {
                        let mut values = values.clone();
                        values.push(value);
                        (values, weight * w)
                    })
                })
                .collect();
        }
        tracing::debug!(combinations = combinations.len(), "running parameter distributions");

        let mut result = self.elements(indices);
        for (values, weight) in combinations {
            let mut variant = self.clone();
            variant.distributions.clear();
            variant.intensity = None;
            for (distribution, value) in self.distributions.iter().zip(&values) {
                variant.set_parameter_value(&distribution.pattern, *value)?;
            }
            let sample = variant.build_sample()?;
            let mut elements = variant.elements(indices);
            run_elements(&sample, &mut elements, self.options.threads)?;
            for (total, element) in result.iter_mut().zip(&elements) {
                total.intensity += weight * element.intensity;
            }
        }
        Ok(result)
    }

    /// Scale by beam intensity and solid angle; a zero beam intensity leaves
    /// the raw cross-section.
    fn normalize(&self, elements: &mut [SimulationElement]) {
        let beam = &self.instrument.beam;
        if beam.intensity == 0.0 {
            return;
        }
        let mut sin_alpha = beam.alpha_i.sin().abs();
        if sin_alpha == 0.0 {
            sin_alpha = 1.0;
        }
        for element in elements {
            element.intensity *= beam.intensity * element.solid_angle / sin_alpha;
        }
    }

    /// Result of the last run with the detector resolution applied. Zero
    /// before the first run. Masked pixels stay zero after smearing.
    pub fn intensity_data(&self) -> IntensityData {
        let mut data = self.raw_intensity_data();
        if let Some(resolution) = &self.instrument.resolution {
            let (x_axis, y_axis) = (data.x_axis.clone(), data.y_axis.clone());
            resolution.apply(&x_axis, &y_axis, data.array_mut());
            let detector = &self.instrument.detector;
            for ((ix, iy), value) in data.array_mut().indexed_iter_mut() {
                if detector.is_masked(ix, iy) {
                    *value = 0.0;
                }
            }
        }
        data
    }

    /// Result of the last run without resolution.
    pub fn raw_intensity_data(&self) -> IntensityData {
        match &self.intensity {
            Some(data) => data.clone(),
            None => {
                let detector = &self.instrument.detector;
                IntensityData::new(detector.x_axis.clone(), detector.y_axis.clone())
            }
        }
    }
}

impl Parameterized for GisasSimulation {
    fn node_name(&self) -> String {
        "GISASSimulation".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        let instrument_path = child_path(path, &self.instrument.node_name());
        self.instrument.visit_parameters(&instrument_path, visitor);
        if let Some(builder) = &mut self.sample_builder {
            let builder_path = child_path(path, builder.name());
            builder.visit_parameters(&builder_path, visitor);
        } else if let Some(sample) = &mut self.sample {
            let sample_path = child_path(path, &sample.node_name());
            sample.visit_parameters(&sample_path, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{parameter_names, Distribution1D};
    use crate::sample::standard::{CylindersInBaBuilder, CylindersInDwbaBuilder};
    use crate::units::{ANGSTROM, DEGREE};
    use approx::assert_relative_eq;

    fn small_simulation() -> GisasSimulation {
        let mut simulation = GisasSimulation::new();
        simulation
            .set_detector_parameters(6, -1.0 * DEGREE, 1.0 * DEGREE, 5, 0.0, 2.0 * DEGREE)
            .unwrap();
        simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
        simulation.set_sample_builder(Box::new(CylindersInDwbaBuilder::default()));
        simulation
    }

    #[test]
    fn test_unset_detector_fails() {
        let mut simulation = GisasSimulation::new();
        simulation.set_sample_builder(Box::new(CylindersInBaBuilder::default()));
        assert!(matches!(
            simulation.run_simulation(),
            Err(SimulationError::Instrument(_))
        ));
    }

    #[test]
    fn test_missing_sample() {
        let mut simulation = small_simulation();
        simulation.sample_builder = None;
        assert!(matches!(simulation.run_simulation(), Err(SimulationError::NoSample)));
    }

    #[test]
    fn test_run_fills_every_pixel() {
        let mut simulation = small_simulation();
        simulation.run_simulation().unwrap();
        let data = simulation.intensity_data();
        assert_eq!(data.shape(), (6, 5));
        assert!(data.array().iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_masked_pixels_are_zero() {
        let mut simulation = small_simulation();
        simulation.mask_all();
        simulation.add_mask(MaskShape::VerticalLine { x: 0.1 * DEGREE }, false);
        simulation.run_simulation().unwrap();
        let data = simulation.intensity_data();
        assert_eq!(simulation.active_pixel_count(), 5);
        let nonzero = data.array().iter().filter(|v| **v > 0.0).count();
        assert_eq!(nonzero, 5);
    }

    #[test]
    fn test_batches_sum_to_full_run() {
        let mut full = small_simulation();
        full.run_simulation().unwrap();

        let mut sum = IntensityData::new(full.detector().x_axis.clone(), full.detector().y_axis.clone());
        for batch in 0..4 {
            let mut part = small_simulation();
            part.set_options(SimulationOptions::with_batch(4, batch));
            part.run_simulation().unwrap();
            sum.add_assign(&part.intensity_data()).unwrap();
        }
        for (a, b) in sum.array().iter().zip(full.intensity_data().array()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_beam_intensity_normalization() {
        let mut raw = small_simulation();
        raw.run_simulation().unwrap();
        let mut scaled = small_simulation();
        scaled.set_beam_intensity(1e8);
        scaled.run_simulation().unwrap();

        let detector = raw.detector().clone();
        let factor = 1e8 * detector.pixel_solid_angle(2, 3) / (0.2 * DEGREE).sin();
        let index = 2 * 5 + 3;
        assert_relative_eq!(
            scaled.intensity_data().bin_content(index).unwrap(),
            raw.intensity_data().bin_content(index).unwrap() * factor,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_parameter_tree_and_builder_parameters() {
        let mut simulation = small_simulation();
        let names = parameter_names(&mut simulation);
        assert!(names.contains(&"/GISASSimulation/Instrument/Beam/wavelength".to_string()));
        assert!(names.contains(&"/GISASSimulation/CylindersInDWBA/radius".to_string()));

        assert_eq!(simulation.set_parameter_value("*/radius", 7.0).unwrap(), 1);
        let params = simulation.sample_builder().unwrap().parameters();
        assert!(params.contains(&("radius".to_string(), 7.0)));
        assert!(simulation.set_parameter_value("*/nothing", 1.0).is_err());
    }

    #[test]
    fn test_sample_parameter_paths() {
        let mut simulation = small_simulation();
        let sample = simulation.build_sample().unwrap();
        simulation.set_sample(sample);
        let names = parameter_names(&mut simulation);
        assert!(names
            .iter()
            .any(|n| n.starts_with("/GISASSimulation/MultiLayer/") && n.ends_with("/FormFactorCylinder/radius")));
    }

    #[test]
    fn test_single_point_distribution_matches_plain_run() {
        let mut plain = small_simulation();
        plain.run_simulation().unwrap();

        let mut distributed = small_simulation();
        distributed.add_parameter_distribution(
            ParameterDistribution::new(
                "*/radius",
                Distribution1D::Gaussian {
                    mean: 5.0,
                    std_dev: 1.0,
                },
                1,
                2.0,
            )
            .unwrap(),
        );
        distributed.run_simulation().unwrap();
        for (a, b) in distributed.intensity_data().array().iter().zip(plain.intensity_data().array()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_resolution_preserves_total() {
        let mut simulation = small_simulation();
        simulation.run_simulation().unwrap();
        let raw_sum = simulation.raw_intensity_data().sum();
        simulation.set_detector_resolution_function(ResolutionFunction2D::Gaussian {
            sigma_x: 0.01 * DEGREE,
            sigma_y: 0.01 * DEGREE,
        });
        let smeared = simulation.intensity_data();
        assert_relative_eq!(smeared.sum(), raw_sum, max_relative = 1e-3);
    }

    #[test]
    fn test_rectangular_detector_matches_spherical_near_normal() {
        // a far plate with tiny pixels sees the same directions as a
        // spherical detector with matching angular bins
        let distance = 1.0e6;
        let mut plate = small_simulation();
        plate
            .set_rectangular_detector(
                6,
                2.0 * DEGREE * distance,
                5,
                2.0 * DEGREE * distance,
                distance,
                DEGREE * distance,
                0.0,
            )
            .unwrap();
        plate.run_simulation().unwrap();
        let mut sphere = small_simulation();
        sphere.run_simulation().unwrap();

        let (a, b) = (plate.intensity_data(), sphere.intensity_data());
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.x_axis.name, "u");
        for (x, y) in a.array().iter().zip(b.array()) {
            assert_relative_eq!(*x, *y, max_relative = 1e-2);
        }
    }

    #[test]
    fn test_resolution_keeps_masked_pixels_dark() {
        let mut simulation = small_simulation();
        simulation.add_mask(
            MaskShape::Rectangle {
                xlow: -1.0 * DEGREE,
                ylow: 0.0,
                xup: 0.0,
                yup: 1.0 * DEGREE,
            },
            true,
        );
        simulation.set_detector_resolution_function(ResolutionFunction2D::Gaussian {
            sigma_x: 0.3 * DEGREE,
            sigma_y: 0.3 * DEGREE,
        });
        simulation.run_simulation().unwrap();
        let data = simulation.intensity_data();
        let detector = simulation.detector();
        let masked = detector.masked_count();
        assert!(masked > 0);
        let mut dark = 0;
        for ((ix, iy), value) in data.array().indexed_iter() {
            if detector.is_masked(ix, iy) {
                assert_eq!(*value, 0.0);
                dark += 1;
            } else {
                assert!(*value > 0.0);
            }
        }
        assert_eq!(dark, masked);
    }
}
