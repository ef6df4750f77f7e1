//! Standard samples used by the example drivers and the functional tests.

use std::f64::consts::PI;

use crate::param::{child_path, Distribution1D};
use crate::units::NANOMETER;

use super::{
    Approximation, FTDistribution1D, FormFactor, HomogeneousMaterial, InterferenceFunction, Layer,
    MultiLayer, Particle, ParticleCoreShell, ParticleLayout, SampleBuilder, SampleError,
};

fn particle_material() -> HomogeneousMaterial {
    HomogeneousMaterial::new("Particle", 6e-4, 2e-8)
}

fn substrate_material() -> HomogeneousMaterial {
    HomogeneousMaterial::new("Substrate", 6e-6, 2e-8)
}

/// Air above a substrate, with the layout in the air layer.
fn on_substrate(layouts: Vec<ParticleLayout>) -> MultiLayer {
    let mut air = Layer::new(HomogeneousMaterial::air(), 0.0);
    for layout in layouts {
        air.add_layout(layout);
    }
    MultiLayer::new()
        .with_layer(air)
        .with_layer(Layer::new(substrate_material(), 0.0))
}

/// A single air layer.
fn in_air(layout: ParticleLayout) -> MultiLayer {
    MultiLayer::new().with_layer(Layer::new(HomogeneousMaterial::air(), 0.0).with_layout(layout))
}

fn cylinder(radius: f64, height: f64) -> Particle {
    Particle::new(particle_material(), FormFactor::Cylinder { radius, height })
}

fn visit_fields(
    path: &str,
    visitor: &mut dyn FnMut(&str, &mut f64),
    fields: Vec<(&str, &mut f64)>,
) {
    for (name, value) in fields {
        visitor(&child_path(path, name), value);
    }
}

/// Cylinders on a substrate without interference (DWBA).
#[derive(Clone, Debug)]
pub struct CylindersInDwbaBuilder {
    pub height: f64,
    pub radius: f64,
}

impl Default for CylindersInDwbaBuilder {
    fn default() -> Self {
        Self {
            height: 5.0 * NANOMETER,
            radius: 5.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for CylindersInDwbaBuilder {
    fn name(&self) -> &'static str {
        "CylindersInDWBA"
    }

    fn description(&self) -> &'static str {
        "Cylinders on a substrate without interference"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout.add_particle(cylinder(self.radius, self.height), 0.0, 1.0);
        Ok(on_substrate(vec![layout]))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![("height", &mut self.height), ("radius", &mut self.radius)],
        );
    }
}

/// Cylinders in vacuum (Born approximation).
#[derive(Clone, Debug)]
pub struct CylindersInBaBuilder {
    pub height: f64,
    pub radius: f64,
}

impl Default for CylindersInBaBuilder {
    fn default() -> Self {
        Self {
            height: 5.0 * NANOMETER,
            radius: 5.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for CylindersInBaBuilder {
    fn name(&self) -> &'static str {
        "CylindersInBA"
    }

    fn description(&self) -> &'static str {
        "Cylinders in vacuum, Born approximation"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout.add_particle(cylinder(self.radius, self.height), 0.0, 1.0);
        Ok(in_air(layout))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![("height", &mut self.height), ("radius", &mut self.radius)],
        );
    }
}

/// Cylinders on a substrate ordered as a 1D paracrystal.
#[derive(Clone, Debug)]
pub struct RadialParaCrystalBuilder {
    pub corr_peak_distance: f64,
    pub corr_width: f64,
    pub corr_length: f64,
    pub cylinder_height: f64,
    pub cylinder_radius: f64,
}

impl Default for RadialParaCrystalBuilder {
    fn default() -> Self {
        Self {
            corr_peak_distance: 20.0 * NANOMETER,
            corr_width: 7.0 * NANOMETER,
            corr_length: 1e3 * NANOMETER,
            cylinder_height: 5.0 * NANOMETER,
            cylinder_radius: 5.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for RadialParaCrystalBuilder {
    fn name(&self) -> &'static str {
        "RadialParaCrystal"
    }

    fn description(&self) -> &'static str {
        "Cylinders with 1D paracrystal interference"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout
            .add_particle(cylinder(self.cylinder_radius, self.cylinder_height), 0.0, 1.0)
            .set_interference_function(InterferenceFunction::RadialParaCrystal {
                peak_distance: self.corr_peak_distance,
                damping_length: self.corr_length,
                domain_size: 0.0,
                pdf: FTDistribution1D::Gauss {
                    omega: self.corr_width,
                },
            });
        Ok(on_substrate(vec![layout]))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("corr_peak_distance", &mut self.corr_peak_distance),
                ("corr_width", &mut self.corr_width),
                ("corr_length", &mut self.corr_length),
                ("cylinder_height", &mut self.cylinder_height),
                ("cylinder_radius", &mut self.cylinder_radius),
            ],
        );
    }
}

/// Two cylinder sizes sharing one paracrystal, decoupling approximation.
#[derive(Clone, Debug)]
pub struct TwoTypesCylindersBuilder {
    pub radius1: f64,
    pub radius2: f64,
    pub peak_distance: f64,
    pub width: f64,
}

impl Default for TwoTypesCylindersBuilder {
    fn default() -> Self {
        Self {
            radius1: 5.0 * NANOMETER,
            radius2: 8.0 * NANOMETER,
            peak_distance: 20.0 * NANOMETER,
            width: 3.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for TwoTypesCylindersBuilder {
    fn name(&self) -> &'static str {
        "TwoTypesCylindersDA"
    }

    fn description(&self) -> &'static str {
        "Cylinders of two sizes in the decoupling approximation"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout
            .add_particle(cylinder(self.radius1, self.radius1), 0.0, 0.5)
            .add_particle(cylinder(self.radius2, self.radius2), 0.0, 0.5)
            .set_interference_function(InterferenceFunction::RadialParaCrystal {
                peak_distance: self.peak_distance,
                damping_length: 1e3 * NANOMETER,
                domain_size: 0.0,
                pdf: FTDistribution1D::Gauss { omega: self.width },
            });
        Ok(on_substrate(vec![layout]))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("radius1", &mut self.radius1),
                ("radius2", &mut self.radius2),
                ("peak_distance", &mut self.peak_distance),
                ("width", &mut self.width),
            ],
        );
    }
}

/// Two cylinder sizes, each in its own layout (local monodisperse
/// approximation).
#[derive(Clone, Debug)]
pub struct CylindersLmaBuilder {
    pub radius1: f64,
    pub radius2: f64,
    pub distance1: f64,
    pub distance2: f64,
    pub abundance1: f64,
}

impl Default for CylindersLmaBuilder {
    fn default() -> Self {
        Self {
            radius1: 5.0 * NANOMETER,
            radius2: 8.0 * NANOMETER,
            distance1: 16.8 * NANOMETER,
            distance2: 22.8 * NANOMETER,
            abundance1: 0.8,
        }
    }
}

impl SampleBuilder for CylindersLmaBuilder {
    fn name(&self) -> &'static str {
        "CylindersLMA"
    }

    fn description(&self) -> &'static str {
        "Cylinders of two sizes in the local monodisperse approximation"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let pdf = FTDistribution1D::Gauss {
            omega: 3.0 * NANOMETER,
        };
        let layouts = [
            (self.radius1, self.distance1, self.abundance1),
            (self.radius2, self.distance2, 1.0 - self.abundance1),
        ]
        .into_iter()
        .map(|(radius, distance, abundance)| {
            let mut layout = ParticleLayout::new();
            layout
                .add_particle(cylinder(radius, radius), 0.0, abundance)
                .set_interference_function(InterferenceFunction::RadialParaCrystal {
                    peak_distance: distance,
                    damping_length: 1e3 * NANOMETER,
                    domain_size: 0.0,
                    pdf: pdf.clone(),
                });
            layout
        })
        .collect();
        Ok(on_substrate(layouts))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("radius1", &mut self.radius1),
                ("radius2", &mut self.radius2),
                ("distance1", &mut self.distance1),
                ("distance2", &mut self.distance2),
                ("abundance1", &mut self.abundance1),
            ],
        );
    }
}

/// Cylinders with a Gaussian size distribution in the size-spacing
/// correlation approximation.
#[derive(Clone, Debug)]
pub struct CylindersSscaBuilder {
    pub mean_radius: f64,
    pub sigma_radius: f64,
    pub peak_distance: f64,
    pub kappa: f64,
    pub samples: usize,
}

impl Default for CylindersSscaBuilder {
    fn default() -> Self {
        Self {
            mean_radius: 5.0 * NANOMETER,
            sigma_radius: 1.25 * NANOMETER,
            peak_distance: 15.0 * NANOMETER,
            kappa: 4.02698,
            samples: 10,
        }
    }
}

impl SampleBuilder for CylindersSscaBuilder {
    fn name(&self) -> &'static str {
        "CylindersSSCA"
    }

    fn description(&self) -> &'static str {
        "Size-distributed cylinders, size-spacing correlation approximation"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let distribution = Distribution1D::Gaussian {
            mean: self.mean_radius,
            std_dev: self.sigma_radius,
        };
        let mut layout = ParticleLayout::new();
        for (radius, weight) in distribution.sample_points(self.samples, 3.0) {
            if radius > 0.0 {
                layout.add_particle(cylinder(radius, radius), 0.0, weight);
            }
        }
        layout
            .set_interference_function(InterferenceFunction::RadialParaCrystal {
                peak_distance: self.peak_distance,
                damping_length: 1e3 * NANOMETER,
                domain_size: 0.0,
                pdf: FTDistribution1D::Gauss {
                    omega: 5.0 * NANOMETER,
                },
            })
            .set_approximation(Approximation::Ssca { kappa: self.kappa });
        Ok(in_air(layout))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("mean_radius", &mut self.mean_radius),
                ("sigma_radius", &mut self.sigma_radius),
                ("peak_distance", &mut self.peak_distance),
                ("kappa", &mut self.kappa),
            ],
        );
    }
}

/// Spheres buried in an intermediate layer on a substrate.
#[derive(Clone, Debug)]
pub struct BuriedSpheresBuilder {
    pub radius: f64,
    pub depth: f64,
    pub layer_thickness: f64,
}

impl Default for BuriedSpheresBuilder {
    fn default() -> Self {
        Self {
            radius: 10.2 * NANOMETER,
            depth: 25.2 * NANOMETER,
            layer_thickness: 30.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for BuriedSpheresBuilder {
    fn name(&self) -> &'static str {
        "BuriedSpheres"
    }

    fn description(&self) -> &'static str {
        "Spheres embedded in the middle layer of a three-layer stack"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout.add_particle(
            Particle::new(
                HomogeneousMaterial::new("Particle", 0.0, 0.0),
                FormFactor::FullSphere {
                    radius: self.radius,
                },
            ),
            self.depth,
            1.0,
        );
        let intermediate = Layer::new(
            HomogeneousMaterial::new("IntermLayer", 3.45e-6, 5.24e-9),
            self.layer_thickness,
        )
        .with_layout(layout);
        Ok(MultiLayer::new()
            .with_layer(Layer::new(HomogeneousMaterial::air(), 0.0))
            .with_layer(intermediate)
            .with_layer(Layer::new(
                HomogeneousMaterial::new("Substrate", 7.43e-6, 1.72e-7),
                0.0,
            )))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("radius", &mut self.radius),
                ("depth", &mut self.depth),
                ("layer_thickness", &mut self.layer_thickness),
            ],
        );
    }
}

/// Core-shell boxes in vacuum.
#[derive(Clone, Debug)]
pub struct CoreShellBoxesBuilder {
    pub shell_length: f64,
    pub shell_height: f64,
    pub core_length: f64,
    pub core_height: f64,
}

impl Default for CoreShellBoxesBuilder {
    fn default() -> Self {
        Self {
            shell_length: 16.0 * NANOMETER,
            shell_height: 8.0 * NANOMETER,
            core_length: 12.0 * NANOMETER,
            core_height: 7.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for CoreShellBoxesBuilder {
    fn name(&self) -> &'static str {
        "CoreShellBoxes"
    }

    fn description(&self) -> &'static str {
        "Core-shell parallelepipeds in vacuum"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let shell = Particle::new(
            HomogeneousMaterial::new("Shell", 1e-4, 2e-8),
            FormFactor::Box {
                length: self.shell_length,
                width: self.shell_length,
                height: self.shell_height,
            },
        );
        let core = Particle::new(
            HomogeneousMaterial::new("Core", 6e-5, 2e-8),
            FormFactor::Box {
                length: self.core_length,
                width: self.core_length,
                height: self.core_height,
            },
        );
        let mut layout = ParticleLayout::new();
        layout.add_particle(ParticleCoreShell::new(shell, core, [0.0; 3]), 0.0, 1.0);
        Ok(in_air(layout))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("shell_length", &mut self.shell_length),
                ("shell_height", &mut self.shell_height),
                ("core_length", &mut self.core_length),
                ("core_height", &mut self.core_height),
            ],
        );
    }
}

/// Cylinders on a square 2D lattice.
#[derive(Clone, Debug)]
pub struct SquareLattice2DBuilder {
    pub lattice_length: f64,
    pub decay_length: f64,
    pub radius: f64,
    pub height: f64,
}

impl Default for SquareLattice2DBuilder {
    fn default() -> Self {
        Self {
            lattice_length: 10.0 * NANOMETER,
            decay_length: 300.0 * NANOMETER / (2.0 * PI),
            radius: 5.0 * NANOMETER,
            height: 5.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for SquareLattice2DBuilder {
    fn name(&self) -> &'static str {
        "SquareLattice2D"
    }

    fn description(&self) -> &'static str {
        "Cylinders on a square lattice"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout
            .add_particle(cylinder(self.radius, self.height), 0.0, 1.0)
            .set_interference_function(InterferenceFunction::Lattice2D {
                length_1: self.lattice_length,
                length_2: self.lattice_length,
                angle: PI / 2.0,
                xi: 0.0,
                decay_length: self.decay_length,
            });
        Ok(on_substrate(vec![layout]))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(
            path,
            visitor,
            vec![
                ("lattice_length", &mut self.lattice_length),
                ("decay_length", &mut self.decay_length),
                ("radius", &mut self.radius),
                ("height", &mut self.height),
            ],
        );
    }
}

/// Spheres in vacuum (Born approximation).
#[derive(Clone, Debug)]
pub struct SpheresInBaBuilder {
    pub radius: f64,
}

impl Default for SpheresInBaBuilder {
    fn default() -> Self {
        Self {
            radius: 5.0 * NANOMETER,
        }
    }
}

impl SampleBuilder for SpheresInBaBuilder {
    fn name(&self) -> &'static str {
        "SpheresInBA"
    }

    fn description(&self) -> &'static str {
        "Full spheres in vacuum, Born approximation"
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError> {
        let mut layout = ParticleLayout::new();
        layout.add_particle(
            Particle::new(
                particle_material(),
                FormFactor::FullSphere {
                    radius: self.radius,
                },
            ),
            0.0,
            1.0,
        );
        Ok(in_air(layout))
    }

    fn clone_box(&self) -> Box<dyn SampleBuilder> {
        Box::new(self.clone())
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        visit_fields(path, visitor, vec![("radius", &mut self.radius)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::ParticleSpecies;

    #[test]
    fn test_buried_spheres_layers() {
        let sample = BuriedSpheresBuilder::default().build_sample().unwrap();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.layer_thickness(1), 30.0);
        assert_eq!(sample.layer_thickness(2), 0.0);
        assert_eq!(sample.layers[1].layouts[0].particles[0].depth, 25.2);
    }

    #[test]
    fn test_ssca_species_follow_distribution() {
        let builder = CylindersSscaBuilder::default();
        let sample = builder.build_sample().unwrap();
        let layout = &sample.layers[0].layouts[0];
        assert_eq!(layout.particles.len(), builder.samples);
        let total: f64 = layout.particles.iter().map(|p| p.abundance).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(matches!(layout.approximation, Approximation::Ssca { .. }));
    }

    #[test]
    fn test_core_shell_is_core_shell() {
        let sample = CoreShellBoxesBuilder::default().build_sample().unwrap();
        assert!(matches!(
            sample.layers[0].layouts[0].particles[0].particle,
            ParticleSpecies::CoreShell(_)
        ));
    }

    #[test]
    fn test_lma_has_two_layouts() {
        let sample = CylindersLmaBuilder::default().build_sample().unwrap();
        assert_eq!(sample.layers[0].layouts.len(), 2);
        assert!(sample.validate().is_ok());
    }
}
