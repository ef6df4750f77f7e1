//! Cylinders of two different sizes in the local monodisperse approximation.

use std::path::Path;

use anyhow::Result;

use gisasrs::data::write_intensity_data;
use gisasrs::logging::init_tracing;
use gisasrs::plot::save_intensity_map;
use gisasrs::sample::{
    FTDistribution1D, FormFactor, HomogeneousMaterial, InterferenceFunction, Layer, MultiLayer, Particle,
    ParticleLayout,
};
use gisasrs::units::{ANGSTROM, DEGREE, NANOMETER};
use gisasrs::GisasSimulation;

fn paracrystal(peak_distance: f64) -> InterferenceFunction {
    InterferenceFunction::RadialParaCrystal {
        peak_distance,
        damping_length: 1e3 * NANOMETER,
        domain_size: 0.0,
        pdf: FTDistribution1D::Gauss { omega: 3.0 * NANOMETER },
    }
}

fn get_sample() -> MultiLayer {
    let m_substrate = HomogeneousMaterial::new("Substrate", 6e-6, 2e-8);
    let m_particle = HomogeneousMaterial::new("Particle", 6e-4, 2e-8);

    let radius1 = 5.0 * NANOMETER;
    let cylinder1 = Particle::new(m_particle.clone(), FormFactor::Cylinder { radius: radius1, height: radius1 });
    let radius2 = 8.0 * NANOMETER;
    let cylinder2 = Particle::new(m_particle, FormFactor::Cylinder { radius: radius2, height: radius2 });

    let mut layout1 = ParticleLayout::new();
    layout1
        .add_particle(cylinder1, 0.0, 0.8)
        .set_interference_function(paracrystal(16.8 * NANOMETER));
    let mut layout2 = ParticleLayout::new();
    layout2
        .add_particle(cylinder2, 0.0, 0.2)
        .set_interference_function(paracrystal(22.8 * NANOMETER));

    MultiLayer::new()
        .with_layer(
            Layer::new(HomogeneousMaterial::air(), 0.0)
                .with_layout(layout1)
                .with_layout(layout2),
        )
        .with_layer(Layer::new(m_substrate, 0.0))
}

fn main() -> Result<()> {
    init_tracing();
    let mut simulation = GisasSimulation::new();
    simulation.set_detector_parameters(200, 0.0, 2.0 * DEGREE, 200, 0.0, 2.0 * DEGREE)?;
    simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
    simulation.set_sample(get_sample());
    simulation.run_simulation()?;

    let result = simulation.intensity_data();
    let out = Path::new("out/ex03_cylinders_lma");
    write_intensity_data(&result, out.join("intensity.int"))?;
    save_intensity_map(&result, out.join("intensity.png"), "Local monodisperse approximation")?;
    println!("wrote {}", out.display());
    Ok(())
}
