//! Spherical particles embedded in the middle of a layer on a substrate.

use std::path::Path;

use anyhow::Result;

use gisasrs::data::write_intensity_data;
use gisasrs::logging::init_tracing;
use gisasrs::plot::save_intensity_map;
use gisasrs::sample::{FormFactor, HomogeneousMaterial, Layer, MultiLayer, Particle, ParticleLayout};
use gisasrs::units::{ANGSTROM, DEGREE, NANOMETER};
use gisasrs::GisasSimulation;

fn get_sample() -> MultiLayer {
    let m_ambience = HomogeneousMaterial::air();
    let m_interm_layer = HomogeneousMaterial::new("IntermLayer", 3.45e-6, 5.24e-9);
    let m_substrate = HomogeneousMaterial::new("Substrate", 7.43e-6, 1.72e-7);
    let m_particle = HomogeneousMaterial::new("Particle", 0.0, 0.0);

    let sphere = Particle::new(m_particle, FormFactor::FullSphere { radius: 10.2 * NANOMETER });
    let mut layout = ParticleLayout::new();
    layout.add_particle(sphere, 25.2 * NANOMETER, 1.0);

    MultiLayer::new()
        .with_layer(Layer::new(m_ambience, 0.0))
        .with_layer(Layer::new(m_interm_layer, 30.0 * NANOMETER).with_layout(layout))
        .with_layer(Layer::new(m_substrate, 0.0))
}

fn get_simulation() -> Result<GisasSimulation> {
    let mut simulation = GisasSimulation::new();
    simulation.set_detector_parameters(200, -1.0 * DEGREE, 1.0 * DEGREE, 200, 0.0, 2.0 * DEGREE)?;
    simulation.set_beam_parameters(1.5 * ANGSTROM, 0.15 * DEGREE, 0.0);
    Ok(simulation)
}

fn main() -> Result<()> {
    init_tracing();
    let mut simulation = get_simulation()?;
    simulation.set_sample(get_sample());
    simulation.run_simulation()?;

    let result = simulation.intensity_data();
    let out = Path::new("out/ex02_buried_spheres");
    write_intensity_data(&result, out.join("intensity.int"))?;
    save_intensity_map(&result, out.join("intensity.png"), "Buried spheres")?;
    println!("wrote {}", out.display());
    Ok(())
}
