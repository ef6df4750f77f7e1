//! Core-shell nanoparticles.

use std::path::Path;

use anyhow::Result;

use gisasrs::data::write_intensity_data;
use gisasrs::logging::init_tracing;
use gisasrs::plot::save_intensity_map;
use gisasrs::sample::{
    FormFactor, HomogeneousMaterial, Layer, MultiLayer, Particle, ParticleCoreShell, ParticleLayout,
};
use gisasrs::units::{ANGSTROM, DEGREE, NANOMETER};
use gisasrs::GisasSimulation;

fn get_sample() -> MultiLayer {
    let m_shell = HomogeneousMaterial::new("Shell", 1e-4, 2e-8);
    let m_core = HomogeneousMaterial::new("Core", 6e-5, 2e-8);

    let shell = Particle::new(
        m_shell,
        FormFactor::Box {
            length: 16.0 * NANOMETER,
            width: 16.0 * NANOMETER,
            height: 8.0 * NANOMETER,
        },
    );
    let core = Particle::new(
        m_core,
        FormFactor::Box {
            length: 12.0 * NANOMETER,
            width: 12.0 * NANOMETER,
            height: 7.0 * NANOMETER,
        },
    );
    let mut layout = ParticleLayout::new();
    layout.add_particle(ParticleCoreShell::new(shell, core, [0.0; 3]), 0.0, 1.0);

    MultiLayer::new().with_layer(Layer::new(HomogeneousMaterial::air(), 0.0).with_layout(layout))
}

fn main() -> Result<()> {
    init_tracing();
    let mut simulation = GisasSimulation::new();
    simulation.set_detector_parameters(200, -1.0 * DEGREE, 1.0 * DEGREE, 200, 0.0, 2.0 * DEGREE)?;
    simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
    simulation.set_sample(get_sample());
    simulation.run_simulation()?;

    let result = simulation.intensity_data();
    let out = Path::new("out/ex04_core_shell");
    write_intensity_data(&result, out.join("intensity.int"))?;
    save_intensity_map(&result, out.join("intensity.png"), "Core-shell nanoparticles")?;
    println!("wrote {}", out.display());
    Ok(())
}
