//! Fitting along slices: the detector is masked except one horizontal and
//! one vertical line, so simulation and fit only touch those pixels.

use std::path::Path;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use gisasrs::data::{add_gaussian_noise, write_intensity_data, IntensityData};
use gisasrs::fit::{FitSuite, Limits, SliceObserver};
use gisasrs::logging::init_tracing;
use gisasrs::plot::save_intensity_map;
use gisasrs::sample::{FormFactor, HomogeneousMaterial, Layer, MultiLayer, Particle, ParticleLayout};
use gisasrs::units::{ANGSTROM, DEGREE, NANOMETER};
use gisasrs::{GisasSimulation, MaskShape};

/// Position of the vertical slice.
const PHI_SLICE: f64 = 0.0 * DEGREE;
/// Position of the horizontal slice.
const ALPHA_SLICE: f64 = 0.2 * DEGREE;

fn get_sample(radius: f64, height: f64) -> MultiLayer {
    let m_substrate = HomogeneousMaterial::new("Substrate", 6e-6, 2e-8);
    let m_particle = HomogeneousMaterial::new("Particle", 6e-4, 2e-8);

    let mut layout = ParticleLayout::new();
    layout.add_particle(Particle::new(m_particle, FormFactor::Cylinder { radius, height }), 0.0, 1.0);

    MultiLayer::new()
        .with_layer(Layer::new(HomogeneousMaterial::air(), 0.0).with_layout(layout))
        .with_layer(Layer::new(m_substrate, 0.0))
}

fn get_simulation() -> Result<GisasSimulation> {
    let mut simulation = GisasSimulation::new();
    simulation.set_detector_parameters(100, -1.0 * DEGREE, 1.0 * DEGREE, 100, 0.0, 2.0 * DEGREE)?;
    simulation.set_beam_parameters(1.0 * ANGSTROM, 0.2 * DEGREE, 0.0);
    Ok(simulation)
}

/// Simulated data spoiled with noise.
fn create_real_data() -> Result<IntensityData> {
    let mut simulation = get_simulation()?;
    simulation.set_sample(get_sample(5.0 * NANOMETER, 10.0 * NANOMETER));
    simulation.run_simulation()?;
    let mut real_data = simulation.intensity_data();
    add_gaussian_noise(&mut real_data, 1.0, &mut StdRng::seed_from_u64(7));
    Ok(real_data)
}

fn main() -> Result<()> {
    init_tracing();
    let out = Path::new("out/ex07_fit_along_slices");

    let real_data = create_real_data()?;
    write_intensity_data(&real_data, out.join("real_data.int"))?;
    save_intensity_map(&real_data, out.join("real_data.png"), "\"Real\" data")?;

    let mut simulation = get_simulation()?;
    simulation.set_sample(get_sample(5.0 * NANOMETER, 10.0 * NANOMETER));
    simulation.mask_all();
    simulation.add_mask(MaskShape::HorizontalLine { y: ALPHA_SLICE }, false);
    simulation.add_mask(MaskShape::VerticalLine { x: PHI_SLICE }, false);

    let mut fit_suite = FitSuite::new();
    fit_suite.add_simulation_and_real_data(simulation, real_data, 1.0)?;
    fit_suite.init_print(5);
    fit_suite.attach_observer(Box::new(SliceObserver::new(out, 5, ALPHA_SLICE, PHI_SLICE)));

    fit_suite.add_fit_parameter(
        "*/FormFactorCylinder/radius",
        6.0 * NANOMETER,
        Limits::Limited(4.0, 8.0),
        None,
    )?;
    fit_suite.add_fit_parameter(
        "*/FormFactorCylinder/height",
        9.0 * NANOMETER,
        Limits::Limited(8.0, 12.0),
        None,
    )?;

    let result = fit_suite.run_fit()?;

    println!("Fitting completed.");
    println!("chi2: {}", result.chi2);
    for p in &result.parameters {
        println!("{} {} {}", p.name, p.value, p.error);
    }
    write_intensity_data(&fit_suite.simulation_data(0)?, out.join("fit_result.int"))?;
    Ok(())
}
