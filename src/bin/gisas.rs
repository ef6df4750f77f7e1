//! Command-line driver: standard simulations, reference comparison and the
//! functional test suite.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};

use gisasrs::data::{read_intensity_data, relative_difference, write_intensity_data};
use gisasrs::logging::init_tracing;
use gisasrs::plot::save_intensity_map;
use gisasrs::runtime::{FunctionalTestRegistry, Runtime, RuntimeConfig};
use gisasrs::{SampleBuilderRegistry, SimulationConfig, SimulationOptions, SimulationRegistry};

#[derive(Parser)]
#[command(author, version, about = "GISAS simulation and functional test driver")]
struct Cli {
    /// Worker threads (0 = all cores)
    #[arg(long, global = true, default_value_t = 0)]
    threads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List sample builders, simulations and functional tests
    List,

    /// Run a standard sample on a standard simulation
    Simulate(SimulateArgs),

    /// Compare two intensity files
    Compare(CompareArgs),

    /// Run the functional test suite against stored references
    Functional(FunctionalArgs),

    /// Run a simulation described by a JSON file
    Config(ConfigArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Sample builder name
    #[arg(long)]
    sample: String,

    /// Standard simulation name
    #[arg(long, default_value = "MiniGISAS")]
    simulation: String,

    /// Output intensity file (.int, .txt or .json)
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Output PNG intensity map
    #[arg(long, value_hint = ValueHint::FilePath)]
    plot: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    data: PathBuf,

    #[arg(value_hint = ValueHint::FilePath)]
    reference: PathBuf,

    /// Largest accepted mean relative difference
    #[arg(long, default_value_t = 2e-10)]
    threshold: f64,
}

#[derive(Args)]
struct FunctionalArgs {
    #[arg(long, default_value = "tests/references", value_hint = ValueHint::DirPath)]
    reference_dir: PathBuf,

    /// Regenerate the reference files instead of comparing
    #[arg(long)]
    update: bool,

    /// Stop after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Only run these tests
    tests: Vec<String>,
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Output PNG intensity map
    #[arg(long, value_hint = ValueHint::FilePath)]
    plot: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::List => list(),
        Command::Simulate(args) => simulate(args, cli.threads),
        Command::Compare(args) => compare(args),
        Command::Functional(args) => functional(args, cli.threads),
        Command::Config(args) => run_config(args, cli.threads),
    }
}

fn list() -> Result<ExitCode> {
    let builders = SampleBuilderRegistry::new_with_defaults();
    let simulations = SimulationRegistry::new_with_defaults();

    println!("Sample builders:");
    for name in builders.names() {
        let description = builders.get(&name).map(|b| b.description()).unwrap_or_default();
        println!("  {name:<24} {description}");
    }
    println!("Simulations:");
    for name in simulations.names() {
        println!("  {name:<24} {}", simulations.description(&name).unwrap_or_default());
    }
    println!("Functional tests:");
    for test in FunctionalTestRegistry::new_with_defaults().iter() {
        println!("  {:<24} {} on {}", test.name, test.sample_builder, test.simulation);
    }
    Ok(ExitCode::SUCCESS)
}

fn simulate(args: SimulateArgs, threads: usize) -> Result<ExitCode> {
    let mut simulation = SimulationRegistry::new_with_defaults().create(&args.simulation)?;
    simulation.set_sample_builder(SampleBuilderRegistry::new_with_defaults().create(&args.sample)?);
    simulation.set_options(SimulationOptions::with_threads(threads));
    simulation
        .run_simulation()
        .with_context(|| format!("simulating {} on {}", args.sample, args.simulation))?;
    let data = simulation.intensity_data();
    println!("total intensity {:.6e}, max {:.6e}", data.sum(), data.max());

    if let Some(path) = args.output {
        write_intensity_data(&data, &path)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = args.plot {
        save_intensity_map(&data, &path, &format!("{} / {}", args.sample, args.simulation))?;
        println!("wrote {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn compare(args: CompareArgs) -> Result<ExitCode> {
    let data = read_intensity_data(&args.data)
        .with_context(|| format!("reading {}", args.data.display()))?;
    let reference = read_intensity_data(&args.reference)
        .with_context(|| format!("reading {}", args.reference.display()))?;
    let diff = relative_difference(&data, &reference)?;
    if diff <= args.threshold {
        println!("OK: relative difference {diff:.3e} <= {:.3e}", args.threshold);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("FAILED: relative difference {diff:.3e} > {:.3e}", args.threshold);
        Ok(ExitCode::FAILURE)
    }
}

fn functional(args: FunctionalArgs, threads: usize) -> Result<ExitCode> {
    let registry = FunctionalTestRegistry::new_with_defaults();
    let selected = if args.tests.is_empty() {
        registry.iter().cloned().collect::<Vec<_>>()
    } else {
        args.tests
            .iter()
            .map(|name| registry.get(name).cloned())
            .collect::<Result<Vec<_>, _>>()?
    };

    if args.update {
        let builders = SampleBuilderRegistry::new_with_defaults();
        let simulations = SimulationRegistry::new_with_defaults();
        for test in &selected {
            let path = test.update_reference(&builders, &simulations, &args.reference_dir)?;
            println!("updated {}", path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = RuntimeConfig {
        reference_dir: args.reference_dir,
        fail_fast: args.fail_fast,
        ..RuntimeConfig::default()
    };
    if threads > 0 {
        config.worker_count = threads;
    }
    let mut runtime = Runtime::new(config)?;
    runtime.add_tests(selected);
    let summary = runtime.run_sync()?;

    for outcome in runtime.results() {
        println!("{:<24} {:?} ({:.2}s)", outcome.name, outcome.status, outcome.elapsed.as_secs_f64());
    }
    println!("{summary}");
    Ok(if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_config(args: ConfigArgs, threads: usize) -> Result<ExitCode> {
    let config = SimulationConfig::from_file(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;
    let mut simulation = config.build()?;
    if threads > 0 {
        simulation.set_options(SimulationOptions {
            threads,
            ..config.options
        });
    }
    simulation.run_simulation()?;
    let data = simulation.intensity_data();
    println!("total intensity {:.6e}, max {:.6e}", data.sum(), data.max());

    if let Some(path) = &config.output {
        write_intensity_data(&data, path)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = args.plot {
        save_intensity_map(&data, &path, &args.file.display().to_string())?;
        println!("wrote {}", path.display());
    } else if config.output.is_none() {
        bail!("nothing to write: set 'output' in the config or pass --plot");
    }
    Ok(ExitCode::SUCCESS)
}
