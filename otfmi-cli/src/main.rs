use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use otfmi_core::Evaluator;
use otfmi_core::beam::CantileverBeam;
use otfmi_core::logging::setup_tracing;
use otfmi_core::modelica::{ModelicaWrapper, parse_input};
#[cfg(feature = "pyo3")]
use otfmi_core::study::{OpenTurnsBackend, StudyConfig, StudyEvaluator};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on.
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deflection of a cantilever beam.
    Beam {
        /// Modulus of elasticity.
        e: f64,
        /// Load applied at the free end.
        f: f64,
        /// Length of the beam.
        l: f64,
        /// Second moment of area of the section.
        i: f64,
    },
    /// Evaluate a function stored in a study at one point.
    #[cfg(feature = "pyo3")]
    Eval {
        /// JSON file with `path`, `object_name` and `module` keys.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Path to the study archive.
        #[arg(short, long)]
        study: Option<PathBuf>,
        /// Name of the function object in the study.
        #[arg(long)]
        object: Option<String>,
        /// Python module providing `Study` and `Function`.
        #[arg(long)]
        module: Option<String>,
        /// Number of outputs of the function.
        #[arg(short, long)]
        nout: usize,
        /// Input point.
        #[arg(required = true, allow_negative_numbers = true)]
        x: Vec<f64>,
    },
    /// Write a Modelica model that calls a plugin.
    Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Name of the Modelica model.
    #[arg(long)]
    name: String,
    /// Name of the plugin library, without prefix or extension.
    #[arg(long)]
    library: String,
    /// Directory containing the plugin library.
    #[arg(long)]
    library_dir: PathBuf,
    /// Use the cantilever beam variables.
    #[arg(long, conflicts_with_all = ["inputs", "outputs"])]
    beam: bool,
    /// Input variable as NAME=START; repeat for each input.
    #[arg(long = "input", value_parser = parse_input, required_unless_present = "beam")]
    inputs: Vec<(String, f64)>,
    /// Output variable name; repeat for each output.
    #[arg(long = "output", required_unless_present = "beam")]
    outputs: Vec<String>,
    /// Write the model here instead of to stdout.
    #[arg(short, long)]
    output_path: Option<PathBuf>,
    /// Also write the OpenModelica script that translates the model into an FMU.
    #[arg(long)]
    script_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.debug).context("Could not set up logging")?;

    match cli.command {
        Commands::Beam { e, f, l, i } => beam(e, f, l, i),
        #[cfg(feature = "pyo3")]
        Commands::Eval {
            config,
            study,
            object,
            module,
            nout,
            x,
        } => eval(config.as_deref(), study, object, module, nout, &x),
        Commands::Export(args) => export(&args),
    }
}

fn beam(e: f64, f: f64, l: f64, i: f64) -> Result<()> {
    let y = CantileverBeam.evaluate_point(&[e, f, l, i], 1)?;
    println!("{}", y[0]);
    Ok(())
}

#[cfg(feature = "pyo3")]
fn eval(
    config_path: Option<&Path>,
    study: Option<PathBuf>,
    object: Option<String>,
    module: Option<String>,
    nout: usize,
    x: &[f64],
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => StudyConfig::from_path(path).with_context(|| format!("Could not read config: `{path:?}`"))?,
        None => StudyConfig::default(),
    };
    if let Some(study) = study {
        config.path = study;
    }
    if let Some(object) = object {
        config.object_name = object;
    }
    if let Some(module) = module {
        config.module = module;
    }

    let evaluator = StudyEvaluator::new(OpenTurnsBackend, config);
    let y = evaluator
        .evaluate_point(x, nout)
        .with_context(|| format!("Could not evaluate `{}` at {x:?}", evaluator.name()))?;

    let values: Vec<String> = y.iter().map(|v| v.to_string()).collect();
    println!("{}", values.join(" "));
    Ok(())
}

fn export(args: &ExportArgs) -> Result<()> {
    let wrapper = if args.beam {
        ModelicaWrapper::beam(&args.name, &args.library, &args.library_dir)
    } else {
        let wrapper = ModelicaWrapper::new(&args.name, &args.library, &args.library_dir);
        let wrapper = args
            .inputs
            .iter()
            .fold(wrapper, |w, (name, start)| w.with_input(name, *start));
        args.outputs.iter().fold(wrapper, |w, name| w.with_output(name))
    };

    let mo = wrapper.render()?;

    match &args.output_path {
        Some(path) => {
            write_model(path, &mo)?;
            info!("Modelica model `{}` written to `{}`.", args.name, path.display());
        }
        None => print!("{mo}"),
    }

    if let Some(path) = &args.script_path {
        write_model(path, &wrapper.render_script()?)?;
        info!("OpenModelica script for `{}` written to `{}`.", wrapper.model_name(), path.display());
    }

    Ok(())
}

fn write_model(path: &Path, mo: &str) -> Result<()> {
    std::fs::write(path, mo).with_context(|| format!("Could not write file: `{path:?}`"))
}
