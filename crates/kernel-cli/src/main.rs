//! KIBIS CLI: parse IBIS files and synthesize SPICE buffer subcircuits.
//!
//! This is the main entry point for the KIBIS toolchain.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lib_ibis::{parse_ibis_file, IbisFile, Model, TracingReporter};
use lib_kibis::{
    translate, Accuracy, DeckSynthesizer, KibisPin, Simulator, SquareWave, Stimulus,
};
use lib_types::Corner;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kibis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum CornerArg {
    #[default]
    Typ,
    Min,
    Max,
}

impl From<CornerArg> for Corner {
    fn from(arg: CornerArg) -> Self {
        match arg {
            CornerArg::Typ => Corner::Typ,
            CornerArg::Min => Corner::Min,
            CornerArg::Max => Corner::Max,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum EdgeArg {
    #[default]
    Rising,
    Falling,
    Square,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate an IBIS file
    Parse {
        /// Path to the .ibs file
        file: PathBuf,

        /// Dump the full document model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize a driver subcircuit for one component pin
    WriteDriver {
        /// Path to the .ibs file
        file: PathBuf,

        /// Component name
        #[arg(short, long)]
        component: String,

        /// Pin designator
        #[arg(short, long)]
        pin: String,

        /// Model name; defaults to the pin's first candidate
        #[arg(short, long)]
        model: Option<String>,

        /// Process corner
        #[arg(long, default_value = "typ")]
        corner: CornerArg,

        /// Accuracy level 0-3 (how many measured waveform pairs to use)
        #[arg(long, default_value_t = 2)]
        accuracy: u8,

        /// Switching pattern the driver reproduces
        #[arg(long, default_value = "rising")]
        edge: EdgeArg,

        /// Square-wave on time in ns (with --edge square)
        #[arg(long, default_value_t = 10.0)]
        on_time_ns: f64,

        /// Square-wave off time in ns (with --edge square)
        #[arg(long, default_value_t = 10.0)]
        off_time_ns: f64,

        /// Square-wave cycle count (with --edge square)
        #[arg(long, default_value_t = 1)]
        cycles: usize,

        /// External simulator executable for Ku/Kd recovery
        #[arg(long, default_value = "ngspice")]
        simulator: String,

        /// Simulator timeout in seconds
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Synthesize a receiver (device) subcircuit for one component pin
    WriteDevice {
        /// Path to the .ibs file
        file: PathBuf,

        /// Component name
        #[arg(short, long)]
        component: String,

        /// Pin designator
        #[arg(short, long)]
        pin: String,

        /// Model name; defaults to the pin's first candidate
        #[arg(short, long)]
        model: Option<String>,

        /// Process corner
        #[arg(long, default_value = "typ")]
        corner: CornerArg,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Parse { file, json } => parse_command(&file, json),
        Commands::WriteDriver {
            file,
            component,
            pin,
            model,
            corner,
            accuracy,
            edge,
            on_time_ns,
            off_time_ns,
            cycles,
            simulator,
            timeout_secs,
            output,
        } => {
            let stimulus = match edge {
                EdgeArg::Rising => Stimulus::RisingEdge,
                EdgeArg::Falling => Stimulus::FallingEdge,
                EdgeArg::Square => Stimulus::Rectangular(SquareWave {
                    on_time: on_time_ns * 1e-9,
                    off_time: off_time_ns * 1e-9,
                    cycles,
                    delay: 0.0,
                }),
            };
            let synth = DeckSynthesizer::with_simulator(Simulator::new(
                simulator,
                Duration::from_secs(timeout_secs),
            ));
            let ibis = load_ibis(&file)?;
            let (pin, model) = select_pin_model(&ibis, &component, &pin, model.as_deref())?;
            let mut reporter = TracingReporter;
            let deck = synth.write_driver(
                model,
                &pin,
                corner.into(),
                accuracy_from_level(accuracy)?,
                &stimulus,
                &mut reporter,
            )?;
            emit(&deck, output.as_deref())
        }
        Commands::WriteDevice {
            file,
            component,
            pin,
            model,
            corner,
            output,
        } => {
            let ibis = load_ibis(&file)?;
            let (pin, model) = select_pin_model(&ibis, &component, &pin, model.as_deref())?;
            let mut reporter = TracingReporter;
            let synth = DeckSynthesizer::new();
            let deck = synth.write_device(model, &pin, corner.into(), &mut reporter)?;
            emit(&deck, output.as_deref())
        }
    }
}

fn load_ibis(file: &PathBuf) -> Result<IbisFile> {
    tracing::info!("Parsing IBIS file: {:?}", file);
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let mut reporter = TracingReporter;
    let outcome = parse_ibis_file(&content, &mut reporter)?;
    if !outcome.ok {
        tracing::warn!("{:?}: parsed with errors, continuing with salvaged data", file);
    }
    Ok(outcome.file)
}

fn accuracy_from_level(level: u8) -> Result<Accuracy> {
    Ok(match level {
        0 => Accuracy::Level0,
        1 => Accuracy::Level1,
        2 => Accuracy::Level2,
        3 => Accuracy::Level3,
        _ => bail!("accuracy level must be 0-3, got {level}"),
    })
}

/// Resolve a (component, pin, model) selection against the parsed file.
/// Returns an owned pin so the borrow on the translated graph ends here.
fn select_pin_model<'a>(
    ibis: &'a IbisFile,
    component: &str,
    pin_number: &str,
    model_name: Option<&str>,
) -> Result<(KibisPin, &'a Model)> {
    let mut reporter = TracingReporter;
    let components = translate(ibis, &mut reporter);
    let component = components
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(component))
        .with_context(|| format!("no component named '{component}'"))?;
    let pin = component
        .pin_by_number(pin_number)
        .with_context(|| format!("component '{}' has no pin '{pin_number}'", component.name))?;
    if pin.models.is_empty() {
        bail!(
            "pin '{pin_number}' of component '{}' has no candidate models",
            component.name
        );
    }
    let model = match model_name {
        Some(name) => pin
            .candidate_models(ibis)
            .into_iter()
            .find(|m| m.name == name)
            .with_context(|| {
                let candidates: Vec<&str> = pin
                    .candidate_models(ibis)
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect();
                format!(
                    "pin '{pin_number}' cannot use model '{name}'; candidates: {}",
                    candidates.join(", ")
                )
            })?,
        None => &ibis.models[pin.models[0]],
    };
    Ok((pin.clone(), model))
}

fn emit(deck: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, deck)
                .with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!("Deck written to {:?}", path);
        }
        None => print!("{deck}"),
    }
    Ok(())
}

fn parse_command(file: &PathBuf, json: bool) -> Result<()> {
    let ibis = load_ibis(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ibis)?);
        return Ok(());
    }

    println!("IBIS File: {}", ibis.header.file_name);
    println!("Version: {}", ibis.header.ibis_version);
    println!("Source: {}", ibis.header.source);
    println!("Components: {}", ibis.components.len());
    println!("Models: {}", ibis.models.len());

    for component in &ibis.components {
        let pins = component.pins.iter().filter(|p| !p.dummy).count();
        println!("\n  Component: {}", component.name);
        println!("    Pins: {pins}");
        if let Some(pkg) = &component.package_model {
            println!("    Package model: {pkg}");
        }
    }

    for selector in &ibis.model_selectors {
        println!("\n  Model Selector: {}", selector.name);
        for entry in &selector.entries {
            println!("    {} - {}", entry.model, entry.description);
        }
    }

    for model in &ibis.models {
        println!("\n  Model: {}", model.name);
        println!("    Type: {:?}", model.model_type);
        let pairs = lib_kibis::matched_pairs(model).len();
        if pairs > 0 {
            println!("    Matched waveform pairs: {pairs}");
        }
    }

    for pm in &ibis.package_models {
        println!("\n  Package Model: {}", pm.name);
        println!("    Pins: {}", pm.number_of_pins);
    }

    Ok(())
}
