//! presetbridge CLI - the `presetbridge` command.
//!
//! Converts sampler instruments (SFZ files or decoded EXS zone lists) into
//! DecentSampler presets or SFZ files, optionally copying or baking the
//! sample files next to the output.

mod convert;
mod logger;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use presetbridge_core::ConvertConfig;

/// presetbridge - sampler instrument converter
#[derive(Parser, Debug)]
#[command(name = "presetbridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Convert sampler instruments between EXS, SFZ and DecentSampler",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Input instrument (.sfz or EXS .json)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output preset (.dspreset, .xml or .sfz)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Sample folder name; sample paths become `<SAMPLE_DIR>/<file>`
    #[arg(value_name = "SAMPLE_DIR")]
    pub sample_dir: Option<String>,

    /// Configuration file (defaults to the user config location)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Copy sample files into <output dir>/Samples/<set>
    #[arg(long = "copy", conflicts_with = "bake_samples")]
    pub copy_samples: bool,

    /// Render trims and loop crossfades into new sample files
    #[arg(long = "bake")]
    pub bake_samples: bool,

    /// Bit depth for written samples (16, 24 or 32)
    #[arg(long, value_name = "BITS")]
    pub bit_depth: Option<u16>,

    /// Skip the default effects and knob panel for EXS input
    #[arg(long)]
    pub no_generic_ui: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an instrument
    Convert(ConvertArgs),

    /// Print a summary of an instrument
    Inspect {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Also print the instrument as SFZ
        #[arg(long)]
        sfz: bool,
    },

    /// Create a default configuration file
    Init {
        /// Where to write it (defaults to the user config location)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// Show the default configuration file path
    ConfigPath,

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert(args) => convert::convert(args),
        Commands::Inspect { input, sfz } => convert::inspect(&input, sfz),
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path,
                None => ConvertConfig::config_path()?,
            };
            if path.exists() {
                anyhow::bail!("Config file already exists: {}", path.display());
            }
            let written = ConvertConfig::create_default_config_file(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            println!("Created config file: {}", written.display());
            Ok(())
        }
        Commands::ConfigPath => {
            println!("{}", ConvertConfig::config_path()?.display());
            Ok(())
        }
        Commands::Version => {
            println!("presetbridge {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Inputs:  SFZ, EXS zone lists (JSON)");
            println!("Outputs: DecentSampler (.dspreset), SFZ");
            Ok(())
        }
    }
}
