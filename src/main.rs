use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use maml::error::Result;
use maml::master::{Format, MasterAml};
use maml::settings::Settings;

const USAGE: &str = "usage: maml <input.(aml|json)> [output.(aml|json)]";

/// Converts Master AML documents between AML and JSON.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Document to read, `.aml` or `.json`
    input: PathBuf,
    /// Where to write; defaults to the input path with the other extension
    output: Option<PathBuf>,
    /// Settings file, `maml.toml` by default
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Mint reproducible identifiers
    #[arg(long)]
    replicable_ids: bool,
    #[arg(long)]
    seed: Option<u64>,
}

fn convert(cli: &Cli, settings: &Settings, output: &Path) -> Result<()> {
    let mut master = MasterAml::open(&cli.input, settings.registry())?.with_indent(settings.indent);
    master.export(output)?;
    info!(input = %cli.input.display(), output = %output.display(), "converted");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    if cli.replicable_ids {
        settings.replicable_ids = true;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let format = match Format::from_path(&cli.input) {
        Ok(format) => format,
        Err(_) => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };
    let output = match &cli.output {
        Some(path) => {
            if Format::from_path(path).is_err() {
                eprintln!("{USAGE}");
                process::exit(2);
            }
            path.clone()
        }
        None => cli.input.with_extension(format.opposite().extension()),
    };

    if let Err(e) = convert(&cli, &settings, &output) {
        error!(error = %e, "conversion failed");
        process::exit(1);
    }
}
