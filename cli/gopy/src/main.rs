//! gopy CLI: generate Python ctypes bindings for cgo shared libraries.

mod commands;
mod manifest;

use std::process;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{GenerateArgs, SourceArgs};
use manifest::GopyManifest;

#[derive(Parser)]
#[command(name = "gopy", version, about = "Python bindings for cgo shared libraries")]
struct Cli {
    /// Log pipeline stages (overridden by GOPY_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Python binding module
    Generate {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        generate: GenerateArgs,
    },
    /// Show the declarations bindings would be generated from
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        export: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

const DEFAULT_LOG: &str = "gopy=info,gopy_bindgen=info";
const VERBOSE_LOG: &str = "gopy=debug,gopy_bindgen=debug";

/// Filter directives: `-v` over `GOPY_LOG` over the default.
fn log_directives(verbose: bool, env: Option<String>) -> String {
    if verbose {
        return VERBOSE_LOG.to_string();
    }
    env.filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG.to_string())
}

fn init_logging(verbose: bool) {
    let directives = log_directives(verbose, std::env::var("GOPY_LOG").ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let found = GopyManifest::find_and_load(&cwd)?;
    let manifest = found.as_ref().map(|(m, dir)| (m, dir.as_path()));

    match cli.command {
        Commands::Generate { source, generate } => {
            let settings = commands::Settings::resolve(&cwd, manifest, &source, &generate)?;
            debug!(?settings, "resolved settings");
            commands::generate::run(&settings)
        }
        Commands::Inspect { source, export } => {
            let settings =
                commands::Settings::resolve(&cwd, manifest, &source, &GenerateArgs::default())?;
            debug!(?settings, "resolved settings");
            commands::inspect::run(&settings, &export)
        }
    }
}
