//! fichas: closure-form reconciliation for a remote project library.
//!
//! # Usage
//!
//! ```text
//! fichas init [--store-root <dir>] [--force]
//! fichas run [--dry-run] [--json]
//! fichas diff
//! fichas status [--json]
//! fichas extract <file>
//! ```
//!
//! Every command accepts `--config <path>` (or `FICHAS_CONFIG`); the default
//! is `~/.fichas/config.yaml`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, extract::ExtractArgs, init::InitArgs, run::RunArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fichas",
    version,
    about = "Track closure forms across a remote project spreadsheet library",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.fichas/config.yaml.
    #[arg(long, global = true, env = "FICHAS_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter config file.
    Init(InitArgs),

    /// Reconcile, extract new and modified forms, and persist both artifacts.
    Run(RunArgs),

    /// Show how the current listing reconciles against the snapshot.
    Diff(DiffArgs),

    /// Show the persisted snapshot.
    Status(StatusArgs),

    /// Decode a local workbook and print what the form extractor finds.
    Extract(ExtractArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init(args) => args.run(config),
        Commands::Run(args) => args.run(config),
        Commands::Diff(args) => args.run(config),
        Commands::Status(args) => args.run(config),
        Commands::Extract(args) => args.run(config),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
