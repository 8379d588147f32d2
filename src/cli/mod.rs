//! # Command Line Interface
//!
//! `meshlint analyze` prints the validation graph of a snapshot file and
//! `meshlint mtls-status` prints the mTLS status of one namespace.

pub mod output;

use crate::analyzer::{Analyzer, Snapshot};
use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::MeshlintError;
use crate::observability::{init_logging, log_config_info};
use crate::validation::Severity;
use anyhow::Context;
use clap::{Parser, Subcommand};
use output::{print_output, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meshlint")]
#[command(about = "Static conflict analysis for service mesh configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (YAML or TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a snapshot and print the validation graph
    Analyze {
        /// Multi-document YAML file with the mesh objects
        #[arg(long)]
        snapshot: PathBuf,

        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json")]
        output: String,

        /// Lowest severity to report (error or warning)
        #[arg(long, default_value = "warning")]
        min_severity: String,
    },

    /// Print the namespace, mesh and overall mTLS status
    MtlsStatus {
        /// Multi-document YAML file with the mesh objects
        #[arg(long)]
        snapshot: PathBuf,

        /// Namespace to report on
        #[arg(long)]
        namespace: String,

        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json")]
        output: String,
    },
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    initialise_logging(&config.observability, cli.verbose);

    let analyzer = Analyzer::new(config.analyzer);
    log_config_info(analyzer.config());

    match cli.command {
        Commands::Analyze {
            snapshot,
            output,
            min_severity,
        } => {
            let format: OutputFormat = output.parse()?;
            let min_severity: Severity = min_severity.parse().map_err(anyhow::Error::msg)?;
            let snapshot = load_snapshot(&snapshot)?;

            let validations = analyzer.analyze(&snapshot);
            print_output(&validations.filter_by_severity(min_severity), format)?;

            if validations.iter().any(|entry| !entry.valid) {
                std::process::exit(1);
            }
        }
        Commands::MtlsStatus {
            snapshot,
            namespace,
            output,
        } => {
            let format: OutputFormat = output.parse()?;
            let snapshot = load_snapshot(&snapshot)?;
            print_output(&analyzer.mtls_report(&snapshot, &namespace), format)?;
        }
    }

    Ok(())
}

/// Process exit code for a failed run: the crate error's own code when there is one, 1 otherwise.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<MeshlintError>()
        .map_or(1, MeshlintError::exit_code)
}

fn load_snapshot(path: &std::path::Path) -> anyhow::Result<Snapshot> {
    Snapshot::from_path(path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

fn initialise_logging(config: &ObservabilityConfig, verbose: bool) {
    let mut config = config.clone();
    if verbose {
        config.log_level = "debug".to_string();
    }

    // Subscriber already set elsewhere (e.g. integration tests); ignore.
    let _ = init_logging(&config);
}
