//! Mantic CLI - Cross-layer detection from the command line
//!
//! Reads requests as JSON and writes results as JSON on stdout:
//! - Detect over a caller-defined domain
//! - Run a built-in preset
//! - List presets
//! - Tabulate the temporal kernels
//!
//! Logs go to stderr so stdout stays machine-readable.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mantic_detect::{Detector, DetectorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use output::Output;

/// Mantic CLI
#[derive(Parser, Debug)]
#[command(name = "mantic")]
#[command(about = "Mantic - cross-layer friction and emergence detection", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "MANTIC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "MANTIC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "MANTIC_LOG_JSON")]
    json_logs: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a detection request (JSON) against a caller-defined domain
    Detect {
        /// Request file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        request: String,
    },

    /// Run a built-in preset
    Preset {
        /// Preset name (see `mantic presets`)
        name: String,

        /// Layer values in preset order; `null` marks a missing layer
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<String>,

        /// JSON file with preset options (f_time, overrides, temporal_config)
        #[arg(long)]
        options: Option<PathBuf>,
    },

    /// List built-in presets
    Presets,

    /// Show every temporal multiplier at one point in time
    Kernels {
        /// Time delta
        #[arg(long, allow_hyphen_values = true)]
        t: f64,

        /// Rate
        #[arg(long)]
        alpha: Option<f64>,

        /// Novelty / direction multiplier
        #[arg(long, allow_hyphen_values = true)]
        n: Option<f64>,
    },
}

fn init_tracing(cli: &Cli) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = match &cli.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    let detector = Detector::new(config).context("invalid detector configuration")?;
    let out = Output::new(cli.pretty);

    let value = match cli.command {
        Commands::Detect { request } => commands::detect(&detector, &request)?,
        Commands::Preset {
            name,
            values,
            options,
        } => commands::preset(&detector, &name, &values, options.as_deref())?,
        Commands::Presets => commands::presets()?,
        Commands::Kernels { t, alpha, n } => commands::kernels(t, alpha, n)?,
    };

    out.print(&value)
}
