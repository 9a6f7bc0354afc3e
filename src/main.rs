//! Prebuild - native dependency provisioning
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use prebuild::cli::{Cli, Commands};
use prebuild::config::{Config, ConfigManager};
use prebuild::error::PrebuildResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> PrebuildResult<()> {
    let cli = Cli::parse();

    // Load configuration first; it selects the log format
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load()?;

    init_logging(cli.verbose, &config);
    debug!("Configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Provision(args) => prebuild::cli::commands::provision(args, &config),
        Commands::Key(args) => prebuild::cli::commands::key(args, &config),
        Commands::Status(args) => prebuild::cli::commands::status(args, &config),
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("prebuild=warn"),
        1 => EnvFilter::new("prebuild=info"),
        _ => EnvFilter::new("prebuild=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
