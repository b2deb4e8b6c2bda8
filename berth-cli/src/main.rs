//! `berth` -- game server container lifecycle manager CLI.

mod cli;
mod command;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use berth_core::config::{BerthConfig, GeneralConfig};
use berth_core::error::{BerthError, ConfigError};
use berth_lifecycle::Action;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        config: config_path,
        log_level,
        output,
        command,
    } = cli;
    let writer = OutputWriter::new(output);

    // config commands must report broken files, so start with default logging
    if let Commands::Config(args) = command {
        init_logging(GeneralConfig::default(), log_level.as_deref())?;
        return commands::config::execute(args, &config_path, &writer).await;
    }

    let (config, from_file) = load_config(&config_path).await?;
    init_logging(config.general.clone(), log_level.as_deref())?;
    berth_core::metrics::describe_all();
    if from_file {
        info!(path = %config_path.display(), "configuration loaded");
    } else {
        info!(path = %config_path.display(), "config file not found, using defaults");
    }

    let manager = commands::connect_manager(&config).await?;
    let m = &*manager;
    let result = match command {
        Commands::Create(args) => commands::create::execute(args, m, &writer).await,
        Commands::Recreate(args) => {
            commands::create::execute_recreate(args, m, &writer).await
        }
        Commands::Start(args) => {
            commands::action::execute(Action::Start, args, m, &writer).await
        }
        Commands::Stop(args) => commands::action::execute(Action::Stop, args, m, &writer).await,
        Commands::Restart(args) => {
            commands::action::execute(Action::Restart, args, m, &writer).await
        }
        Commands::Remove(args) => {
            commands::action::execute(Action::Remove, args, m, &writer).await
        }
        Commands::List => commands::list::execute(m, &writer).await,
        Commands::Status(args) => commands::status::execute(args, m, &writer).await,
        Commands::Console(args) => {
            return commands::console::execute(args, Arc::clone(&manager), &writer).await;
        }
        // handled above
        Commands::Config(_) => Ok(()),
    };

    manager.shutdown().await;
    debug!("command finished");
    result
}

/// Load `berth.toml`, falling back to defaults (plus env overrides) when the
/// file does not exist. Returns whether the file was read.
async fn load_config(path: &Path) -> Result<(BerthConfig, bool), CliError> {
    match BerthConfig::load(path).await {
        Ok(config) => Ok((config, true)),
        Err(BerthError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = BerthConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok((config, false))
        }
        Err(e) => Err(e.into()),
    }
}

fn init_logging(mut general: GeneralConfig, log_level: Option<&str>) -> Result<(), CliError> {
    if let Some(level) = log_level {
        general.log_level = level.to_owned();
    }
    logging::init_tracing(&general)
        .context("logging setup failed")
        .map_err(|e| CliError::Config(format!("{e:#}")))
}
